/// Walker table headers
pub const TEAM_HEADER: &str = "Equipo";
pub const LATITUDE_HEADER: &str = "Latitud";
pub const LONGITUDE_HEADER: &str = "Longitud";

/// Saved route headers (in file order)
pub const ROUTE_HEADER: &str = "Ruta";
pub const ORDER_HEADER: &str = "Orden";
pub const ROUTE_HEADERS: [&str; 5] = [
    ROUTE_HEADER,
    ORDER_HEADER,
    TEAM_HEADER,
    LATITUDE_HEADER,
    LONGITUDE_HEADER,
];

/// Joins the teams of a consolidated marker
pub const LABEL_DELIMITER: &str = ", ";
/// Character labels are split on; team codes may not contain it
pub const LABEL_SEPARATOR: char = ',';

/// Spreadsheets hand numeric team codes over as floats ("12.0")
pub const FLOAT_TEAM_SUFFIX: &str = ".0";

/// A polyline needs at least two points
pub const MIN_DRAWABLE_STOPS: usize = 2;

/// Saved route files: ruta_<id>.csv
pub const ROUTE_FILE_PREFIX: &str = "ruta_";
pub const ROUTE_FILE_EXTENSION: &str = "csv";

pub const DEFAULT_OUTPUT_DIR: &str = "rutas";
pub const MAX_COORDINATE_PRECISION: u32 = 12;
