use crate::constants::{ROUTE_FILE_EXTENSION, ROUTE_FILE_PREFIX, ROUTE_HEADERS};
use crate::error::{Result, RouteError};
use crate::model::SavedRoute;
use chrono::{DateTime, Local};
use csv::WriterBuilder;
use log::debug;
use serde::Serialize;
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

/// Durable destination for finished routes.
pub trait RouteStore {
    /// Persists `route` and returns where it went.
    fn write_route(&mut self, route: &SavedRoute) -> Result<PathBuf>;
}

/// Writes each route to `<output_dir>/ruta_<id>.csv`.
#[derive(Debug, Clone)]
pub struct CsvRouteStore {
    output_dir: PathBuf,
}

impl CsvRouteStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl RouteStore for CsvRouteStore {
    fn write_route(&mut self, route: &SavedRoute) -> Result<PathBuf> {
        export_route_csv(route, Some(self.output_dir.as_path()))
    }
}

#[derive(Serialize)]
struct RouteRow<'a> {
    route: &'a str,
    order: usize,
    team: &'a str,
    latitude: f64,
    longitude: f64,
}

/// `ruta_<id>.csv`, with characters that cannot appear in file names replaced by `_`
pub fn route_file_name(route_id: &str) -> String {
    let safe: String = route_id
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{ROUTE_FILE_PREFIX}{safe}.{ROUTE_FILE_EXTENSION}")
}

pub fn export_route_csv(route: &SavedRoute, output_dir: Option<&Path>) -> Result<PathBuf> {
    let filename = route_file_name(&route.route_id);

    let file_path = if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir).map_err(|e| RouteError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        dir.join(&filename)
    } else {
        filename.into()
    };

    let file = File::create(&file_path).map_err(|e| RouteError::CreateFile {
        path: file_path.clone(),
        source: e,
    })?;

    let writer = BufWriter::new(file);
    let mut builder = WriterBuilder::new();
    builder.has_headers(false);
    #[cfg(windows)]
    {
        use csv::Terminator;
        builder.terminator(Terminator::CRLF);
    }

    let mut wtr = builder.from_writer(writer);

    wtr.write_record(ROUTE_HEADERS)?;
    for stop in &route.stops {
        wtr.serialize(RouteRow {
            route: &route.route_id,
            order: stop.order,
            team: &stop.team,
            latitude: stop.latitude,
            longitude: stop.longitude,
        })?;
    }

    wtr.flush()?;
    debug!("Wrote {} rows to {}", route.len(), file_path.display());
    Ok(file_path)
}

/// A route file found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRouteFile {
    pub route_id: String,
    pub path: PathBuf,
    pub modified: Option<DateTime<Local>>,
}

/// Lists `ruta_*.csv` files in `dir`, numeric ids first in numeric order.
///
/// A directory that does not exist yet simply has no routes.
pub fn list_saved_routes<P: AsRef<Path>>(dir: P) -> Result<Vec<SavedRouteFile>> {
    let dir = dir.as_ref();

    if !dir.exists() {
        debug!("Route directory {} does not exist yet", dir.display());
        return Ok(Vec::new());
    }

    if !dir.is_dir() {
        return Err(RouteError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Path is not a directory: {}", dir.display()),
        )));
    }

    let mut routes = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(ROUTE_FILE_EXTENSION) {
            continue;
        }
        let Some(route_id) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix(ROUTE_FILE_PREFIX))
        else {
            continue;
        };

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from);

        routes.push(SavedRouteFile {
            route_id: route_id.to_string(),
            path,
            modified,
        });
    }

    routes.sort_by(|a, b| {
        let key = |id: &str| id.parse::<u64>().map_or((1, 0), |n| (0, n));
        key(&a.route_id)
            .cmp(&key(&b.route_id))
            .then_with(|| a.route_id.cmp(&b.route_id))
    });
    Ok(routes)
}

/// Path of the saved route with this id, if it exists in `dir`.
pub fn find_saved_route<P: AsRef<Path>>(dir: P, route_id: &str) -> Option<PathBuf> {
    let path = dir.as_ref().join(route_file_name(route_id));
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RouteStop;
    use tempfile::TempDir;

    fn sample_route(id: &str) -> SavedRoute {
        SavedRoute {
            route_id: id.to_string(),
            stops: vec![
                RouteStop::new(1, "T1", 1.5, -2.0),
                RouteStop::new(1, "T2", 1.5, -2.0),
                RouteStop::new(2, "T3", -34.603722, -58.381592),
            ],
        }
    }

    #[test]
    fn test_route_file_name() {
        assert_eq!(route_file_name("5"), "ruta_5.csv");
        assert_eq!(route_file_name(" 12 "), "ruta_12.csv");
        assert_eq!(route_file_name("a/b:c"), "ruta_a_b_c.csv");
    }

    #[test]
    fn test_export_route_csv_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = export_route_csv(&sample_route("5"), Some(temp_dir.path())).unwrap();

        assert_eq!(path, temp_dir.path().join("ruta_5.csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Ruta,Orden,Equipo,Latitud,Longitud",
                "5,1,T1,1.5,-2.0",
                "5,1,T2,1.5,-2.0",
                "5,2,T3,-34.603722,-58.381592",
            ]
        );
    }

    #[test]
    fn test_export_creates_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("salida").join("rutas");

        let path = export_route_csv(&sample_route("1"), Some(nested.as_path())).unwrap();
        assert!(path.exists());
        assert!(nested.is_dir());
    }

    #[test]
    fn test_export_then_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let route = sample_route("7");
        let path = export_route_csv(&route, Some(temp_dir.path())).unwrap();

        let read = crate::csv_reader::read_saved_route_csv(&path).unwrap();
        assert_eq!(read, route);
    }

    #[test]
    fn test_export_invalid_output_directory() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let err = export_route_csv(&sample_route("1"), Some(blocker.as_path())).unwrap_err();
        assert!(matches!(err, RouteError::CreateDir { .. }));
    }

    #[test]
    fn test_csv_route_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = CsvRouteStore::new(temp_dir.path());
        let path = store.write_route(&sample_route("3")).unwrap();
        assert_eq!(path, store.output_dir().join("ruta_3.csv"));
    }

    #[test]
    fn test_list_saved_routes() {
        let temp_dir = TempDir::new().unwrap();
        for id in ["10", "2", "norte"] {
            export_route_csv(&sample_route(id), Some(temp_dir.path())).unwrap();
        }
        std::fs::write(temp_dir.path().join("caminantes.csv"), "").unwrap();
        std::fs::write(temp_dir.path().join("ruta_9.xlsx"), "").unwrap();
        std::fs::create_dir(temp_dir.path().join("ruta_dir.csv")).unwrap();

        let routes = list_saved_routes(temp_dir.path()).unwrap();
        let ids: Vec<&str> = routes.iter().map(|r| r.route_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "10", "norte"]);
        assert!(routes.iter().all(|r| r.modified.is_some()));
    }

    #[test]
    fn test_list_saved_routes_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let routes = list_saved_routes(temp_dir.path().join("nope")).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_find_saved_route() {
        let temp_dir = TempDir::new().unwrap();
        export_route_csv(&sample_route("4"), Some(temp_dir.path())).unwrap();

        assert_eq!(
            find_saved_route(temp_dir.path(), "4"),
            Some(temp_dir.path().join("ruta_4.csv"))
        );
        assert!(find_saved_route(temp_dir.path(), "5").is_none());
    }
}
