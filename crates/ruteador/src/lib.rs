pub mod config;
pub mod constants;
pub mod csv_reader;
pub mod error;
pub mod export;
pub mod markers;
pub mod model;
pub mod session;
pub mod shell;

pub use config::Config;
pub use csv_reader::{WalkerTable, read_saved_route_csv, read_walkers_csv};
pub use error::{Result, RouteError};
pub use export::{CsvRouteStore, RouteStore, SavedRouteFile, export_route_csv, list_saved_routes};
pub use markers::{ConsolidatedMarker, MarkerSet};
pub use model::{Coordinate, RouteEntry, RouteStop, SavedRoute, WalkerRecord};
pub use session::{RouteSession, ToggleOutcome};
pub use shell::Shell;
