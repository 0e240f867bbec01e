use crate::constants::{LATITUDE_HEADER, LONGITUDE_HEADER, ORDER_HEADER, ROUTE_HEADER, TEAM_HEADER};
use crate::error::{Result, RouteError};
use crate::model::{RouteStop, SavedRoute, WalkerRecord, normalize_team};

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use std::io::Read;
use std::path::Path;

/// Walker rows read from a table, plus how many rows had no usable coordinate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkerTable {
    pub records: Vec<WalkerRecord>,
    pub dropped: usize,
}

/// Reads the walker table (`Equipo, Latitud, Longitud`) from a CSV file
///
/// # Errors
/// Returns error if the file cannot be read, a header is missing, or a
/// coordinate cell holds something other than a number
pub fn read_walkers_csv<P: AsRef<Path>>(path: P) -> Result<WalkerTable> {
    let file = std::fs::File::open(path)?;
    read_walkers_from_reader(file)
}

/// Columns are found by header name, in any order; extra columns are ignored.
/// Rows with an empty or `NaN` latitude or longitude are dropped.
pub fn read_walkers_from_reader<R: Read>(reader: R) -> Result<WalkerTable> {
    let mut rdr = build_reader(reader);
    let headers = read_headers(&mut rdr)?;
    let team_col = find_column(&headers, TEAM_HEADER)?;
    let lat_col = find_column(&headers, LATITUDE_HEADER)?;
    let lng_col = find_column(&headers, LONGITUDE_HEADER)?;

    let mut table = WalkerTable::default();

    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = i + 2; // 1-indexed, +1 for header

        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let latitude = parse_optional_coordinate(cell(&rec, lat_col), row)?;
        let longitude = parse_optional_coordinate(cell(&rec, lng_col), row)?;
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            debug!("Row {row}: missing coordinate, skipped");
            table.dropped += 1;
            continue;
        };

        table.records.push(WalkerRecord {
            team: normalize_team(cell(&rec, team_col)),
            latitude,
            longitude,
        });
    }

    if table.dropped > 0 {
        warn!("{} rows without coordinates were skipped", table.dropped);
    }
    Ok(table)
}

/// Reads a saved route (`Ruta, Orden, Equipo, Latitud, Longitud`) from a CSV file
pub fn read_saved_route_csv<P: AsRef<Path>>(path: P) -> Result<SavedRoute> {
    let file = std::fs::File::open(path)?;
    read_saved_route_from_reader(file)
}

pub fn read_saved_route_from_reader<R: Read>(reader: R) -> Result<SavedRoute> {
    let mut rdr = build_reader(reader);
    let headers = read_headers(&mut rdr)?;
    let route_col = find_column(&headers, ROUTE_HEADER)?;
    let order_col = find_column(&headers, ORDER_HEADER)?;
    let team_col = find_column(&headers, TEAM_HEADER)?;
    let lat_col = find_column(&headers, LATITUDE_HEADER)?;
    let lng_col = find_column(&headers, LONGITUDE_HEADER)?;

    let mut route = SavedRoute::default();

    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = i + 2;

        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let route_id = cell(&rec, route_col);
        if route.route_id.is_empty() {
            route.route_id = route_id.to_string();
        } else if route.route_id != route_id {
            warn!(
                "Row {row}: route id {route_id} differs from {}, keeping the first",
                route.route_id
            );
        }

        let order_str = cell(&rec, order_col);
        let order = order_str.parse().map_err(|e| RouteError::OrderParse {
            row,
            value: order_str.to_string(),
            source: e,
        })?;

        route.stops.push(RouteStop::new(
            order,
            cell(&rec, team_col),
            parse_coordinate(cell(&rec, lat_col), row)?,
            parse_coordinate(cell(&rec, lng_col), row)?,
        ));
    }

    Ok(route)
}

fn build_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true) // allow short rows and extra columns
        .from_reader(reader)
}

fn read_headers<R: Read>(rdr: &mut csv::Reader<R>) -> Result<StringRecord> {
    rdr.headers()
        .cloned()
        .map_err(|e| RouteError::CsvHeader(format!("Failed to read headers: {e}")))
}

/// Index of the column named `name` (case-insensitive)
fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
        .ok_or_else(|| RouteError::CsvHeader(format!("Missing '{name}' column")))
}

/// Missing cells in flexible rows read as empty
fn cell(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or("")
}

fn parse_optional_coordinate(value: &str, row: usize) -> Result<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    let parsed = parse_coordinate(value, row)?;
    Ok((!parsed.is_nan()).then_some(parsed))
}

fn parse_coordinate(value: &str, row: usize) -> Result<f64> {
    value.parse().map_err(|e| RouteError::CoordinateParse {
        row,
        value: value.to_string(),
        source: e,
    })
}
