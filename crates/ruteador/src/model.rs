use crate::constants::{FLOAT_TEAM_SUFFIX, LABEL_SEPARATOR};
use std::{
    cmp::Ordering,
    collections::BTreeSet,
    fmt,
    hash::{Hash, Hasher},
};

/// A finite (latitude, longitude) pair.
///
/// Equality is exact on both components; `-0.0` is folded into `0.0` so
/// that equality, ordering and hashing agree.
#[derive(Debug, Clone, Copy)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Returns `None` when either component is NaN or infinite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        Some(Self {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Rounds both components to `decimals` places.
    pub fn quantize(self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        let round = |v: f64| (v * factor).round() / factor + 0.0;
        Self {
            latitude: round(self.latitude),
            longitude: round(self.longitude),
        }
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coordinate {}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.latitude, self.longitude)
    }
}

/// One row of the walker table.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkerRecord {
    pub team: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl WalkerRecord {
    pub fn new(team: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            team: team.into(),
            latitude,
            longitude,
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Trims a team code and drops the float artifact of numeric codes ("12.0" -> "12").
pub fn normalize_team(raw: &str) -> String {
    let team = raw.trim();
    team.strip_suffix(FLOAT_TEAM_SUFFIX).unwrap_or(team).to_string()
}

/// Splits a consolidated label back into its teams.
pub fn split_label(label: &str) -> impl Iterator<Item = &str> {
    label
        .split(LABEL_SEPARATOR)
        .map(str::trim)
        .filter(|team| !team.is_empty())
}

/// A selected stop: the clicked coordinate and the label it carried when added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub coordinate: Coordinate,
    pub label: String,
}

/// One team visit in an exported route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub order: usize,
    pub team: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl RouteStop {
    pub fn new(order: usize, team: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            order,
            team: team.into(),
            latitude,
            longitude,
        }
    }
}

/// The exported form of a route: one row per team.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedRoute {
    pub route_id: String,
    pub stops: Vec<RouteStop>,
}

impl SavedRoute {
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Distinct teams visited by this route.
    pub fn teams(&self) -> BTreeSet<&str> {
        self.stops.iter().map(|s| s.team.as_str()).collect()
    }

    /// Number of distinct stop positions.
    pub fn stop_count(&self) -> usize {
        self.stops.iter().map(|s| s.order).max().unwrap_or(0)
    }
}
