use crate::constants::{LABEL_DELIMITER, LABEL_SEPARATOR, MIN_DRAWABLE_STOPS};
use crate::error::{Result, RouteError};
use crate::export::RouteStore;
use crate::markers::MarkerSet;
use crate::model::{
    Coordinate, RouteEntry, RouteStop, SavedRoute, WalkerRecord, normalize_team, split_label,
};
use log::{debug, info, warn};
use std::path::PathBuf;

/// What a click did to the current route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Appended at this 1-based position.
    Added(usize),
    /// Removed from this 1-based position.
    Removed(usize),
    /// The click did not land on a marker.
    Ignored,
}

/// Route-building state for one operator.
///
/// Owns the working walker records, the markers derived from them, the live
/// selection and the last committed draft. Markers are recomputed only when
/// the record pool changes (`load`, `reload`, `save`).
#[derive(Debug, Clone)]
pub struct RouteSession {
    records: Vec<WalkerRecord>,
    markers: MarkerSet,
    selection: Vec<RouteEntry>,
    committed: Vec<Coordinate>,
    precision: Option<u32>,
}

impl RouteSession {
    /// Creates a session over `records` with exact coordinate matching.
    pub fn load(records: Vec<WalkerRecord>) -> Self {
        Self::load_with_precision(records, None)
    }

    /// Creates a session whose markers and clicks are rounded to `precision` decimals.
    pub fn load_with_precision(records: Vec<WalkerRecord>, precision: Option<u32>) -> Self {
        let records = sanitize(records);
        let markers = MarkerSet::consolidate(&records, precision);
        info!(
            "Session loaded: {} records, {} markers",
            records.len(),
            markers.len()
        );
        Self {
            records,
            markers,
            selection: Vec::new(),
            committed: Vec::new(),
            precision,
        }
    }

    /// Replaces the record pool and starts over with an empty route.
    pub fn reload(&mut self, records: Vec<WalkerRecord>) {
        *self = Self::load_with_precision(records, self.precision);
    }

    pub fn records(&self) -> &[WalkerRecord] {
        &self.records
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn selection(&self) -> &[RouteEntry] {
        &self.selection
    }

    pub fn selected_labels(&self) -> Vec<&str> {
        self.selection.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn is_selected(&self, click: Coordinate) -> bool {
        let key = self.key_for(click);
        self.selection.iter().any(|e| e.coordinate == key)
    }

    /// The committed draft, if it is long enough to draw as a line.
    pub fn drawn_route(&self) -> Option<&[Coordinate]> {
        (self.committed.len() >= MIN_DRAWABLE_STOPS).then_some(self.committed.as_slice())
    }

    /// Mean position of the working records.
    pub fn map_center(&self) -> Option<Coordinate> {
        if self.records.is_empty() {
            return None;
        }
        let n = self.records.len() as f64;
        let (lat, lng) = self
            .records
            .iter()
            .fold((0.0, 0.0), |(lat, lng), r| (lat + r.latitude, lng + r.longitude));
        Coordinate::new(lat / n, lng / n)
    }

    /// Adds the clicked marker to the route, or removes it if already selected.
    pub fn toggle(&mut self, click: Coordinate) -> ToggleOutcome {
        let key = self.key_for(click);
        let Some(label) = self.markers.label(&key) else {
            debug!("Click at {click} matched no marker");
            return ToggleOutcome::Ignored;
        };

        if let Some(index) = self.selection.iter().position(|e| e.coordinate == key) {
            let entry = self.selection.remove(index);
            debug!("Deselected {} at position {}", entry.label, index + 1);
            return ToggleOutcome::Removed(index + 1);
        }

        self.selection.push(RouteEntry {
            coordinate: key,
            label: label.to_string(),
        });
        debug!("Selected {} at position {}", label, self.selection.len());
        ToggleOutcome::Added(self.selection.len())
    }

    /// Moves the first entry labelled `label` to the 1-based `new_position`.
    pub fn reorder(&mut self, label: &str, new_position: usize) -> Result<()> {
        let len = self.selection.len();
        if new_position < 1 || new_position > len {
            return Err(RouteError::InvalidPosition {
                position: new_position,
                len,
            });
        }

        let index = self
            .selection
            .iter()
            .position(|e| e.label == label)
            .ok_or_else(|| RouteError::NotSelected {
                label: label.to_string(),
            })?;

        let entry = self.selection.remove(index);
        self.selection.insert(new_position - 1, entry);
        debug!("Moved {label} from {} to {new_position}", index + 1);
        Ok(())
    }

    /// Freezes the current selection as the drawn route. Needs at least two stops.
    pub fn commit_draft(&mut self) -> bool {
        if self.selection.len() < MIN_DRAWABLE_STOPS {
            debug!(
                "Draft not committed: {} stops selected",
                self.selection.len()
            );
            return false;
        }
        self.committed = self.selection.iter().map(|e| e.coordinate).collect();
        true
    }

    /// Expands the current selection into route rows without touching any state.
    pub fn preview(&self, route_id: &str) -> Result<SavedRoute> {
        let route_id = route_id.trim();
        if route_id.is_empty() {
            return Err(RouteError::EmptyRouteId);
        }
        if self.selection.is_empty() {
            return Err(RouteError::EmptySelection);
        }

        let stops = self
            .selection
            .iter()
            .enumerate()
            .flat_map(|(i, entry)| {
                split_label(&entry.label).map(move |team| RouteStop {
                    order: i + 1,
                    team: team.to_string(),
                    latitude: entry.coordinate.latitude(),
                    longitude: entry.coordinate.longitude(),
                })
            })
            .collect();

        Ok(SavedRoute {
            route_id: route_id.to_string(),
            stops,
        })
    }

    /// Finalizes the route: routed teams leave the pool and the selection is cleared.
    pub fn save(&mut self, route_id: &str) -> Result<SavedRoute> {
        let route = self.preview(route_id)?;
        self.prune(&route);
        Ok(route)
    }

    /// Like [`save`](Self::save), but the route is written first. A failed
    /// write leaves the session untouched.
    pub fn save_to<S: RouteStore>(
        &mut self,
        route_id: &str,
        store: &mut S,
    ) -> Result<(SavedRoute, PathBuf)> {
        let route = self.preview(route_id)?;
        let path = store.write_route(&route)?;
        self.prune(&route);
        Ok((route, path))
    }

    /// Shows a previously saved route as the current selection.
    ///
    /// Rows sharing an order and coordinate become one entry whose label joins
    /// their teams in file order. The record pool is not touched.
    pub fn load_saved(&mut self, route: &SavedRoute) {
        let mut selection: Vec<RouteEntry> = Vec::new();
        let mut last_order = None;

        for stop in &route.stops {
            let Some(coordinate) = Coordinate::new(stop.latitude, stop.longitude) else {
                warn!(
                    "Skipping stop {} ({}): invalid coordinate",
                    stop.order, stop.team
                );
                continue;
            };
            let coordinate = self.key_for(coordinate);

            let same_stop = last_order == Some(stop.order)
                && selection.last().is_some_and(|e| e.coordinate == coordinate);
            last_order = Some(stop.order);

            if same_stop && let Some(entry) = selection.last_mut() {
                entry.label.push_str(LABEL_DELIMITER);
                entry.label.push_str(&stop.team);
            } else {
                selection.push(RouteEntry {
                    coordinate,
                    label: stop.team.clone(),
                });
            }
        }

        self.committed = selection.iter().map(|e| e.coordinate).collect();
        self.selection = selection;
        info!(
            "Loaded route {} with {} stops",
            route.route_id,
            self.selection.len()
        );
    }

    fn prune(&mut self, route: &SavedRoute) {
        let routed = route.teams();
        let before = self.records.len();
        self.records.retain(|r| !routed.contains(r.team.as_str()));
        self.markers = MarkerSet::consolidate(&self.records, self.precision);
        self.selection.clear();
        self.committed.clear();

        info!(
            "Route {} saved: {} teams routed, {} of {} records remaining, {} markers",
            route.route_id,
            routed.len(),
            self.records.len(),
            before,
            self.markers.len()
        );
    }

    fn key_for(&self, click: Coordinate) -> Coordinate {
        match self.precision {
            Some(decimals) => click.quantize(decimals),
            None => click,
        }
    }
}

fn sanitize(records: Vec<WalkerRecord>) -> Vec<WalkerRecord> {
    let total = records.len();
    let kept: Vec<WalkerRecord> = records
        .into_iter()
        .filter(|r| r.coordinate().is_some())
        .filter_map(|mut r| {
            r.team = normalize_team(&r.team);
            if r.team.contains(LABEL_SEPARATOR) {
                warn!(
                    "Dropping team '{}': team codes cannot contain '{LABEL_SEPARATOR}'",
                    r.team
                );
                return None;
            }
            (!r.team.is_empty()).then_some(r)
        })
        .collect();

    if kept.len() < total {
        debug!("Dropped {} records without team or coordinate", total - kept.len());
    }
    kept
}
