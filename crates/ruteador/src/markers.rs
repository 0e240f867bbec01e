use crate::constants::LABEL_DELIMITER;
use crate::model::{Coordinate, WalkerRecord};
use std::collections::{BTreeMap, BTreeSet};

/// All teams sharing one coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedMarker {
    pub coordinate: Coordinate,
    pub teams: BTreeSet<String>,
}

impl ConsolidatedMarker {
    /// Sorted, de-duplicated teams joined with ", ".
    pub fn label(&self) -> String {
        self.teams
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(LABEL_DELIMITER)
    }
}

/// Markers keyed by coordinate, in ascending (latitude, longitude) order.
///
/// Always rebuilt from a full record slice; never patched in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    markers: BTreeMap<Coordinate, String>,
    precision: Option<u32>,
}

impl MarkerSet {
    /// Groups `records` by coordinate. Records without a finite coordinate are skipped.
    pub fn consolidate(records: &[WalkerRecord], precision: Option<u32>) -> Self {
        let mut groups: BTreeMap<Coordinate, BTreeSet<String>> = BTreeMap::new();

        for record in records {
            let Some(coordinate) = record.coordinate() else {
                continue;
            };
            let coordinate = match precision {
                Some(decimals) => coordinate.quantize(decimals),
                None => coordinate,
            };
            groups
                .entry(coordinate)
                .or_default()
                .insert(record.team.clone());
        }

        let markers = groups
            .into_iter()
            .map(|(coordinate, teams)| {
                let label = ConsolidatedMarker { coordinate, teams }.label();
                (coordinate, label)
            })
            .collect();

        Self { markers, precision }
    }

    /// Maps a click onto a marker key, applying the configured precision.
    pub fn resolve(&self, click: Coordinate) -> Option<Coordinate> {
        let key = match self.precision {
            Some(decimals) => click.quantize(decimals),
            None => click,
        };
        self.markers.contains_key(&key).then_some(key)
    }

    pub fn label(&self, coordinate: &Coordinate) -> Option<&str> {
        self.markers.get(coordinate).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Coordinate, &str)> {
        self.markers.iter().map(|(c, l)| (c, l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_consolidate_shared_coordinates() {
        let records = vec![
            WalkerRecord::new("T1", 1.0, 1.0),
            WalkerRecord::new("T2", 1.0, 1.0),
            WalkerRecord::new("T3", 2.0, 2.0),
        ];
        let markers = MarkerSet::consolidate(&records, None);

        assert_eq!(markers.len(), 2);
        assert_eq!(markers.label(&coord(1.0, 1.0)), Some("T1, T2"));
        assert_eq!(markers.label(&coord(2.0, 2.0)), Some("T3"));
    }

    #[test]
    fn test_label_sorted_and_deduplicated() {
        let records = vec![
            WalkerRecord::new("B", 5.0, 5.0),
            WalkerRecord::new("A", 5.0, 5.0),
            WalkerRecord::new("B", 5.0, 5.0),
            WalkerRecord::new("10", 5.0, 5.0),
        ];
        let markers = MarkerSet::consolidate(&records, None);
        assert_eq!(markers.label(&coord(5.0, 5.0)), Some("10, A, B"));
    }

    #[test]
    fn test_keys_match_distinct_coordinates() {
        let records = vec![
            WalkerRecord::new("T1", -34.6, -58.4),
            WalkerRecord::new("T2", -34.6, -58.5),
            WalkerRecord::new("T3", -34.6, -58.4),
            WalkerRecord::new("T4", f64::NAN, -58.4),
            WalkerRecord::new("T5", -34.7, -58.4),
        ];
        let markers = MarkerSet::consolidate(&records, None);

        let expected: HashSet<Coordinate> = records.iter().filter_map(|r| r.coordinate()).collect();
        let keys: HashSet<Coordinate> = markers.iter().map(|(c, _)| *c).collect();
        assert_eq!(keys, expected);
        assert_eq!(markers.len(), 3);
    }

    #[test]
    fn test_iteration_order() {
        let records = vec![
            WalkerRecord::new("C", 3.0, 0.0),
            WalkerRecord::new("A", 1.0, 2.0),
            WalkerRecord::new("B", 1.0, 1.0),
        ];
        let markers = MarkerSet::consolidate(&records, None);
        let labels: Vec<&str> = markers.iter().map(|(_, l)| l).collect();
        assert_eq!(labels, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_exact_resolve() {
        let records = vec![WalkerRecord::new("T1", -34.603722, -58.381592)];
        let markers = MarkerSet::consolidate(&records, None);

        assert!(markers.resolve(coord(-34.603722, -58.381592)).is_some());
        assert!(markers.resolve(coord(-34.6037221, -58.381592)).is_none());
    }

    #[test]
    fn test_resolve_with_precision() {
        let records = vec![
            WalkerRecord::new("T1", -34.6037221, -58.3815919),
            WalkerRecord::new("T2", -34.6037249, -58.3815901),
        ];
        let markers = MarkerSet::consolidate(&records, Some(5));

        assert_eq!(markers.len(), 1);
        let key = markers.resolve(coord(-34.603723, -58.381591)).unwrap();
        assert_eq!(markers.label(&key), Some("T1, T2"));
    }

    #[test]
    fn test_empty_records() {
        let markers = MarkerSet::consolidate(&[], None);
        assert!(markers.is_empty());
        assert!(markers.resolve(coord(0.0, 0.0)).is_none());
    }
}
