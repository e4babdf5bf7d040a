//! Pure merge rules combining the remote catalog, the local overlay and the
//! persisted selection snapshot.

use crate::models::{Crop, CropId, OverlayMap};
use std::collections::HashSet;

/// Where the resolved selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    /// Re-derived from catalog + overlay.
    Catalog,
    /// Catalog no longer lists the id; the stale snapshot is used as-is.
    Snapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub crops: Vec<Crop>,
    pub selected: Option<(Crop, SelectionSource)>,
}

/// Apply overlay entries to catalog crops, keeping catalog order.
pub fn merge_catalog(catalog: Vec<Crop>, overlay: &OverlayMap) -> Vec<Crop> {
    catalog
        .into_iter()
        .map(|crop| match overlay.get(&crop.id) {
            Some(over) => crop.with_override(over),
            None => crop,
        })
        .collect()
}

/// Resolve a persisted snapshot against the merged list. A match replaces
/// the snapshot entirely, so fields it carried beyond catalog + overlay
/// are dropped.
pub fn resolve_selection(
    merged: &[Crop],
    snapshot: Option<Crop>,
) -> Option<(Crop, SelectionSource)> {
    let snapshot = snapshot?;
    match merged.iter().find(|c| c.id == snapshot.id) {
        Some(current) => Some((current.clone(), SelectionSource::Catalog)),
        None => Some((snapshot, SelectionSource::Snapshot)),
    }
}

pub fn reconcile(catalog: Vec<Crop>, overlay: &OverlayMap, snapshot: Option<Crop>) -> Reconciled {
    let crops = merge_catalog(catalog, overlay);
    let selected = resolve_selection(&crops, snapshot);
    Reconciled { crops, selected }
}

pub fn catalog_ids(crops: &[Crop]) -> HashSet<CropId> {
    crops.iter().map(|c| c.id).collect()
}

/// Replace the entry with the same id, leaving the rest untouched.
pub fn replace_crop(crops: &mut [Crop], updated: &Crop) -> bool {
    match crops.iter_mut().find(|c| c.id == updated.id) {
        Some(slot) => {
            *slot = updated.clone();
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CropOverride, IrrigationWindow, ThresholdField};

    fn catalog() -> Vec<Crop> {
        vec![
            Crop::new(3, "Lettuce")
                .with_threshold(ThresholdField::MinTemperature, 7.0)
                .with_threshold(ThresholdField::MaxTemperature, 24.0),
            Crop::new(7, "Tomato")
                .with_threshold(ThresholdField::MinTemperature, 15.0)
                .with_threshold(ThresholdField::MaxTemperature, 30.0),
            Crop::new(9, "Rice")
                .with_threshold(ThresholdField::MinSoilMoisture, 60.0)
                .with_threshold(ThresholdField::MaxSoilMoisture, 95.0),
        ]
    }

    fn overlay_for(id: CropId, field: ThresholdField, value: f64) -> OverlayMap {
        let mut over = CropOverride::default();
        over.set(field, value);
        let mut overlay = OverlayMap::new();
        overlay.insert(id, over);
        overlay
    }

    #[test]
    fn merge_keeps_catalog_order_and_applies_overlay() {
        let overlay = overlay_for(7, ThresholdField::MinTemperature, 18.0);
        let merged = merge_catalog(catalog(), &overlay);

        let ids: Vec<CropId> = merged.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 7, 9]);
        assert_eq!(merged[1].min_temperature, 18.0);
        assert_eq!(merged[1].max_temperature, 30.0);
        assert_eq!(merged[0], catalog()[0]);
        assert_eq!(merged[2], catalog()[2]);
    }

    #[test]
    fn overlay_for_unknown_id_is_ignored() {
        let overlay = overlay_for(42, ThresholdField::MinTemperature, 1.0);
        assert_eq!(merge_catalog(catalog(), &overlay), catalog());
    }

    #[test]
    fn snapshot_resolves_to_merged_crop() {
        let overlay = overlay_for(7, ThresholdField::MinTemperature, 18.0);
        let stale = Crop::new(7, "Tomato (old name)")
            .with_irrigation_window(Some(&IrrigationWindow::new("06:00", "06:30")));

        let result = reconcile(catalog(), &overlay, Some(stale));
        let (selected, source) = result.selected.unwrap();

        assert_eq!(source, SelectionSource::Catalog);
        assert_eq!(selected.name, "Tomato");
        assert_eq!(selected.min_temperature, 18.0);
        assert!(selected.start_time.is_none());
        assert_eq!(selected, result.crops[1]);
    }

    #[test]
    fn missing_crop_falls_back_to_snapshot() {
        let stale = Crop::new(99, "Discontinued")
            .with_threshold(ThresholdField::MaxHumidity, 55.0);

        let result = reconcile(catalog(), &OverlayMap::new(), Some(stale.clone()));
        assert_eq!(result.selected, Some((stale, SelectionSource::Snapshot)));
        assert_eq!(result.crops.len(), 3);
    }

    #[test]
    fn no_snapshot_means_no_selection() {
        let result = reconcile(catalog(), &OverlayMap::new(), None);
        assert!(result.selected.is_none());
    }

    #[test]
    fn empty_catalog_with_snapshot_uses_snapshot() {
        let stale = Crop::new(3, "Lettuce");
        let result = reconcile(Vec::new(), &OverlayMap::new(), Some(stale.clone()));
        assert!(result.crops.is_empty());
        assert_eq!(result.selected, Some((stale, SelectionSource::Snapshot)));
    }

    #[test]
    fn replace_crop_swaps_matching_entry() {
        let mut crops = catalog();
        let updated = crops[2]
            .clone()
            .with_threshold(ThresholdField::MinSoilMoisture, 65.0);

        assert!(replace_crop(&mut crops, &updated));
        assert_eq!(crops[2].min_soil_moisture, 65.0);
        assert_eq!(crops[0], catalog()[0]);

        assert!(!replace_crop(&mut crops, &Crop::new(100, "Nope")));
    }

    #[test]
    fn catalog_ids_collects_every_id() {
        let ids = catalog_ids(&catalog());
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&9));
    }
}
