use crate::error::{CropSyncError, Result};
use crate::models::{
    Crop, CropId, CropOverride, IrrigationTimes, IrrigationWindow, OverlayMap, ThresholdField,
};
use crate::storage::LocalStorage;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

pub const SELECTED_CROP_KEY: &str = "selectedCrop";
pub const EDITED_CROPS_KEY: &str = "editedCrops";
pub const IRRIGATION_TIMES_KEY: &str = "irrigationTimes";

/// Typed access to the three persisted crop records. All JSON encoding and
/// decoding of local state goes through here; undecodable values are logged
/// and read as absent.
pub struct CropRepository<S> {
    storage: S,
}

impl<S: LocalStorage> CropRepository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // Selected crop snapshot

    pub fn selected_crop(&self) -> Result<Option<Crop>> {
        self.read_json(SELECTED_CROP_KEY)
    }

    pub fn save_selected_crop(&self, crop: &Crop) -> Result<()> {
        self.write_json(SELECTED_CROP_KEY, crop)
    }

    // Edited-crops overlay

    pub fn overrides(&self) -> Result<OverlayMap> {
        Ok(self.read_json(EDITED_CROPS_KEY)?.unwrap_or_default())
    }

    /// Record one edited field for a crop, keeping whatever else was already
    /// overridden for it. Returns the crop's full override entry.
    pub fn merge_override(
        &self,
        crop_id: CropId,
        field: ThresholdField,
        value: f64,
    ) -> Result<CropOverride> {
        let mut overlay = self.overrides()?;
        let entry = overlay.entry(crop_id).or_default();
        entry.set(field, value);
        let updated = entry.clone();

        self.write_json(EDITED_CROPS_KEY, &overlay)?;
        debug!(crop_id, field = %field, value, "Stored crop override");
        Ok(updated)
    }

    /// Drop overlay entries for crops that are not in `catalog_ids`.
    /// Returns the removed ids.
    pub fn prune_overrides(&self, catalog_ids: &HashSet<CropId>) -> Result<Vec<CropId>> {
        let mut overlay = self.overrides()?;
        let orphaned: Vec<CropId> = overlay
            .keys()
            .filter(|id| !catalog_ids.contains(id))
            .copied()
            .collect();

        if orphaned.is_empty() {
            return Ok(orphaned);
        }

        overlay.retain(|id, _| catalog_ids.contains(id));
        self.write_json(EDITED_CROPS_KEY, &overlay)?;
        Ok(orphaned)
    }

    // Irrigation times

    pub fn irrigation_times(&self) -> Result<IrrigationTimes> {
        Ok(self.read_json(IRRIGATION_TIMES_KEY)?.unwrap_or_default())
    }

    pub fn irrigation_window(&self, crop_id: CropId) -> Result<Option<IrrigationWindow>> {
        Ok(self.irrigation_times()?.remove(&crop_id))
    }

    pub fn save_irrigation_window(&self, crop_id: CropId, window: IrrigationWindow) -> Result<()> {
        let mut times = self.irrigation_times()?;
        times.insert(crop_id, window);
        self.write_json(IRRIGATION_TIMES_KEY, &times)
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.storage.get_item(key)? else {
            return Ok(None);
        };

        match decode(key, &raw) {
            Ok(value) => Ok(Some(value)),
            Err(CropSyncError::MalformedLocalState { key, reason }) => {
                warn!(key = %key, error = %reason, "Ignoring malformed local state");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.storage.set_item(key, &raw)
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| CropSyncError::MalformedLocalState {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn repo() -> CropRepository<Database> {
        CropRepository::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn empty_storage_reads_as_defaults() {
        let repo = repo();
        assert!(repo.selected_crop().unwrap().is_none());
        assert!(repo.overrides().unwrap().is_empty());
        assert!(repo.irrigation_times().unwrap().is_empty());
    }

    #[test]
    fn malformed_values_read_as_absent() {
        let repo = repo();
        repo.storage().set_item(SELECTED_CROP_KEY, "{not json").unwrap();
        repo.storage().set_item(EDITED_CROPS_KEY, "[1,2").unwrap();
        repo.storage().set_item(IRRIGATION_TIMES_KEY, "42").unwrap();

        assert!(repo.selected_crop().unwrap().is_none());
        assert!(repo.overrides().unwrap().is_empty());
        assert!(repo.irrigation_times().unwrap().is_empty());
    }

    #[test]
    fn decode_reports_malformed_state_with_key() {
        let err = decode::<OverlayMap>(EDITED_CROPS_KEY, "{").unwrap_err();
        match err {
            CropSyncError::MalformedLocalState { key, .. } => assert_eq!(key, EDITED_CROPS_KEY),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn merge_override_keeps_other_fields() {
        let repo = repo();
        repo.merge_override(7, ThresholdField::MinTemperature, 18.0)
            .unwrap();
        let entry = repo
            .merge_override(7, ThresholdField::MaxHumidity, 65.0)
            .unwrap();

        assert_eq!(entry.min_temperature, Some(18.0));
        assert_eq!(entry.max_humidity, Some(65.0));

        let overlay = repo.overrides().unwrap();
        assert_eq!(overlay[&7].min_temperature, Some(18.0));
        assert_eq!(overlay[&7].max_humidity, Some(65.0));
    }

    #[test]
    fn merge_override_replaces_corrupted_overlay() {
        let repo = repo();
        repo.storage().set_item(EDITED_CROPS_KEY, "garbage").unwrap();
        repo.merge_override(2, ThresholdField::MinHumidity, 30.0)
            .unwrap();

        let overlay = repo.overrides().unwrap();
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay[&2].min_humidity, Some(30.0));
    }

    #[test]
    fn overlay_is_stored_under_stringified_ids() {
        let repo = repo();
        repo.merge_override(7, ThresholdField::MinTemperature, 18.0)
            .unwrap();
        let raw = repo.storage().get_item(EDITED_CROPS_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"7":{"minTemperature":18.0}}"#);
    }

    #[test]
    fn browser_written_overlay_is_readable() {
        let repo = repo();
        // NaN edits serialize as null in browser JSON
        repo.storage()
            .set_item(
                EDITED_CROPS_KEY,
                r#"{"4":{"minTemperature":12,"maxTemperature":null}}"#,
            )
            .unwrap();

        let overlay = repo.overrides().unwrap();
        assert_eq!(overlay[&4].min_temperature, Some(12.0));
        assert_eq!(overlay[&4].max_temperature, None);
    }

    #[test]
    fn prune_removes_only_unknown_ids() {
        let repo = repo();
        repo.merge_override(1, ThresholdField::MinTemperature, 10.0)
            .unwrap();
        repo.merge_override(99, ThresholdField::MinTemperature, 11.0)
            .unwrap();

        let catalog: HashSet<CropId> = [1, 2, 3].into_iter().collect();
        let removed = repo.prune_overrides(&catalog).unwrap();

        assert_eq!(removed, vec![99]);
        let overlay = repo.overrides().unwrap();
        assert!(overlay.contains_key(&1));
        assert!(!overlay.contains_key(&99));

        assert!(repo.prune_overrides(&catalog).unwrap().is_empty());
    }

    #[test]
    fn irrigation_windows_round_trip_per_crop() {
        let repo = repo();
        repo.save_irrigation_window(3, IrrigationWindow::new("06:00", "06:30"))
            .unwrap();
        repo.save_irrigation_window(4, IrrigationWindow::new("18:00", "18:45"))
            .unwrap();

        assert_eq!(
            repo.irrigation_window(3).unwrap(),
            Some(IrrigationWindow::new("06:00", "06:30"))
        );
        assert_eq!(repo.irrigation_window(5).unwrap(), None);
        assert_eq!(repo.irrigation_times().unwrap().len(), 2);
    }

    #[test]
    fn selected_snapshot_round_trips() {
        let repo = repo();
        let crop = Crop::new(3, "Lettuce")
            .with_irrigation_window(Some(&IrrigationWindow::new("06:00", "06:30")));
        repo.save_selected_crop(&crop).unwrap();
        assert_eq!(repo.selected_crop().unwrap(), Some(crop));
    }
}
