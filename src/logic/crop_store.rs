use crate::datasources::CropCatalog;
use crate::error::{CropSyncError, Result};
use crate::logic::reconcile::{catalog_ids, reconcile, replace_crop, Reconciled, SelectionSource};
use crate::models::{Crop, CropId, IrrigationWindow, ThresholdField};
use crate::storage::{CropRepository, LocalStorage};
use chrono::NaiveTime;
use tracing::{debug, info, warn};

/// Where the user is in the select / tune / confirm flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Unselected,
    Selected,
    Editing,
    Committed,
}

impl SelectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionPhase::Unselected => "No crop selected",
            SelectionPhase::Selected => "Selected",
            SelectionPhase::Editing => "Editing",
            SelectionPhase::Committed => "In use",
        }
    }

    pub fn has_selection(&self) -> bool {
        !matches!(self, SelectionPhase::Unselected)
    }
}

/// Override-aware view of the crop catalog plus the user's current choice.
///
/// Every mutation writes through to local storage before the in-memory view
/// changes, so a reload always reproduces what the user last saw.
pub struct CropStore<C, S> {
    catalog: C,
    repo: CropRepository<S>,
    prune_orphans: bool,
    crops: Vec<Crop>,
    selected: Option<Crop>,
    edited: Option<Crop>,
    phase: SelectionPhase,
}

impl<C: CropCatalog, S: LocalStorage> CropStore<C, S> {
    pub fn new(catalog: C, storage: S) -> Self {
        Self {
            catalog,
            repo: CropRepository::new(storage),
            prune_orphans: true,
            crops: Vec::new(),
            selected: None,
            edited: None,
            phase: SelectionPhase::Unselected,
        }
    }

    pub fn with_pruning(mut self, enabled: bool) -> Self {
        self.prune_orphans = enabled;
        self
    }

    /// Rebuild the crop list from the catalog and local overrides, and
    /// re-resolve the persisted selection against it.
    ///
    /// Fails with `CatalogUnavailable` when the catalog cannot be fetched; the
    /// current view is left as it was.
    pub async fn load_crops(&mut self) -> Result<()> {
        let snapshot = self.repo.selected_crop()?;

        let catalog = self.catalog.fetch_all().await.map_err(|e| match e {
            CropSyncError::CatalogUnavailable(_) => e,
            other => CropSyncError::CatalogUnavailable(other.to_string()),
        })?;

        let overlay = self.repo.overrides()?;
        let Reconciled { crops, selected } = reconcile(catalog, &overlay, snapshot);

        // An empty catalog never prunes
        if self.prune_orphans && !crops.is_empty() {
            let removed = self.repo.prune_overrides(&catalog_ids(&crops))?;
            if !removed.is_empty() {
                info!(?removed, "Pruned overrides for crops no longer in the catalog");
            }
        }

        match selected {
            Some((crop, source)) => {
                if source == SelectionSource::Snapshot {
                    warn!(
                        crop_id = crop.id,
                        "Selected crop missing from catalog, using saved copy"
                    );
                }
                self.selected = Some(crop.clone());
                self.edited = Some(crop);
                self.phase = SelectionPhase::Selected;
            }
            None => {
                self.selected = None;
                self.edited = None;
                self.phase = SelectionPhase::Unselected;
            }
        }

        debug!(count = crops.len(), "Loaded crops");
        self.crops = crops;
        Ok(())
    }

    /// Make `crop` the current choice, attaching its saved irrigation window.
    pub fn select_crop(&mut self, crop: Crop) -> Result<Crop> {
        let window = self.repo.irrigation_window(crop.id)?;
        let enriched = crop.with_irrigation_window(window.as_ref());

        self.repo.save_selected_crop(&enriched)?;

        self.selected = Some(enriched.clone());
        self.edited = Some(enriched.clone());
        self.phase = SelectionPhase::Selected;
        info!(crop_id = enriched.id, name = %enriched.name, "Selected crop");
        Ok(enriched)
    }

    pub fn select_crop_by_id(&mut self, crop_id: CropId) -> Result<Crop> {
        let crop = self
            .crops
            .iter()
            .find(|c| c.id == crop_id)
            .cloned()
            .ok_or_else(|| CropSyncError::NotFound(format!("crop #{}", crop_id)))?;
        self.select_crop(crop)
    }

    /// Change one threshold of the crop being edited.
    ///
    /// The new value lands in the selected-crop snapshot, in the override
    /// map (merged with earlier overrides for the same crop) and in the
    /// in-memory list. Non-numeric input is rejected without touching state.
    pub fn edit_field(&mut self, field: ThresholdField, raw_value: &str) -> Result<Crop> {
        let current = self.edited.as_ref().ok_or(CropSyncError::NoSelection)?;
        let value = parse_threshold(field, raw_value)?;
        let updated = current.clone().with_threshold(field, value);

        self.repo.save_selected_crop(&updated)?;
        self.repo.merge_override(updated.id, field, value)?;
        replace_crop(&mut self.crops, &updated);

        self.edited = Some(updated.clone());
        self.phase = SelectionPhase::Editing;
        Ok(updated)
    }

    /// Flip between viewing and editing the selected crop.
    pub fn toggle_editing(&mut self) -> Result<SelectionPhase> {
        self.phase = match self.phase {
            SelectionPhase::Unselected => return Err(CropSyncError::NoSelection),
            SelectionPhase::Editing => SelectionPhase::Selected,
            SelectionPhase::Selected | SelectionPhase::Committed => SelectionPhase::Editing,
        };
        Ok(self.phase)
    }

    /// Persist the edited crop as the one in use. Thresholds must form
    /// valid ranges.
    pub fn commit_selection(&mut self) -> Result<Crop> {
        let crop = self.edited.clone().ok_or(CropSyncError::NoSelection)?;

        let inverted = crop.inverted_ranges();
        if !inverted.is_empty() {
            let names: Vec<&str> = inverted.iter().map(|r| r.as_str()).collect();
            return Err(CropSyncError::InvalidData(format!(
                "minimum exceeds maximum for: {}",
                names.join(", ")
            )));
        }

        self.repo.save_selected_crop(&crop)?;
        self.selected = Some(crop.clone());
        self.phase = SelectionPhase::Committed;
        info!(crop_id = crop.id, name = %crop.name, "Committed crop selection");
        Ok(crop)
    }

    /// Save the daily irrigation window for a crop. If it is the current
    /// selection, the snapshot is refreshed with the new times.
    pub fn schedule_irrigation(
        &mut self,
        crop_id: CropId,
        start_time: &str,
        end_time: &str,
    ) -> Result<IrrigationWindow> {
        let start = parse_clock(start_time)?;
        let end = parse_clock(end_time)?;
        if start == end {
            return Err(CropSyncError::InvalidData(
                "irrigation start and end times are identical".into(),
            ));
        }

        let window = IrrigationWindow::new(
            start.format("%H:%M").to_string(),
            end.format("%H:%M").to_string(),
        );
        self.repo.save_irrigation_window(crop_id, window.clone())?;

        if let Some(edited) = self.edited.as_ref().filter(|c| c.id == crop_id) {
            let enriched = edited.clone().with_irrigation_window(Some(&window));
            self.repo.save_selected_crop(&enriched)?;
            self.selected = self
                .selected
                .take()
                .map(|s| s.with_irrigation_window(Some(&window)));
            self.edited = Some(enriched);
        }

        info!(crop_id, start = %window.start_time, end = %window.end_time, "Saved irrigation window");
        Ok(window)
    }

    pub fn crops(&self) -> &[Crop] {
        &self.crops
    }

    pub fn selected(&self) -> Option<&Crop> {
        self.selected.as_ref()
    }

    pub fn edited(&self) -> Option<&Crop> {
        self.edited.as_ref()
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    pub fn repository(&self) -> &CropRepository<S> {
        &self.repo
    }
}

fn parse_threshold(field: ThresholdField, raw: &str) -> Result<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        CropSyncError::InvalidData(format!("{} must be a number, got '{}'", field, raw))
    })?;

    if !value.is_finite() {
        return Err(CropSyncError::InvalidData(format!(
            "{} must be a finite number, got '{}'",
            field, raw
        )));
    }

    Ok(value)
}

fn parse_clock(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        CropSyncError::InvalidData(format!("'{}' is not a time of day (HH:MM)", raw))
    })
}
