use crate::datasources::CropCatalog;
use crate::logic::{CropStore, SelectionPhase};
use crate::models::{Crop, ThresholdField};
use crate::storage::LocalStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

pub struct SelectCropState {
    pub list_index: usize,
    pub focused_field: ThresholdField,
    pub input_active: bool,
    pub edit_buffer: String,
}

impl SelectCropState {
    pub fn new() -> Self {
        Self {
            list_index: 0,
            focused_field: ThresholdField::MinTemperature,
            input_active: false,
            edit_buffer: String::new(),
        }
    }

    pub fn next(&mut self, max: usize) {
        if max > 0 && self.list_index < max - 1 {
            self.list_index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.list_index > 0 {
            self.list_index -= 1;
        }
    }

    pub fn next_field(&mut self) {
        self.focused_field = self.focused_field.next();
    }

    pub fn prev_field(&mut self) {
        self.focused_field = self.focused_field.prev();
    }

    pub fn start_input(&mut self, current_value: &str) {
        self.input_active = true;
        self.edit_buffer = current_value.to_string();
    }

    pub fn cancel_input(&mut self) {
        self.input_active = false;
        self.edit_buffer.clear();
    }

    pub fn finish_input(&mut self) -> String {
        self.input_active = false;
        std::mem::take(&mut self.edit_buffer)
    }
}

impl Default for SelectCropState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct App<C, S> {
    pub store: CropStore<C, S>,
    pub load_state: LoadState,
    pub select_state: SelectCropState,
    pub committed: Option<Crop>,

    // UI state
    pub status_message: Option<String>,
    pub should_quit: bool,
    pub needs_reload: bool,
}

impl<C: CropCatalog, S: LocalStorage> App<C, S> {
    pub fn new(store: CropStore<C, S>) -> Self {
        Self {
            store,
            load_state: LoadState::Loading,
            select_state: SelectCropState::new(),
            committed: None,
            status_message: None,
            should_quit: false,
            needs_reload: true,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
    }

    pub fn request_reload(&mut self) {
        self.needs_reload = true;
        self.load_state = LoadState::Loading;
        self.set_status("Loading crops...");
    }

    pub async fn reload(&mut self) {
        self.needs_reload = false;
        match self.store.load_crops().await {
            Ok(()) => {
                self.load_state = LoadState::Ready;
                self.select_state.cancel_input();
                self.select_state.list_index = self
                    .store
                    .selected()
                    .and_then(|sel| self.store.crops().iter().position(|c| c.id == sel.id))
                    .unwrap_or(0);
                self.status_message = None;
            }
            Err(e) => {
                tracing::warn!("Failed to load crops: {}", e);
                self.load_state = LoadState::Failed(e.to_string());
            }
        }
    }

    pub fn is_editing(&self) -> bool {
        self.store.phase() == SelectionPhase::Editing
    }

    pub fn highlighted_crop(&self) -> Option<&Crop> {
        self.store.crops().get(self.select_state.list_index)
    }

    pub fn select_highlighted(&mut self) {
        let Some(crop) = self.highlighted_crop().cloned() else {
            return;
        };
        self.select_state.cancel_input();
        match self.store.select_crop(crop) {
            Ok(selected) => self.set_status(&format!("Selected {}", selected.name)),
            Err(e) => self.set_status(&format!("Selection failed: {}", e)),
        }
    }

    pub fn toggle_editing(&mut self) {
        self.select_state.cancel_input();
        if let Err(e) = self.store.toggle_editing() {
            self.set_status(&e.to_string());
        }
    }

    pub fn begin_field_input(&mut self) {
        let Some(crop) = self.store.edited() else {
            return;
        };
        let current = self.select_state.focused_field.get(crop).to_string();
        self.select_state.start_input(&current);
    }

    pub fn apply_field_input(&mut self) {
        let field = self.select_state.focused_field;
        let raw = self.select_state.finish_input();
        match self.store.edit_field(field, &raw) {
            Ok(_) => self.set_status(&format!("Saved {}", field.label())),
            Err(e) => self.set_status(&e.to_string()),
        }
    }

    /// Confirm the edited crop. On success the crop is kept in `committed`
    /// and the app exits, handing control to whatever runs next.
    pub fn commit(&mut self) {
        self.select_state.cancel_input();
        match self.store.commit_selection() {
            Ok(crop) => {
                self.set_status(&format!("Using {}", crop.name));
                self.committed = Some(crop);
                self.quit();
            }
            Err(e) => self.set_status(&format!("Cannot use this crop: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::{CropSyncError, Result};

    struct FixedCatalog(Option<Vec<Crop>>);

    impl CropCatalog for FixedCatalog {
        async fn fetch_all(&self) -> Result<Vec<Crop>> {
            self.0
                .clone()
                .ok_or_else(|| CropSyncError::CatalogUnavailable("offline".into()))
        }
    }

    fn crops() -> Vec<Crop> {
        vec![
            Crop::new(1, "Maize")
                .with_threshold(ThresholdField::MinTemperature, 18.0)
                .with_threshold(ThresholdField::MaxTemperature, 32.0),
            Crop::new(2, "Wheat")
                .with_threshold(ThresholdField::MinTemperature, 12.0)
                .with_threshold(ThresholdField::MaxTemperature, 25.0),
        ]
    }

    fn app(catalog: Option<Vec<Crop>>) -> App<FixedCatalog, Database> {
        let db = Database::open_in_memory().unwrap();
        App::new(CropStore::new(FixedCatalog(catalog), db))
    }

    #[tokio::test]
    async fn reload_marks_ready() {
        let mut app = app(Some(crops()));
        assert!(app.needs_reload);

        app.reload().await;
        assert_eq!(app.load_state, LoadState::Ready);
        assert!(!app.needs_reload);
        assert_eq!(app.highlighted_crop().unwrap().name, "Maize");
    }

    #[tokio::test]
    async fn reload_failure_is_shown() {
        let mut app = app(None);
        app.reload().await;
        assert!(matches!(app.load_state, LoadState::Failed(ref msg) if msg.contains("offline")));

        app.request_reload();
        assert!(app.needs_reload);
        assert_eq!(app.load_state, LoadState::Loading);
    }

    #[tokio::test]
    async fn reload_highlights_saved_selection() {
        let mut app = app(Some(crops()));
        app.reload().await;
        app.select_state.next(2);
        app.select_highlighted();

        app.select_state.list_index = 0;
        app.reload().await;
        assert_eq!(app.select_state.list_index, 1);
    }

    #[tokio::test]
    async fn field_input_flow_edits_crop() {
        let mut app = app(Some(crops()));
        app.reload().await;
        app.select_highlighted();
        app.toggle_editing();
        assert!(app.is_editing());

        app.select_state.next_field();
        app.begin_field_input();
        assert_eq!(app.select_state.edit_buffer, "32");

        app.select_state.edit_buffer = "35".into();
        app.apply_field_input();

        assert_eq!(app.store.edited().unwrap().max_temperature, 35.0);
        assert!(!app.select_state.input_active);
    }

    #[tokio::test]
    async fn bad_input_reports_status() {
        let mut app = app(Some(crops()));
        app.reload().await;
        app.select_highlighted();

        app.begin_field_input();
        app.select_state.edit_buffer = "warm".into();
        app.apply_field_input();

        assert!(app.status_message.unwrap().contains("must be a number"));
        assert_eq!(app.store.edited().unwrap().min_temperature, 18.0);
    }

    #[tokio::test]
    async fn commit_quits_with_crop() {
        let mut app = app(Some(crops()));
        app.reload().await;

        app.commit();
        assert!(!app.should_quit);
        assert!(app.committed.is_none());

        app.select_highlighted();
        app.commit();
        assert!(app.should_quit);
        assert_eq!(app.committed.unwrap().name, "Maize");
    }
}
