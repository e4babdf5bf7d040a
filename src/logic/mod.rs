pub mod crop_store;
pub mod reconcile;

pub use crop_store::{CropStore, SelectionPhase};
