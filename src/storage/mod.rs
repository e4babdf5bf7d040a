pub mod repository;

pub use repository::CropRepository;

use crate::error::Result;

/// Synchronous string-keyed durable store, the counterpart of a browser's
/// origin-scoped local storage.
pub trait LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}
