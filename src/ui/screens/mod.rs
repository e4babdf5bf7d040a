pub mod select_crop;

pub use select_crop::SelectCropScreen;
