pub mod input;
pub mod range;

pub use input::InputWidget;
pub use range::RangeWidget;
