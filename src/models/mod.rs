pub mod crop;
pub mod registration;

pub use crop::*;
pub use registration::*;
