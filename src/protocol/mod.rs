pub mod commands;
pub mod element;
pub mod packing;

pub use element::{Element, ElementStream};
pub use packing::PackingMode;
