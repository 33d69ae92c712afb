pub mod channels;
pub mod governor;
pub mod history;
pub mod scope_processor;
pub mod trigger;

pub use scope_processor::{CaptureSnapshot, ScopeProcessor, ScopeProcessorConfig};
