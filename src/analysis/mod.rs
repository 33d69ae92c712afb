pub mod fft;
pub mod fixed;

pub use fft::{FftContext, Spectrum};
pub use fixed::Fixed;
