pub mod config; // Configuration constants and TOML loading
pub mod dsp; // Oscillator, envelope, filters, volume
pub mod error;
pub mod io; // Audio sinks and trigger sources
pub mod synth; // Voices, worker pool and parameter dispatch

pub use config::SynthConfig;
pub use error::{Result, SynthError};
