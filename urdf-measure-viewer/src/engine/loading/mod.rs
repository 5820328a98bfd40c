//! Startup configuration and model loading.
//!
//! The viewer configuration is read first; it seeds the measurement
//! settings and camera framing, then requests the initial model.

/// Viewer configuration loading from JSON.
///
/// Applies measurement settings and camera framing, then enters the running state.
pub mod config_loader;

/// glTF model spawning and replacement.
pub mod model_loader;
