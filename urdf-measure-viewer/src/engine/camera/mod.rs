//! Viewport cameras for model navigation.
//!
//! Provides orbit camera controls with smooth interpolation and
//! keyboard/mouse input handling, plus the overlay camera that draws
//! measurement geometry above the model.

/// Viewport camera resource and controller system for scene navigation.
pub mod viewport_camera;
