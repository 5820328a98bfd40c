/// Pointer, picking and point-capacity limits for the measurement tools.
pub mod interaction;

/// Default values for the runtime measurement settings.
pub mod measure_defaults;

/// Asset paths loaded at startup.
pub mod paths;

/// Sizes, layers and colours used when drawing measurement geometry.
pub mod render_settings;
