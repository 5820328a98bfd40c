/// Significant digits used when formatting measured values.
pub const DEFAULT_PRECISION: u32 = 2;

/// Largest precision accepted from settings or the host.
pub const MAX_PRECISION: u32 = 12;

/// Label scale factor; the reference size all label geometry is relative to.
pub const DEFAULT_LABEL_SIZE: f32 = 8.0;

pub const DEFAULT_LINE_COLOR: &str = "#ff0000";
pub const DEFAULT_LINE_WIDTH: f32 = 1.0;
pub const DEFAULT_POINT_COLOR: &str = "#ff5000";
pub const DEFAULT_POINT_SIZE: f32 = 10.0;
pub const DEFAULT_FACE_COLOR: &str = "#87cefa";

/// Accepted range for the label scale factor.
pub const MIN_LABEL_SIZE: f32 = 0.5;
pub const MAX_LABEL_SIZE: f32 = 64.0;
