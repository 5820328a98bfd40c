/// Maximum number of points a single measurement session can hold.
pub const MAX_MEASURE_POINTS: usize = 50;

/// Intersections farther than this from the camera are ignored by the picker.
pub const MAX_PICK_DISTANCE: f32 = 500.0;

/// A click accepted within this window after the previous one is dropped,
/// so the two clicks of a double click only commit a single point.
pub const CLICK_SUPPRESSION_MS: u64 = 500;

/// Two pointer releases within this window are reported as a double click.
pub const DOUBLE_CLICK_WINDOW_MS: u64 = 400;

/// Pointer travel (in logical pixels) between press and release that still counts as a click.
pub const CLICK_MOVE_TOLERANCE_PX: f32 = 3.0;

/// Number of segments used to approximate the angle arc.
pub const ARC_SEGMENTS: usize = 10;
