use bevy::prelude::*;

/// Render layer shared by all measurement geometry; drawn by the overlay
/// camera after the model so it is never occluded.
pub const OVERLAY_RENDER_LAYER: usize = 1;

/// World-space thickness of a polyline segment at line width 1.
pub const DRAW_LINE_WIDTH: f32 = 0.004;

/// World-space radius of a point marker at point size 10.
pub const DRAW_VERTEX_SIZE: f32 = 0.008;

/// Opacity applied to the different kinds of measurement geometry.
pub const LINE_OPACITY: f32 = 0.8;
pub const POINT_OPACITY: f32 = 0.6;
pub const FACE_OPACITY: f32 = 0.3;

/// Label billboard geometry: glyph height in pixels at label scale 1 and
/// horizontal padding around the text, both before scaling.
pub const LABEL_FONT_PX_PER_UNIT: f32 = 2.0;
pub const LABEL_PADDING_RATIO: f32 = 0.4;
/// Average glyph advance relative to the font size, used to size billboards.
pub const LABEL_GLYPH_ADVANCE: f32 = 0.55;
/// Billboard height relative to the font size.
pub const LABEL_HEIGHT_RATIO: f32 = 1.5;
/// Widest billboard allowed, in pixels.
pub const LABEL_MAX_WIDTH_PX: f32 = 2048.0;

pub const LABEL_TEXT_COLOR: Color = Color::srgb(0.0, 0.0, 0.0);
pub const LABEL_BACKGROUND_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.75);
pub const LABEL_HOVER_BACKGROUND_COLOR: Color = Color::srgba(1.0, 0.95, 0.6, 0.9);
