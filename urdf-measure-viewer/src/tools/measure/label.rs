use super::settings::MeasurementSettings;
use bevy::math::{Vec2, Vec3};
use constants::render_settings::{
    LABEL_FONT_PX_PER_UNIT, LABEL_GLYPH_ADVANCE, LABEL_HEIGHT_RATIO, LABEL_MAX_WIDTH_PX,
    LABEL_PADDING_RATIO,
};

/// Billboard text anchored at a world position.
///
/// Labels are values: changing the text or the anchor means building a new
/// label and swapping it into the scene. They never take part in picking.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub anchor: Vec3,
    pub font_size: f32,
    /// Screen-space footprint in logical pixels, padding included.
    pub extent: Vec2,
}

impl Label {
    pub fn aspect_ratio(&self) -> f32 {
        self.extent.x / self.extent.y
    }

    pub fn padding(&self) -> f32 {
        self.font_size * LABEL_PADDING_RATIO
    }

    /// Copy of this label moved to `anchor`.
    pub fn moved_to(&self, anchor: Vec3) -> Label {
        Label {
            anchor,
            ..self.clone()
        }
    }
}

/// Builds a label sized by the current `label_size` setting.
pub fn create_label(text: impl Into<String>, anchor: Vec3, settings: &MeasurementSettings) -> Label {
    let text = text.into();
    let font_size = LABEL_FONT_PX_PER_UNIT * settings.label_size();
    let padding = font_size * LABEL_PADDING_RATIO;

    let text_width = text.chars().count() as f32 * font_size * LABEL_GLYPH_ADVANCE;
    let width = (text_width + 2.0 * padding).min(LABEL_MAX_WIDTH_PX);
    let height = font_size * LABEL_HEIGHT_RATIO;

    Label {
        text,
        anchor,
        font_size,
        extent: Vec2::new(width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn label_scales_with_label_size() {
        let mut settings = MeasurementSettings::default();
        let small = create_label("5.00 m", Vec3::ZERO, &settings);
        settings.set_label_size(16.0).unwrap();
        let large = create_label("5.00 m", Vec3::ZERO, &settings);

        assert_relative_eq!(large.font_size, small.font_size * 2.0);
        assert_relative_eq!(large.extent.x, small.extent.x * 2.0, epsilon = 1e-3);
        assert_relative_eq!(large.aspect_ratio(), small.aspect_ratio(), epsilon = 1e-5);
    }

    #[test]
    fn longer_text_is_wider() {
        let settings = MeasurementSettings::default();
        let short = create_label("1 m", Vec3::ZERO, &settings);
        let long = create_label("(1.23, 5.00, -0.50) m", Vec3::ZERO, &settings);
        assert!(long.extent.x > short.extent.x);
        assert_eq!(long.extent.y, short.extent.y);
    }

    #[test]
    fn width_is_capped() {
        let settings = MeasurementSettings::default();
        let label = create_label("x".repeat(10_000), Vec3::ZERO, &settings);
        assert_eq!(label.extent.x, LABEL_MAX_WIDTH_PX);
    }

    #[test]
    fn moving_keeps_text_and_size() {
        let settings = MeasurementSettings::default();
        let label = create_label("90.0 °", Vec3::ZERO, &settings);
        let moved = label.moved_to(Vec3::ONE);
        assert_eq!(moved.anchor, Vec3::ONE);
        assert_eq!(moved.text, label.text);
        assert_eq!(moved.extent, label.extent);
    }
}
