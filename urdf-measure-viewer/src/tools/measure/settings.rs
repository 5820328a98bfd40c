use super::geometry::format_number;
use super::scene::{FaceStyle, LineStyle, PointStyle};
use bevy::prelude::*;
use constants::measure_defaults::*;
use serde::{Deserialize, Serialize};

/// Unit used to display lengths and areas. Raw values are always meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Meter,
    Centimeter,
    Millimeter,
}

impl LengthUnit {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "meter" | "meters" | "m" => Some(Self::Meter),
            "centimeter" | "centimeters" | "cm" => Some(Self::Centimeter),
            "millimeter" | "millimeters" | "mm" => Some(Self::Millimeter),
            _ => None,
        }
    }

    /// Factor converting a value in meters to this unit.
    pub fn multiplier(self) -> f32 {
        match self {
            Self::Meter => 1.0,
            Self::Centimeter => 100.0,
            Self::Millimeter => 1000.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::Centimeter => "cm",
            Self::Millimeter => "mm",
        }
    }

    pub fn area_symbol(self) -> &'static str {
        match self {
            Self::Meter => "m²",
            Self::Centimeter => "cm²",
            Self::Millimeter => "mm²",
        }
    }
}

/// Unit used to display angles. Raw values are always radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Degree,
    Radian,
}

impl AngleUnit {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "degree" | "degrees" | "deg" => Some(Self::Degree),
            "radian" | "radians" | "rad" => Some(Self::Radian),
            _ => None,
        }
    }

    pub fn from_radians(self, radians: f32) -> f32 {
        match self {
            Self::Degree => radians.to_degrees(),
            Self::Radian => radians,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Degree => "°",
            Self::Radian => "rad",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSettings {
    pub color: String,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSettings {
    pub color: String,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSettings {
    pub color: String,
}

/// Errors raised when a settings value is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    InvalidColor(String),
    InvalidPrecision(u32),
    InvalidLabelSize(f32),
    InvalidLineWidth(f32),
    InvalidPointSize(f32),
    UnknownLengthUnit(String),
    UnknownAngleUnit(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::InvalidColor(c) => write!(f, "Invalid colour '{}', expected #rrggbb", c),
            SettingsError::InvalidPrecision(p) => {
                write!(f, "Precision {} exceeds the maximum of {}", p, MAX_PRECISION)
            }
            SettingsError::InvalidLabelSize(s) => write!(
                f,
                "Label size {} outside [{}, {}]",
                s, MIN_LABEL_SIZE, MAX_LABEL_SIZE
            ),
            SettingsError::InvalidLineWidth(w) => write!(f, "Line width must be positive, got {}", w),
            SettingsError::InvalidPointSize(s) => write!(f, "Point size must be positive, got {}", s),
            SettingsError::UnknownLengthUnit(u) => write!(f, "Unknown length unit '{}'", u),
            SettingsError::UnknownAngleUnit(u) => write!(f, "Unknown angle unit '{}'", u),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Units, number formatting and styling shared by every measurement session.
///
/// Passed by reference into sessions and the label factory. Setters only
/// affect geometry created afterwards: sessions snapshot styles on open and
/// labels bake their size and text at creation.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementSettings {
    length_unit: LengthUnit,
    angle_unit: AngleUnit,
    precision: u32,
    scientific: bool,
    label_size: f32,
    line: LineSettings,
    point: PointSettings,
    face: FaceSettings,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            length_unit: LengthUnit::Meter,
            angle_unit: AngleUnit::Degree,
            precision: DEFAULT_PRECISION,
            scientific: false,
            label_size: DEFAULT_LABEL_SIZE,
            line: LineSettings {
                color: DEFAULT_LINE_COLOR.to_string(),
                width: DEFAULT_LINE_WIDTH,
            },
            point: PointSettings {
                color: DEFAULT_POINT_COLOR.to_string(),
                size: DEFAULT_POINT_SIZE,
            },
            face: FaceSettings {
                color: DEFAULT_FACE_COLOR.to_string(),
            },
        }
    }
}

fn parse_color(hex: &str) -> Result<Color, SettingsError> {
    Srgba::hex(hex)
        .map(Color::from)
        .map_err(|_| SettingsError::InvalidColor(hex.to_string()))
}

/// Resolves a stored colour, falling back to a default when a config file
/// slipped an invalid value past validation.
fn resolve_color(hex: &str, fallback: &str) -> Color {
    parse_color(hex).unwrap_or_else(|e| {
        warn!("{}; using {}", e, fallback);
        parse_color(fallback).unwrap_or(Color::WHITE)
    })
}

impl MeasurementSettings {
    pub fn length_unit(&self) -> LengthUnit {
        self.length_unit
    }

    pub fn angle_unit(&self) -> AngleUnit {
        self.angle_unit
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn scientific(&self) -> bool {
        self.scientific
    }

    pub fn label_size(&self) -> f32 {
        self.label_size
    }

    pub fn line(&self) -> &LineSettings {
        &self.line
    }

    pub fn point(&self) -> &PointSettings {
        &self.point
    }

    pub fn face(&self) -> &FaceSettings {
        &self.face
    }

    pub fn set_length_unit(&mut self, unit: LengthUnit) {
        self.length_unit = unit;
    }

    pub fn set_angle_unit(&mut self, unit: AngleUnit) {
        self.angle_unit = unit;
    }

    pub fn set_precision(&mut self, precision: u32) -> Result<(), SettingsError> {
        if precision > MAX_PRECISION {
            return Err(SettingsError::InvalidPrecision(precision));
        }
        self.precision = precision;
        Ok(())
    }

    pub fn set_scientific(&mut self, scientific: bool) {
        self.scientific = scientific;
    }

    pub fn set_label_size(&mut self, size: f32) -> Result<(), SettingsError> {
        if !(MIN_LABEL_SIZE..=MAX_LABEL_SIZE).contains(&size) {
            return Err(SettingsError::InvalidLabelSize(size));
        }
        self.label_size = size;
        Ok(())
    }

    pub fn set_line_color(&mut self, color: &str) -> Result<(), SettingsError> {
        parse_color(color)?;
        self.line.color = color.to_string();
        Ok(())
    }

    pub fn set_line_width(&mut self, width: f32) -> Result<(), SettingsError> {
        if !(width.is_finite() && width > 0.0) {
            return Err(SettingsError::InvalidLineWidth(width));
        }
        self.line.width = width;
        Ok(())
    }

    pub fn set_point_color(&mut self, color: &str) -> Result<(), SettingsError> {
        parse_color(color)?;
        self.point.color = color.to_string();
        Ok(())
    }

    pub fn set_point_size(&mut self, size: f32) -> Result<(), SettingsError> {
        if !(size.is_finite() && size > 0.0) {
            return Err(SettingsError::InvalidPointSize(size));
        }
        self.point.size = size;
        Ok(())
    }

    pub fn set_face_color(&mut self, color: &str) -> Result<(), SettingsError> {
        parse_color(color)?;
        self.face.color = color.to_string();
        Ok(())
    }

    /// Checks values that bypassed the setters, e.g. a deserialized config file.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut checked = Self::default();
        checked.set_precision(self.precision)?;
        checked.set_label_size(self.label_size)?;
        checked.set_line_color(&self.line.color)?;
        checked.set_line_width(self.line.width)?;
        checked.set_point_color(&self.point.color)?;
        checked.set_point_size(self.point.size)?;
        checked.set_face_color(&self.face.color)?;
        Ok(())
    }

    pub fn line_style(&self) -> LineStyle {
        LineStyle {
            color: resolve_color(&self.line.color, DEFAULT_LINE_COLOR),
            width: self.line.width,
        }
    }

    pub fn point_style(&self) -> PointStyle {
        PointStyle {
            color: resolve_color(&self.point.color, DEFAULT_POINT_COLOR),
            size: self.point.size,
        }
    }

    pub fn face_style(&self) -> FaceStyle {
        FaceStyle {
            color: resolve_color(&self.face.color, DEFAULT_FACE_COLOR),
        }
    }

    pub fn format_number(&self, value: f32) -> String {
        format_number(value, self.precision, self.scientific)
    }

    pub fn format_length(&self, meters: f32) -> String {
        let value = meters * self.length_unit.multiplier();
        format!("{} {}", self.format_number(value), self.length_unit.symbol())
    }

    pub fn format_area(&self, square_meters: f32) -> String {
        let multiplier = self.length_unit.multiplier();
        let value = square_meters * multiplier * multiplier;
        format!("{} {}", self.format_number(value), self.length_unit.area_symbol())
    }

    pub fn format_angle(&self, radians: f32) -> String {
        let value = self.angle_unit.from_radians(radians);
        format!("{} {}", self.format_number(value), self.angle_unit.symbol())
    }

    /// Formats a world position as `(x, y, z) unit`.
    pub fn format_coordinates(&self, point: Vec3) -> String {
        let multiplier = self.length_unit.multiplier();
        format!(
            "({}, {}, {}) {}",
            self.format_number(point.x * multiplier),
            self.format_number(point.y * multiplier),
            self.format_number(point.z * multiplier),
            self.length_unit.symbol()
        )
    }
}

/// Partial settings update sent by the host's settings panel.
///
/// Field names follow the panel's camelCase keys; the older panel names
/// are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    pub length_unit: Option<String>,
    pub angle_unit: Option<String>,
    pub precision: Option<u32>,
    #[serde(alias = "useSciNotation")]
    pub scientific: Option<bool>,
    pub label_size: Option<f32>,
    pub line_color: Option<String>,
    #[serde(alias = "lineThickness")]
    pub line_width: Option<f32>,
    pub point_color: Option<String>,
    pub point_size: Option<f32>,
    #[serde(alias = "meshColor")]
    pub face_color: Option<String>,
}

impl SettingsPatch {
    /// Applies every present field, or none of them if any is invalid.
    pub fn apply(&self, settings: &mut MeasurementSettings) -> Result<(), SettingsError> {
        let mut next = settings.clone();

        if let Some(unit) = &self.length_unit {
            let parsed = LengthUnit::from_string(unit)
                .ok_or_else(|| SettingsError::UnknownLengthUnit(unit.clone()))?;
            next.set_length_unit(parsed);
        }
        if let Some(unit) = &self.angle_unit {
            let parsed = AngleUnit::from_string(unit)
                .ok_or_else(|| SettingsError::UnknownAngleUnit(unit.clone()))?;
            next.set_angle_unit(parsed);
        }
        if let Some(precision) = self.precision {
            next.set_precision(precision)?;
        }
        if let Some(scientific) = self.scientific {
            next.set_scientific(scientific);
        }
        if let Some(size) = self.label_size {
            next.set_label_size(size)?;
        }
        if let Some(color) = &self.line_color {
            next.set_line_color(color)?;
        }
        if let Some(width) = self.line_width {
            next.set_line_width(width)?;
        }
        if let Some(color) = &self.point_color {
            next.set_point_color(color)?;
        }
        if let Some(size) = self.point_size {
            next.set_point_size(size)?;
        }
        if let Some(color) = &self.face_color {
            next.set_face_color(color)?;
        }

        *settings = next;
        Ok(())
    }
}
