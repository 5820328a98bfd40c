//! Pure measurement math: bisectors, polygon area, included angles, arc
//! curves and number formatting. Nothing here touches the scene.

use bevy::math::{Quat, Vec3};
use constants::measure_defaults::MAX_PRECISION;

/// Splits the corner at `middle` into unit directions toward `start` and
/// `end`, plus their normalized sum.
///
/// Coincident inputs produce NaN components, which callers surface as-is.
pub fn angle_bisector(start: Vec3, middle: Vec3, end: Vec3) -> (Vec3, Vec3, Vec3) {
    let dir0 = (start - middle).normalize();
    let dir2 = (end - middle).normalize();
    let bisector = (dir0 + dir2).normalize();
    (dir0, bisector, dir2)
}

/// Area of the fan `(0, j, j + 1)` using Heron's formula per triangle.
///
/// Only exact for convex polygons.
pub fn polygon_area(points: &[Vec3]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }

    let origin = points[0];
    points[1..]
        .windows(2)
        .map(|pair| triangle_area(origin, pair[0], pair[1]))
        .sum()
}

fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let ab = a.distance(b);
    let bc = b.distance(c);
    let ca = c.distance(a);
    let s = (ab + bc + ca) * 0.5;
    // Rounding can push collinear triangles slightly negative.
    (s * (s - ab) * (s - bc) * (s - ca)).max(0.0).sqrt()
}

/// Angle between two directions in radians, within `[0, π]`.
pub fn included_angle(dir0: Vec3, dir1: Vec3) -> f32 {
    dir0.angle_between(dir1)
}

/// Samples `segments + 1` points along the arc from `dir0` to `dir2`
/// around `center`.
///
/// The arc is built flat in the XY plane, turned so +Z matches the plane
/// normal, then spun about the normal until its start lines up with `dir0`.
pub fn arc_points(dir0: Vec3, dir2: Vec3, center: Vec3, radius: f32, segments: usize) -> Vec<Vec3> {
    let normal = dir0.cross(dir2).normalize();
    let align_plane = Quat::from_rotation_arc(Vec3::Z, normal);

    let start = align_plane * Vec3::X;
    let spin = start.cross(dir0).dot(normal).atan2(start.dot(dir0));
    let align_start = Quat::from_axis_angle(normal, spin);
    let rotation = align_start * align_plane;

    let sweep = included_angle(dir0, dir2);
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = sweep * i as f32 / segments as f32;
            let local = Vec3::new(radius * t.cos(), radius * t.sin(), 0.0);
            center + rotation * local
        })
        .collect()
}

pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::ZERO;
    }
    points.iter().copied().sum::<Vec3>() / points.len() as f32
}

/// Area-weighted vertex normals for an indexed triangle list.
pub fn vertex_normals(positions: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for &[a, b, c] in triangles {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals.into_iter().map(|n| n.normalize_or_zero()).collect()
}

/// Formats a value with `precision` decimal places at unit magnitude.
///
/// Outside scientific notation the number of decimals shrinks as the
/// magnitude grows, so `1.234` keeps two decimals while `123.4` keeps none.
/// Below one, `precision` significant digits are kept. Precision is capped
/// at `MAX_PRECISION`.
pub fn format_number(value: f32, precision: u32, scientific: bool) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let precision = precision.min(MAX_PRECISION);
    if scientific {
        return format!("{:.*e}", precision as usize, value);
    }

    let magnitude = f64::from(value.abs());
    if magnitude < 1e-6 {
        return "0".to_string();
    }

    let exponent = magnitude.log10().floor() as i64;
    let precision = i64::from(precision);
    let decimals = if exponent < 0 {
        precision.max(1) - 1 - exponent
    } else {
        (precision - exponent).max(0)
    };
    format!("{:.*}", decimals as usize, value)
}
