use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::engine::camera::viewport_camera::{MainCamera, ViewportCamera};
use crate::engine::scene::measure_render::MeasureLabel;
use crate::tools::measure::scene::{MeasureScene, MeasureSceneGraph, ObjectId, SceneObject};
use crate::tools::tool_manager::MeasurementToolManager;
use constants::render_settings::{LABEL_BACKGROUND_COLOR, LABEL_HOVER_BACKGROUND_COLOR};

/// Set while a label owns the pointer, so the same press and release are
/// not also treated as a measurement click.
#[derive(Resource, Debug, Default)]
pub struct PointerCapture {
    pub captured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGrab {
    pub id: ObjectId,
    /// Cursor position relative to the label centre when grabbed.
    pub offset: Vec2,
}

#[derive(Resource, Debug, Default)]
pub struct LabelDragState {
    pub hovered: Option<ObjectId>,
    pub dragging: Option<DragGrab>,
}

/// Whether `cursor` falls inside a label of `extent` centred on `center`.
pub fn label_contains(cursor: Vec2, center: Vec2, extent: Vec2) -> bool {
    let half = extent * 0.5;
    let delta = (cursor - center).abs();
    delta.x <= half.x && delta.y <= half.y
}

/// Intersection of a ray with the plane through `anchor` facing `plane_normal`.
pub fn drag_anchor(
    ray_origin: Vec3,
    ray_direction: Vec3,
    anchor: Vec3,
    plane_normal: Vec3,
) -> Option<Vec3> {
    let denom = ray_direction.dot(plane_normal);
    if denom.abs() < 1e-6 {
        return None;
    }

    let t = (anchor - ray_origin).dot(plane_normal) / denom;
    (t >= 0.0).then(|| ray_origin + ray_direction * t)
}

/// Hover, grab, move and release of registered measurement labels.
///
/// Dragging moves a label in the camera-facing plane through its anchor and
/// suspends camera controls until the button is released.
pub fn label_drag_system(
    mut state: ResMut<LabelDragState>,
    mut capture: ResMut<PointerCapture>,
    mut viewport_camera: ResMut<ViewportCamera>,
    mut graph: ResMut<MeasureSceneGraph>,
    manager: Res<MeasurementToolManager>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut labels: Query<(&MeasureLabel, &mut BackgroundColor)>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let cursor = window.cursor_position();

    if let Some(grab) = state.dragging {
        if mouse_button.just_released(MouseButton::Left) || !graph.contains(grab.id) {
            state.dragging = None;
            capture.captured = false;
            viewport_camera.controls_enabled = true;
            debug!("Released label {:?}", grab.id);
            return;
        }

        let (Some(cursor), Ok((camera, camera_transform))) = (cursor, camera_query.single())
        else {
            return;
        };
        let Some(label) = graph.get(grab.id).and_then(SceneObject::as_label).cloned() else {
            return;
        };
        let Ok(ray) = camera.viewport_to_world(camera_transform, cursor - grab.offset) else {
            return;
        };

        if let Some(anchor) = drag_anchor(
            ray.origin,
            *ray.direction,
            label.anchor,
            *camera_transform.forward(),
        ) {
            if anchor.distance_squared(label.anchor) > f32::EPSILON {
                graph.replace(grab.id, SceneObject::Label(label.moved_to(anchor)));
            }
        }
        return;
    }

    let draggable = manager.draggable_labels();
    let hovered = cursor.and_then(|cursor| {
        labels.iter().find_map(|(label, _)| {
            let center = label.screen_center?;
            (label.visible
                && draggable.contains(&label.id)
                && label_contains(cursor, center, label.extent))
            .then_some((label.id, cursor - center))
        })
    });

    let hovered_id = hovered.map(|(id, _)| id);
    if state.hovered != hovered_id {
        state.hovered = hovered_id;
    }
    for (label, mut background) in &mut labels {
        let color = if Some(label.id) == hovered_id {
            LABEL_HOVER_BACKGROUND_COLOR
        } else {
            LABEL_BACKGROUND_COLOR
        };
        if background.0 != color {
            background.0 = color;
        }
    }

    if let Some((id, offset)) = hovered {
        if mouse_button.just_pressed(MouseButton::Left) {
            state.dragging = Some(DragGrab { id, offset });
            capture.captured = true;
            viewport_camera.controls_enabled = false;
            debug!("Grabbed label {:?}", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn label_hit_test_uses_half_extent() {
        let center = Vec2::new(100.0, 50.0);
        let extent = Vec2::new(40.0, 20.0);

        assert!(label_contains(center, center, extent));
        assert!(label_contains(Vec2::new(120.0, 60.0), center, extent));
        assert!(!label_contains(Vec2::new(121.0, 50.0), center, extent));
        assert!(!label_contains(Vec2::new(100.0, 39.0), center, extent));
    }

    #[test]
    fn drag_stays_in_the_anchor_plane() {
        let anchor = Vec3::new(0.0, 0.0, -5.0);
        let normal = Vec3::NEG_Z;
        let direction = Vec3::new(0.2, 0.1, -1.0).normalize();

        let moved = drag_anchor(Vec3::ZERO, direction, anchor, normal).unwrap();
        assert_relative_eq!(moved.z, -5.0, epsilon = 1e-5);
        assert_relative_eq!(moved.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(moved.y, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn parallel_or_backward_rays_do_not_move_the_label() {
        let anchor = Vec3::new(0.0, 0.0, -5.0);
        assert!(drag_anchor(Vec3::ZERO, Vec3::X, anchor, Vec3::NEG_Z).is_none());
        assert!(drag_anchor(Vec3::ZERO, Vec3::Z, anchor, Vec3::NEG_Z).is_none());
    }
}
