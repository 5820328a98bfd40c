use bevy::picking::mesh_picking::ray_cast::MeshRayCast;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use std::time::Duration;

use crate::engine::camera::viewport_camera::MainCamera;
use crate::engine::scene::joint_drag::JointDragControls;
use crate::engine::scene::measure_render::MeasureObject;
use crate::engine::scene::picking::MeshPointPicker;
use crate::tools::label_drag::PointerCapture;
use crate::tools::measure::scene::MeasureSceneGraph;
use crate::tools::measure::session::{MeasureContext, MeasureKey};
use crate::tools::measure::settings::MeasurementSettings;
use crate::tools::tool_manager::MeasurementToolManager;
use constants::interaction::{DOUBLE_CLICK_WINDOW_MS, MAX_PICK_DISTANCE};

/// Turns pointer releases into double clicks.
#[derive(Debug, Clone, Copy)]
pub struct DoubleClickTracker {
    window: Duration,
    last_release: Option<Duration>,
}

impl Default for DoubleClickTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(DOUBLE_CLICK_WINDOW_MS))
    }
}

impl DoubleClickTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_release: None,
        }
    }

    /// Records a release at `now`; true when it completes a double click.
    pub fn register(&mut self, now: Duration) -> bool {
        match self.last_release.take() {
            Some(previous) if now.saturating_sub(previous) <= self.window => true,
            _ => {
                self.last_release = Some(now);
                false
            }
        }
    }
}

/// Routes mouse and keyboard input to the active measurement session.
pub fn measure_pointer_system(
    mut manager: ResMut<MeasurementToolManager>,
    mut graph: ResMut<MeasureSceneGraph>,
    settings: Res<MeasurementSettings>,
    mut drag_controls: ResMut<JointDragControls>,
    capture: Res<PointerCapture>,
    mut ray_cast: MeshRayCast,
    mut double_clicks: Local<DoubleClickTracker>,
    mut last_cursor: Local<Option<Vec2>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time<Real>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    measure_objects: Query<(), With<MeasureObject>>,
) {
    if manager.active_mode().is_none() {
        *last_cursor = None;
        return;
    }

    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    let excluded = |entity: Entity| measure_objects.contains(entity);
    let mut picker = MeshPointPicker {
        ray_cast: &mut ray_cast,
        camera,
        camera_transform,
        excluded: &excluded,
        max_distance: MAX_PICK_DISTANCE,
    };
    let mut ctx = MeasureContext {
        scene: &mut *graph,
        picker: &mut picker,
        settings: &settings,
    };
    let now = time.elapsed();

    if let Some(cursor) = window.cursor_position() {
        if *last_cursor != Some(cursor) {
            *last_cursor = Some(cursor);
            manager.pointer_move(cursor, &mut ctx);
        }

        if !capture.captured {
            if mouse_button.just_pressed(MouseButton::Left) {
                manager.pointer_down(cursor);
            }
            if mouse_button.just_released(MouseButton::Left) {
                manager.pointer_up(cursor, now, &mut ctx);
                if double_clicks.register(now) {
                    manager.double_click(&mut ctx);
                }
            }
        }
    }

    if keyboard.any_just_pressed([KeyCode::Enter, KeyCode::NumpadEnter]) {
        manager.key_down(MeasureKey::Enter, &mut ctx, drag_controls.as_mut());
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        manager.key_down(MeasureKey::Escape, &mut ctx, drag_controls.as_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_quick_releases_make_a_double_click() {
        let mut tracker = DoubleClickTracker::new(Duration::from_millis(400));
        assert!(!tracker.register(Duration::from_millis(1000)));
        assert!(tracker.register(Duration::from_millis(1300)));
    }

    #[test]
    fn slow_releases_stay_single() {
        let mut tracker = DoubleClickTracker::new(Duration::from_millis(400));
        assert!(!tracker.register(Duration::from_millis(1000)));
        assert!(!tracker.register(Duration::from_millis(1500)));
        assert!(tracker.register(Duration::from_millis(1700)));
    }

    #[test]
    fn a_third_release_starts_over() {
        let mut tracker = DoubleClickTracker::default();
        assert!(!tracker.register(Duration::from_millis(0)));
        assert!(tracker.register(Duration::from_millis(100)));
        assert!(!tracker.register(Duration::from_millis(200)));
    }
}
