use bevy::input::mouse::MouseScrollUnit;
use bevy::render::camera::ClearColorConfig;
use bevy::render::view::RenderLayers;
use bevy::{
    input::mouse::{MouseMotion, MouseWheel},
    prelude::*,
};
use constants::render_settings::OVERLAY_RENDER_LAYER;

/// Marker for the camera the user navigates with and the picker casts from.
#[derive(Component)]
pub struct MainCamera;

/// Marker for the camera drawing measurement geometry over the model.
#[derive(Component)]
pub struct OverlayCamera;

/// Orbit state around a focus point.
#[derive(Resource, Debug, Clone)]
pub struct ViewportCamera {
    pub focus_point: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Cleared while another interaction (label drag) owns the mouse.
    pub controls_enabled: bool,
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self {
            focus_point: Vec3::ZERO,
            distance: 3.0,
            yaw: 0.6,
            pitch: -0.5,
            controls_enabled: true,
        }
    }
}

impl ViewportCamera {
    pub fn new(focus_point: Vec3, distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            focus_point,
            distance: distance.clamp(0.05, 1000.0),
            yaw,
            pitch: pitch.clamp(-1.55, 1.55),
            controls_enabled: true,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn target_transform(&self) -> Transform {
        let offset = self.rotation() * Vec3::new(0.0, 0.0, self.distance);
        Transform::from_translation(self.focus_point + offset)
            .looking_at(self.focus_point, Vec3::Y)
    }
}

/// Spawns the main camera with the overlay camera as a child so both share
/// one transform.
pub fn spawn_cameras(mut commands: Commands, viewport_camera: Res<ViewportCamera>) {
    commands
        .spawn((
            Camera3d::default(),
            viewport_camera.target_transform(),
            MainCamera,
        ))
        .with_children(|parent| {
            parent.spawn((
                Camera3d::default(),
                Camera {
                    order: 1,
                    clear_color: ClearColorConfig::None,
                    ..default()
                },
                RenderLayers::layer(OVERLAY_RENDER_LAYER),
                OverlayCamera,
            ));
        });
}

pub fn camera_controller(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut viewport_camera: ResMut<ViewportCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }

    if viewport_camera.controls_enabled {
        // Right drag orbits.
        if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
            viewport_camera.yaw -= mouse_delta.x * 0.0035;
            viewport_camera.pitch -= mouse_delta.y * 0.0030;
            viewport_camera.pitch = viewport_camera.pitch.clamp(-1.55, 1.55);
        }

        if scroll_accum.abs() > f32::EPSILON {
            let zoom = 0.9_f32.powf(scroll_accum);
            viewport_camera.distance = (viewport_camera.distance * zoom).clamp(0.05, 1000.0);
        }

        let mut move_input = Vec3::ZERO;
        if keyboard.pressed(KeyCode::KeyW) {
            move_input.z -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyS) {
            move_input.z += 1.0;
        }
        if keyboard.pressed(KeyCode::KeyD) {
            move_input.x += 1.0;
        }
        if keyboard.pressed(KeyCode::KeyA) {
            move_input.x -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyE) {
            move_input.y += 1.0;
        }
        if keyboard.pressed(KeyCode::KeyQ) {
            move_input.y -= 1.0;
        }

        if move_input != Vec3::ZERO {
            let yaw_rot = Quat::from_rotation_y(viewport_camera.yaw);
            let world_delta = yaw_rot * Vec3::new(move_input.x, 0.0, move_input.z)
                + Vec3::Y * move_input.y;

            let mut speed = viewport_camera.distance.clamp(0.2, 50.0);
            if keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) {
                speed *= 3.5;
            }
            if keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]) {
                speed *= 0.25;
            }
            viewport_camera.focus_point += world_delta.normalize() * speed * time.delta_secs();
        }
    }

    let target = viewport_camera.target_transform();
    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    camera_transform.translation = camera_transform.translation.lerp(target.translation, lerp_speed);
    camera_transform.rotation = camera_transform.rotation.slerp(target.rotation, lerp_speed);
}
