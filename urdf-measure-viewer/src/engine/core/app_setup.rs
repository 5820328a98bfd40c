use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

use crate::engine::camera::viewport_camera::{ViewportCamera, camera_controller, spawn_cameras};
use crate::engine::core::app_state::AppState;
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::config_loader::{
    ConfigLoader, ViewerConfig, apply_viewer_config, start_loading,
};
use crate::engine::loading::model_loader::{
    LoadModelEvent, ModelReloadedEvent, load_model_on_event,
};
use crate::engine::systems::fps_tracking::fps_notification_system;
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::MeasureToolPlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::{core::app_state::FpsText, systems::fps_tracking::fps_text_update_system};

pub fn create_app() -> App {
    let mut app = App::new();

    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    app.add_plugins(DefaultPlugins.set(window_config).set(asset_config))
        .init_state::<AppState>()
        .add_plugins(JsonAssetPlugin::<ViewerConfig>::new(&["json"]))
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_event::<LoadModelEvent>()
        .add_event::<ModelReloadedEvent>()
        .add_plugins(MeasureToolPlugin)
        .add_plugins(WebRpcPlugin);

    app.init_resource::<ConfigLoader>()
        .init_resource::<ViewportCamera>()
        .insert_resource(ClearColor(Color::srgb(0.16, 0.17, 0.19)))
        .add_systems(Startup, (start_loading, spawn_lighting))
        .add_systems(
            Update,
            apply_viewer_config.run_if(in_state(AppState::Loading)),
        )
        .add_systems(OnEnter(AppState::Running), spawn_cameras)
        .add_systems(
            Update,
            (
                load_model_on_event,
                camera_controller,
                fps_notification_system,
            )
                .run_if(in_state(AppState::Running)),
        );

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(Startup, spawn_fps_overlay).add_systems(
            Update,
            fps_text_update_system.run_if(in_state(AppState::Running)),
        );
    }

    app
}

fn spawn_lighting(mut commands: Commands) {
    commands.insert_resource(AmbientLight {
        brightness: 400.0,
        ..default()
    });
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_fps_overlay(mut commands: Commands) {
    commands.spawn((
        Text::new("FPS: "),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgb(1., 0., 0.)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            right: Val::Px(12.0),
            ..default()
        },
        FpsText,
    ));
}
