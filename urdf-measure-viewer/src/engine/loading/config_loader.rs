use bevy::asset::LoadState;
use bevy::prelude::*;
use serde::Deserialize;

use crate::engine::camera::viewport_camera::ViewportCamera;
use crate::engine::core::app_state::AppState;
use crate::engine::loading::model_loader::LoadModelEvent;
use crate::tools::measure::settings::MeasurementSettings;
use constants::paths::{DEFAULT_MODEL_PATH, VIEWER_CONFIG_PATH};

/// Initial camera framing.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub focus: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        let camera = ViewportCamera::default();
        Self {
            distance: camera.distance,
            yaw: camera.yaw,
            pitch: camera.pitch,
            focus: camera.focus_point.to_array(),
        }
    }
}

/// Startup configuration read from `viewer_config.json`.
#[derive(Asset, TypePath, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ViewerConfig {
    pub model_path: Option<String>,
    pub measure: MeasurementSettings,
    pub camera: CameraConfig,
}

impl ViewerConfig {
    pub fn model_path(&self) -> &str {
        self.model_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL_PATH)
    }

    /// Configured settings, or the defaults when any value is invalid.
    pub fn settings_or_default(&self) -> MeasurementSettings {
        match self.measure.validate() {
            Ok(()) => self.measure.clone(),
            Err(e) => {
                warn!("Invalid measurement settings in config ({}); using defaults", e);
                MeasurementSettings::default()
            }
        }
    }

    pub fn viewport_camera(&self) -> ViewportCamera {
        ViewportCamera::new(
            Vec3::from_array(self.camera.focus),
            self.camera.distance,
            self.camera.yaw,
            self.camera.pitch,
        )
    }
}

#[derive(Resource, Default)]
pub struct ConfigLoader {
    handle: Option<Handle<ViewerConfig>>,
}

// Start the loading process
pub fn start_loading(mut config_loader: ResMut<ConfigLoader>, asset_server: Res<AssetServer>) {
    config_loader.handle = Some(asset_server.load(VIEWER_CONFIG_PATH));
}

/// Applies the configuration once loaded, then requests the model and
/// enters the running state. A missing or broken file falls back to defaults.
pub fn apply_viewer_config(
    mut commands: Commands,
    config_loader: Res<ConfigLoader>,
    configs: Res<Assets<ViewerConfig>>,
    asset_server: Res<AssetServer>,
    mut model_events: EventWriter<LoadModelEvent>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(handle) = config_loader.handle.as_ref() else {
        return;
    };

    let config = match configs.get(handle) {
        Some(config) => config.clone(),
        None => match asset_server.load_state(handle.id()) {
            LoadState::Failed(e) => {
                warn!("Failed to load {}: {}; using defaults", VIEWER_CONFIG_PATH, e);
                ViewerConfig::default()
            }
            _ => return,
        },
    };

    commands.insert_resource(config.settings_or_default());
    commands.insert_resource(config.viewport_camera());
    model_events.write(LoadModelEvent {
        path: config.model_path().to_string(),
    });

    info!("Viewer configuration applied");
    next_state.set(AppState::Running);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::measure::settings::LengthUnit;
    use approx::assert_relative_eq;

    #[test]
    fn full_config_parses() {
        let config: ViewerConfig = serde_json::from_str(
            r##"{
                "model_path": "robots/arm.glb",
                "measure": { "length_unit": "millimeter", "precision": 3 },
                "camera": { "distance": 2.0, "yaw": 0.0, "pitch": 0.0, "focus": [0.0, 0.5, 0.0] }
            }"##,
        )
        .unwrap();

        assert_eq!(config.model_path(), "robots/arm.glb");
        let settings = config.settings_or_default();
        assert_eq!(settings.length_unit(), LengthUnit::Millimeter);
        assert_eq!(settings.precision(), 3);

        let camera = config.viewport_camera();
        assert_relative_eq!(camera.distance, 2.0);
        assert_eq!(camera.focus_point, Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: ViewerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.model_path(), DEFAULT_MODEL_PATH);
        assert_eq!(config.settings_or_default(), MeasurementSettings::default());
        assert_relative_eq!(
            config.viewport_camera().distance,
            ViewportCamera::default().distance
        );
    }

    #[test]
    fn invalid_settings_fall_back_to_defaults() {
        let config: ViewerConfig = serde_json::from_str(
            r##"{ "measure": { "precision": 4, "line": { "color": "not-a-colour", "width": 1.0 } } }"##,
        )
        .unwrap();
        assert_eq!(config.settings_or_default(), MeasurementSettings::default());
    }
}
