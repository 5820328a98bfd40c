/// Viewer configuration, relative to the asset root.
pub const VIEWER_CONFIG_PATH: &str = "viewer_config.json";

/// Model shown when the configuration names none.
pub const DEFAULT_MODEL_PATH: &str = "models/robot.glb";
