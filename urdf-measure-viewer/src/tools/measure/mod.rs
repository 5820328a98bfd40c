//! Engine-agnostic measurement core.
//!
//! Sessions talk to the world through two seams: [`scene::MeasureScene`] for
//! everything they draw and [`scene::PointPicker`] for surface hits. The Bevy
//! side implements both; tests drive them with in-memory stand-ins.

pub mod buffer;
pub mod geometry;
pub mod label;
pub mod registry;
pub mod scene;
pub mod session;
pub mod settings;

pub use scene::{MeasureScene, MeasureSceneGraph, ObjectId, PickHit, PointPicker, SceneObject};
pub use session::{
    MeasureContext, MeasureKey, MeasureMode, MeasureNotification, MeasurementSession,
    SessionLimits, SessionState,
};
pub use settings::{MeasurementSettings, SettingsPatch};
