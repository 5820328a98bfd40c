//! Scene-side adapters for the measurement tools.
//!
//! Bridges the engine-agnostic measurement core to Bevy: mesh ray casting
//! for surface picks, entity mirroring of the measurement scene graph, and
//! the joint-drag collaborator the tools suspend while measuring.

/// Joint drag controls and link hover reporting.
///
/// Disabled by the tool manager while a measurement session is active.
pub mod joint_drag;

/// Entity mirroring of measurement geometry and label projection.
///
/// Points, polylines and faces render on the overlay layer; labels are UI text nodes.
pub mod measure_render;

/// Mesh ray-cast surface picker.
pub mod picking;
