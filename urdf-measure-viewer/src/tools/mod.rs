//! Interactive measurement tools for the robot model viewer.
//!
//! Four modes measure the loaded model: point coordinates, polyline
//! distance, polygon area and the angle at a vertex. A unified tool manager
//! keeps at most one mode active and coordinates with joint dragging, the
//! camera and the host editor.
//!
//! ## Tool Manager Architecture
//!
//! The `MeasurementToolManager` resource owns one session per mode:
//! - Only one mode can be active at a time
//! - Modes are toggled via keyboard shortcuts (native) or RPC events (WASM)
//! - Activating any mode disables joint dragging until the last one closes
//! - Deactivation removes the session's geometry and notifies the host
//!
//! ### Tool Activation Flow
//!
//! ```text
//! Keyboard/RPC Input
//!   └─> ToolSelectionEvent
//!       └─> handle_tool_selection_events()
//!           ├─> Close the active session
//!           ├─> Open the requested session
//!           └─> tool_state_changed notification to the host
//! ```
//!
//! ## Session Workflow
//!
//! 1. Clicks on the model add points; the cursor shows a live preview
//! 2. Distance completes after two points, Angle after three
//! 3. Area and Distance polylines complete on Enter or double click
//! 4. Completed labels can be dragged; the next click starts over
//! 5. Escape cancels and hands control back to joint dragging
//!
//! ## Input Routing
//!
//! - `measure_pointer_system`: left press/release, cursor motion, double
//!   click, Enter and Escape for the active session
//! - `label_drag_system`: hover and drag of finalized labels; a grabbed
//!   label captures the pointer so the release is not measured
//!
//! ## Events
//!
//! - `ToolSelectionEvent`: toggle, activate or deactivate a mode
//! - `ClearMeasurementsEvent`: remove every measurement

use bevy::prelude::*;
use bevy::transform::TransformSystem;

use crate::engine::core::app_state::AppState;
use crate::engine::scene::joint_drag::{JointDragControls, update_link_hover};
use crate::engine::scene::measure_render::{
    MeasureEntities, position_measure_labels, setup_measure_render_assets, sync_measure_scene,
};
use label_drag::{LabelDragState, PointerCapture, label_drag_system};
use measure::scene::MeasureSceneGraph;
use measure::settings::MeasurementSettings;
use measure_input::measure_pointer_system;
use tool_manager::{
    ClearMeasurementsEvent, MeasurementToolManager, ToolSelectionEvent,
    forward_measure_notifications, handle_clear_measurement_events,
    handle_tool_keyboard_shortcuts, handle_tool_selection_events,
};

/// Hover and drag of finalized measurement labels.
pub mod label_drag;

/// Engine-agnostic measurement sessions, geometry and settings.
///
/// Sessions draw through a scene trait and pick through a picker trait.
pub mod measure;

/// Mouse and keyboard routing into the active session.
pub mod measure_input;

/// Unified tool manager coordinating exclusive mode activation and state.
///
/// Handles tool selection events from keyboard shortcuts and RPC with host notifications.
pub mod tool_manager;

/// Registers the measurement resources, events and per-frame systems.
pub struct MeasureToolPlugin;

impl Plugin for MeasureToolPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MeasurementToolManager>()
            .init_resource::<MeasureSceneGraph>()
            .init_resource::<MeasurementSettings>()
            .init_resource::<MeasureEntities>()
            .init_resource::<JointDragControls>()
            .init_resource::<LabelDragState>()
            .init_resource::<PointerCapture>()
            .add_event::<ToolSelectionEvent>()
            .add_event::<ClearMeasurementsEvent>()
            .add_systems(Startup, setup_measure_render_assets)
            .add_systems(
                Update,
                (
                    handle_tool_keyboard_shortcuts,
                    handle_tool_selection_events,
                    handle_clear_measurement_events,
                    measure_pointer_system,
                    label_drag_system,
                    update_link_hover,
                    sync_measure_scene,
                    forward_measure_notifications,
                )
                    .chain()
                    .run_if(in_state(AppState::Running)),
            )
            .add_systems(
                PostUpdate,
                position_measure_labels.after(TransformSystem::TransformPropagate),
            );
    }
}
