//! JSON-RPC 2.0 communication layer for the embedding editor.
//!
//! Implements bidirectional messaging between the Bevy viewer and the host
//! webview via iframe postMessage, supporting both request-response and
//! notification patterns.
//!
//! ## Message Flow
//!
//! ```text
//! Host (Parent Window)   <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Process request
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        │ <────────── Notification (no ID) ─────┤
//! ```
//!
//! Requests without an ID are executed but never answered.
//!
//! ## Requests
//!
//! ### Measurement
//! - `measure_tool {mode, active?}`: toggle, activate or deactivate a mode
//!   (`coordinates`, `distance`, `area`, `angle`)
//! - `clear_measurements`: remove every measurement
//! - `update_settings {..}`: apply a partial settings update; rejected as a
//!   whole when any value is invalid
//! - `get_settings`: current measurement settings
//!
//! ### Model
//! - `load_model {path}`: replace the model, clearing all measurements
//!
//! ### Diagnostics
//! - `get_fps`: retrieve current frame rate
//!
//! ## Notifications
//!
//! - `measure_notification {kind, mode}`: session lifecycle and hover events
//! - `tool_state_changed {tool, active}`: a mode was switched on or off
//! - `link_hover {link}` / `link_unhover {link}`: model link under the cursor
//! - `fps_update {fps}`: periodic frame rate
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error

/// JSON-RPC 2.0 bidirectional communication system for host integration.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
