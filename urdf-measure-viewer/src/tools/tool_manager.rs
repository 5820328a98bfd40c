use crate::engine::loading::model_loader::ModelReloadedEvent;
use crate::engine::scene::joint_drag::JointDragControls;
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::measure::scene::{MeasureScene, MeasureSceneGraph, ObjectId};
use crate::tools::measure::session::{
    MeasureContext, MeasureKey, MeasureMode, MeasureNotification, MeasurementSession,
    SessionLimits, SessionState,
};
use crate::tools::measure::settings::MeasurementSettings;
use bevy::prelude::*;
use std::time::Duration;

/// Anything that lets the user drag the model around and must step aside
/// while measuring.
pub trait DragToggle {
    fn set_drag_enabled(&mut self, enabled: bool);
}

/// Session notification tagged with its mode. `mode` is `None` for
/// manager-wide events such as clearing everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolNotification {
    pub mode: Option<MeasureMode>,
    pub kind: MeasureNotification,
}

/// Owns one session per measurement mode and keeps at most one active.
#[derive(Resource)]
pub struct MeasurementToolManager {
    sessions: [MeasurementSession; 4],
    active: Option<MeasureMode>,
    /// Whether this manager currently holds the drag controller disabled.
    drag_suspended: bool,
    notifications: Vec<ToolNotification>,
    state_changes: Vec<(MeasureMode, bool)>,
}

impl Default for MeasurementToolManager {
    fn default() -> Self {
        Self::new(SessionLimits::default())
    }
}

impl MeasurementToolManager {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            sessions: MeasureMode::ALL.map(|mode| MeasurementSession::new(mode, limits)),
            active: None,
            drag_suspended: false,
            notifications: Vec::new(),
            state_changes: Vec::new(),
        }
    }

    pub fn session(&self, mode: MeasureMode) -> &MeasurementSession {
        &self.sessions[mode.index()]
    }

    fn session_mut(&mut self, mode: MeasureMode) -> &mut MeasurementSession {
        &mut self.sessions[mode.index()]
    }

    pub fn active_mode(&self) -> Option<MeasureMode> {
        self.active
    }

    pub fn is_active(&self, mode: MeasureMode) -> bool {
        self.active == Some(mode)
    }

    /// Opens `mode`, closing whichever mode was active before.
    pub fn activate(
        &mut self,
        mode: MeasureMode,
        scene: &mut dyn MeasureScene,
        settings: &MeasurementSettings,
        drag: &mut dyn DragToggle,
    ) -> bool {
        if self.active == Some(mode) {
            return false;
        }

        if let Some(previous) = self.active.take() {
            self.session_mut(previous).close(scene);
            self.collect(previous);
            self.state_changes.push((previous, false));
        }

        self.session_mut(mode).open(scene, settings);
        self.collect(mode);
        self.active = Some(mode);
        self.state_changes.push((mode, true));

        if !self.drag_suspended {
            drag.set_drag_enabled(false);
            self.drag_suspended = true;
        }

        info!("Measure tool activated: {}", mode);
        true
    }

    pub fn deactivate(
        &mut self,
        mode: MeasureMode,
        scene: &mut dyn MeasureScene,
        drag: &mut dyn DragToggle,
    ) -> bool {
        if self.active != Some(mode) {
            return false;
        }

        self.session_mut(mode).close(scene);
        self.collect(mode);
        self.active = None;
        self.state_changes.push((mode, false));
        self.release_drag(drag);

        info!("Measure tool deactivated: {}", mode);
        true
    }

    /// Button semantics: switches `mode` on if it is off and off if it is on.
    /// Returns whether `mode` ends up active.
    pub fn toggle(
        &mut self,
        mode: MeasureMode,
        scene: &mut dyn MeasureScene,
        settings: &MeasurementSettings,
        drag: &mut dyn DragToggle,
    ) -> bool {
        if self.is_active(mode) {
            self.deactivate(mode, scene, drag);
            false
        } else {
            self.activate(mode, scene, settings, drag);
            true
        }
    }

    /// Tears down every mode. Used when a new model replaces the scene.
    pub fn clear_all(&mut self, scene: &mut dyn MeasureScene, drag: &mut dyn DragToggle) {
        for mode in MeasureMode::ALL {
            self.deactivate(mode, scene, drag);
        }
        self.release_drag(drag);
        self.notifications.push(ToolNotification {
            mode: None,
            kind: MeasureNotification::Closed,
        });
        info!("All measurements cleared");
    }

    fn release_drag(&mut self, drag: &mut dyn DragToggle) {
        if self.drag_suspended {
            drag.set_drag_enabled(true);
            self.drag_suspended = false;
        }
    }

    fn collect(&mut self, mode: MeasureMode) {
        let kinds = self.session_mut(mode).take_notifications();
        self.notifications.extend(kinds.into_iter().map(|kind| ToolNotification {
            mode: Some(mode),
            kind,
        }));
    }

    fn active_session(&mut self) -> Option<(MeasureMode, &mut MeasurementSession)> {
        let mode = self.active?;
        Some((mode, self.session_mut(mode)))
    }

    pub fn pointer_down(&mut self, cursor: Vec2) {
        if let Some((_, session)) = self.active_session() {
            session.pointer_down(cursor);
        }
    }

    pub fn pointer_move(&mut self, cursor: Vec2, ctx: &mut MeasureContext) {
        if let Some((mode, session)) = self.active_session() {
            session.pointer_move(cursor, ctx);
            self.collect(mode);
        }
    }

    pub fn pointer_up(&mut self, cursor: Vec2, now: Duration, ctx: &mut MeasureContext) {
        if let Some((mode, session)) = self.active_session() {
            session.pointer_up(cursor, now, ctx);
            self.collect(mode);
        }
    }

    pub fn double_click(&mut self, ctx: &mut MeasureContext) {
        if let Some((mode, session)) = self.active_session() {
            session.double_click(ctx);
            self.collect(mode);
        }
    }

    /// Forwards a key to the active session. A cancelled session leaves the
    /// manager with no active mode and hands dragging back.
    pub fn key_down(&mut self, key: MeasureKey, ctx: &mut MeasureContext, drag: &mut dyn DragToggle) {
        let Some((mode, session)) = self.active_session() else {
            return;
        };
        session.key_down(key, ctx);
        let cancelled = session.state() == SessionState::Idle;
        self.collect(mode);

        if cancelled {
            self.active = None;
            self.state_changes.push((mode, false));
            self.release_drag(drag);
            info!("Measure tool cancelled: {}", mode);
        }
    }

    /// Finalized labels of the active session that may be dragged.
    pub fn draggable_labels(&self) -> Vec<ObjectId> {
        self.active
            .map(|mode| self.session(mode).registry().iter().collect())
            .unwrap_or_default()
    }

    pub fn take_notifications(&mut self) -> Vec<ToolNotification> {
        std::mem::take(&mut self.notifications)
    }

    /// `(mode, active)` pairs for every activation change since the last call.
    pub fn take_state_changes(&mut self) -> Vec<(MeasureMode, bool)> {
        std::mem::take(&mut self.state_changes)
    }
}

/// Event fired when a measure mode is toggled via RPC or keyboard shortcuts.
#[derive(Event, Debug, Clone, Copy)]
pub struct ToolSelectionEvent {
    pub mode: MeasureMode,
    pub action: ToolAction,
    pub source: ToolSelectionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    Toggle,
    Activate,
    Deactivate,
}

/// Source of tool selection for debugging and conditional logic.
#[derive(Debug, Clone, Copy)]
pub enum ToolSelectionSource {
    Rpc,
    Keyboard,
}

/// Removes every measurement, e.g. from the host's clear button.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ClearMeasurementsEvent;

pub fn handle_tool_selection_events(
    mut events: EventReader<ToolSelectionEvent>,
    mut manager: ResMut<MeasurementToolManager>,
    mut graph: ResMut<MeasureSceneGraph>,
    settings: Res<MeasurementSettings>,
    mut drag_controls: ResMut<JointDragControls>,
) {
    for event in events.read() {
        let scene = graph.as_mut();
        let drag = drag_controls.as_mut();
        let changed = match event.action {
            ToolAction::Toggle => {
                manager.toggle(event.mode, scene, &settings, drag);
                true
            }
            ToolAction::Activate => manager.activate(event.mode, scene, &settings, drag),
            ToolAction::Deactivate => manager.deactivate(event.mode, scene, drag),
        };

        if changed {
            debug!("{:?} {} via {:?}", event.action, event.mode, event.source);
        }
    }
}

/// Clears all measurements on request or when a new model is loaded.
pub fn handle_clear_measurement_events(
    mut clear_events: EventReader<ClearMeasurementsEvent>,
    mut reload_events: EventReader<ModelReloadedEvent>,
    mut manager: ResMut<MeasurementToolManager>,
    mut graph: ResMut<MeasureSceneGraph>,
    mut drag_controls: ResMut<JointDragControls>,
) {
    let requested = clear_events.read().count() > 0;
    let reloaded = reload_events.read().count() > 0;
    if requested || reloaded {
        manager.clear_all(graph.as_mut(), drag_controls.as_mut());
    }
}

/// Relays queued session notifications and activation changes to the host.
pub fn forward_measure_notifications(
    mut manager: ResMut<MeasurementToolManager>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for notification in manager.take_notifications() {
        rpc_interface.send_notification(
            "measure_notification",
            serde_json::json!({
                "kind": notification.kind,
                "mode": notification.mode.map(MeasureMode::as_str),
            }),
        );
    }

    for (mode, active) in manager.take_state_changes() {
        rpc_interface.send_notification(
            "tool_state_changed",
            serde_json::json!({
                "tool": mode.as_str(),
                "active": active,
            }),
        );
    }
}

/// Digit keys 1 to 4 toggle coordinates, distance, area and angle (native builds only).
#[cfg(not(target_arch = "wasm32"))]
pub fn handle_tool_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut tool_events: EventWriter<ToolSelectionEvent>,
) {
    let shortcuts = [
        (KeyCode::Digit1, MeasureMode::Coordinates),
        (KeyCode::Digit2, MeasureMode::Distance),
        (KeyCode::Digit3, MeasureMode::Area),
        (KeyCode::Digit4, MeasureMode::Angle),
    ];

    for (key, mode) in shortcuts {
        if keyboard.just_pressed(key) {
            tool_events.write(ToolSelectionEvent {
                mode,
                action: ToolAction::Toggle,
                source: ToolSelectionSource::Keyboard,
            });
        }
    }
}

/// WASM builds are driven by the host over RPC only.
#[cfg(target_arch = "wasm32")]
pub fn handle_tool_keyboard_shortcuts() {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::measure::session::tests::ScriptedPicker;

    #[derive(Debug)]
    struct CountingDrag {
        enabled: bool,
        disables: usize,
        enables: usize,
    }

    impl Default for CountingDrag {
        fn default() -> Self {
            Self {
                enabled: true,
                disables: 0,
                enables: 0,
            }
        }
    }

    impl DragToggle for CountingDrag {
        fn set_drag_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
            if enabled {
                self.enables += 1;
            } else {
                self.disables += 1;
            }
        }
    }

    struct Fixture {
        manager: MeasurementToolManager,
        scene: MeasureSceneGraph,
        picker: ScriptedPicker,
        settings: MeasurementSettings,
        drag: CountingDrag,
        now: Duration,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                manager: MeasurementToolManager::default(),
                scene: MeasureSceneGraph::default(),
                picker: ScriptedPicker::default(),
                settings: MeasurementSettings::default(),
                drag: CountingDrag::default(),
                now: Duration::from_secs(1),
            }
        }

        fn activate(&mut self, mode: MeasureMode) -> bool {
            self.manager
                .activate(mode, &mut self.scene, &self.settings, &mut self.drag)
        }

        fn click(&mut self, point: Vec3) {
            self.picker.hit = Some(point);
            self.now += Duration::from_secs(1);
            let mut ctx = MeasureContext {
                scene: &mut self.scene,
                picker: &mut self.picker,
                settings: &self.settings,
            };
            self.manager.pointer_down(Vec2::ZERO);
            self.manager.pointer_up(Vec2::ZERO, self.now, &mut ctx);
        }

        fn key(&mut self, key: MeasureKey) {
            let mut ctx = MeasureContext {
                scene: &mut self.scene,
                picker: &mut self.picker,
                settings: &self.settings,
            };
            self.manager.key_down(key, &mut ctx, &mut self.drag);
        }
    }

    #[test]
    fn switching_modes_closes_the_previous_session() {
        let mut f = Fixture::new();
        f.activate(MeasureMode::Distance);
        f.click(Vec3::ZERO);
        assert_eq!(f.manager.session(MeasureMode::Distance).points().len(), 1);

        f.activate(MeasureMode::Area);

        assert_eq!(f.manager.active_mode(), Some(MeasureMode::Area));
        assert_eq!(
            f.manager.session(MeasureMode::Distance).state(),
            SessionState::Idle
        );
        // Area's marker, polyline and face mesh are all that remain.
        assert_eq!(f.scene.len(), 3);
        assert_eq!(f.drag.disables, 1);
        assert!(!f.drag.enabled);
    }

    #[test]
    fn activating_the_active_mode_is_a_no_op() {
        let mut f = Fixture::new();
        assert!(f.activate(MeasureMode::Angle));
        assert!(!f.activate(MeasureMode::Angle));
        assert_eq!(f.drag.disables, 1);
        assert_eq!(f.manager.take_state_changes(), vec![(MeasureMode::Angle, true)]);
    }

    #[test]
    fn deactivate_restores_dragging() {
        let mut f = Fixture::new();
        assert!(!f
            .manager
            .deactivate(MeasureMode::Area, &mut f.scene, &mut f.drag));
        assert_eq!(f.drag.enables, 0);

        f.activate(MeasureMode::Area);
        assert!(f
            .manager
            .deactivate(MeasureMode::Area, &mut f.scene, &mut f.drag));

        assert!(f.drag.enabled);
        assert_eq!(f.drag.enables, 1);
        assert!(f.scene.is_empty());
        assert_eq!(f.manager.active_mode(), None);
    }

    #[test]
    fn toggle_flips_a_mode() {
        let mut f = Fixture::new();
        assert!(f.manager.toggle(
            MeasureMode::Coordinates,
            &mut f.scene,
            &f.settings,
            &mut f.drag
        ));
        assert!(!f.manager.toggle(
            MeasureMode::Coordinates,
            &mut f.scene,
            &f.settings,
            &mut f.drag
        ));
        assert!(f.drag.enabled);
    }

    #[test]
    fn clear_all_tears_everything_down() {
        let mut f = Fixture::new();
        f.activate(MeasureMode::Distance);
        f.click(Vec3::ZERO);
        f.click(Vec3::X);
        assert_eq!(f.manager.draggable_labels().len(), 1);
        f.manager.take_notifications();

        f.manager.clear_all(&mut f.scene, &mut f.drag);

        assert!(f.scene.is_empty());
        assert_eq!(f.manager.active_mode(), None);
        assert!(f.drag.enabled);
        assert!(f.manager.draggable_labels().is_empty());
        assert_eq!(
            f.manager.take_notifications(),
            vec![
                ToolNotification {
                    mode: Some(MeasureMode::Distance),
                    kind: MeasureNotification::Closed,
                },
                ToolNotification {
                    mode: None,
                    kind: MeasureNotification::Closed,
                },
            ]
        );
    }

    #[test]
    fn escape_deactivates_the_mode() {
        let mut f = Fixture::new();
        f.activate(MeasureMode::Distance);
        f.manager.take_notifications();

        f.key(MeasureKey::Escape);

        assert_eq!(f.manager.active_mode(), None);
        assert!(f.drag.enabled);
        assert!(f.scene.is_empty());
        assert_eq!(
            f.manager.take_state_changes(),
            vec![(MeasureMode::Distance, true), (MeasureMode::Distance, false)]
        );
        let kinds: Vec<_> = f
            .manager
            .take_notifications()
            .into_iter()
            .map(|n| n.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![MeasureNotification::Cancelled, MeasureNotification::Closed]
        );
    }

    #[test]
    fn enter_keeps_the_mode_active() {
        let mut f = Fixture::new();
        f.activate(MeasureMode::Area);
        for point in [Vec3::ZERO, Vec3::X, Vec3::Z] {
            f.click(point);
        }

        f.key(MeasureKey::Enter);

        assert_eq!(f.manager.active_mode(), Some(MeasureMode::Area));
        assert_eq!(
            f.manager.session(MeasureMode::Area).state(),
            SessionState::Completed
        );
        assert!(!f.drag.enabled);
    }

    #[test]
    fn input_without_active_mode_is_dropped() {
        let mut f = Fixture::new();
        f.click(Vec3::ONE);
        f.key(MeasureKey::Escape);
        assert!(f.scene.is_empty());
        assert!(f.manager.take_notifications().is_empty());
    }
}
