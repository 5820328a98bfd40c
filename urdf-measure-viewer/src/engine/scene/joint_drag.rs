use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::engine::camera::viewport_camera::MainCamera;
use crate::engine::loading::model_loader::ModelRoot;
use crate::engine::scene::measure_render::MeasureObject;
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::tool_manager::DragToggle;

/// Joint dragging on the robot model. The measurement tools switch it off
/// while a session is active so clicks land on measurements only.
#[derive(Resource, Debug)]
pub struct JointDragControls {
    enabled: bool,
    hovered_link: Option<String>,
}

impl Default for JointDragControls {
    fn default() -> Self {
        Self {
            enabled: true,
            hovered_link: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkHoverChange {
    Hovered(String),
    Unhovered(String),
}

impl JointDragControls {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn hovered_link(&self) -> Option<&str> {
        self.hovered_link.as_deref()
    }

    /// Tracks the link under the cursor. Returns the change to report, if any.
    pub fn hover(&mut self, link: Option<String>) -> Option<LinkHoverChange> {
        if !self.enabled || self.hovered_link == link {
            return None;
        }

        let previous = std::mem::replace(&mut self.hovered_link, link.clone());
        match link {
            Some(name) => Some(LinkHoverChange::Hovered(name)),
            None => previous.map(LinkHoverChange::Unhovered),
        }
    }
}

impl DragToggle for JointDragControls {
    fn set_drag_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!("Joint drag {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
        if !enabled {
            self.hovered_link = None;
        }
    }
}

/// Name of the closest named ancestor of `entity` inside the model.
fn link_name(
    entity: Entity,
    nodes: &Query<(Option<&Name>, Option<&ChildOf>, Has<ModelRoot>)>,
) -> Option<String> {
    let mut current = entity;
    loop {
        let (name, child_of, is_root) = nodes.get(current).ok()?;
        if is_root {
            return None;
        }
        if let Some(name) = name {
            return Some(name.as_str().to_string());
        }
        current = child_of?.parent();
    }
}

/// Reports the model link under the cursor to the host while dragging is enabled.
pub fn update_link_hover(
    mut drag_controls: ResMut<JointDragControls>,
    mut ray_cast: MeshRayCast,
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    measure_objects: Query<(), With<MeasureObject>>,
    nodes: Query<(Option<&Name>, Option<&ChildOf>, Has<ModelRoot>)>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !drag_controls.is_enabled() {
        return;
    }

    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    let link = window
        .cursor_position()
        .and_then(|cursor| camera.viewport_to_world(camera_transform, cursor).ok())
        .and_then(|ray| {
            let filter = |entity: Entity| !measure_objects.contains(entity);
            let settings = MeshRayCastSettings::default().with_filter(&filter);
            ray_cast
                .cast_ray(ray, &settings)
                .first()
                .map(|(entity, _)| *entity)
        })
        .and_then(|entity| link_name(entity, &nodes));

    match drag_controls.hover(link) {
        Some(LinkHoverChange::Hovered(name)) => {
            rpc_interface.send_notification("link_hover", serde_json::json!({ "link": name }));
        }
        Some(LinkHoverChange::Unhovered(name)) => {
            rpc_interface.send_notification("link_unhover", serde_json::json!({ "link": name }));
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_reports_transitions_only() {
        let mut controls = JointDragControls::default();

        assert_eq!(
            controls.hover(Some("forearm".into())),
            Some(LinkHoverChange::Hovered("forearm".into()))
        );
        assert_eq!(controls.hover(Some("forearm".into())), None);
        assert_eq!(
            controls.hover(None),
            Some(LinkHoverChange::Unhovered("forearm".into()))
        );
        assert_eq!(controls.hover(None), None);
    }

    #[test]
    fn disabled_controls_stay_silent() {
        let mut controls = JointDragControls::default();
        controls.hover(Some("base".into()));

        controls.set_drag_enabled(false);
        assert!(!controls.is_enabled());
        assert_eq!(controls.hovered_link(), None);
        assert_eq!(controls.hover(Some("wrist".into())), None);

        controls.set_drag_enabled(true);
        assert_eq!(
            controls.hover(Some("wrist".into())),
            Some(LinkHoverChange::Hovered("wrist".into()))
        );
    }
}
