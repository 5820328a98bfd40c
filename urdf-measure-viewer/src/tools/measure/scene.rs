use super::label::Label;
use bevy::prelude::*;
use std::collections::HashMap;

/// Handle to an object owned by a measurement session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub color: Color,
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceStyle {
    pub color: Color,
}

/// Indexed triangle mesh covering a measured area.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMesh {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub normals: Vec<Vec3>,
    pub style: FaceStyle,
}

/// Renderer-independent description of everything a session draws.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    Points {
        positions: Vec<Vec3>,
        style: PointStyle,
    },
    Polyline {
        positions: Vec<Vec3>,
        /// Draws an extra segment from the last position back to the first.
        closed: bool,
        style: LineStyle,
    },
    Faces(FaceMesh),
    Label(Label),
}

impl SceneObject {
    pub fn as_label(&self) -> Option<&Label> {
        match self {
            SceneObject::Label(label) => Some(label),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorStyle {
    #[default]
    Default,
    Crosshair,
}

/// Mutations a session performs on the scene it draws into.
pub trait MeasureScene {
    /// Adds an object, optionally as a child removed together with `parent`.
    fn add(&mut self, object: SceneObject, parent: Option<ObjectId>) -> ObjectId;
    fn replace(&mut self, id: ObjectId, object: SceneObject);
    /// Removes an object and all of its descendants. Unknown ids are ignored.
    fn remove(&mut self, id: ObjectId);
    fn contains(&self, id: ObjectId) -> bool;
    fn set_visible(&mut self, id: ObjectId, visible: bool);
    fn set_cursor(&mut self, cursor: CursorStyle);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub point: Vec3,
    pub distance: f32,
}

/// Nearest surface point under a screen position, if any.
pub trait PointPicker {
    fn pick(&mut self, cursor: Vec2) -> Option<PickHit>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Upserted(ObjectId),
    Removed(ObjectId),
    Visibility(ObjectId),
}

#[derive(Debug, Clone)]
struct SceneNode {
    object: SceneObject,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    visible: bool,
}

/// In-memory scene shared by all sessions.
///
/// Records every mutation so the render side can mirror it into entities.
#[derive(Resource, Debug, Default)]
pub struct MeasureSceneGraph {
    next_id: u64,
    nodes: HashMap<ObjectId, SceneNode>,
    changes: Vec<SceneChange>,
    cursor: CursorStyle,
    cursor_changed: bool,
}

impl MeasureSceneGraph {
    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.nodes.get(&id).map(|node| &node.object)
    }

    pub fn parent_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children_of(&self, id: ObjectId) -> &[ObjectId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_visible(&self, id: ObjectId) -> bool {
        self.nodes.get(&id).is_some_and(|node| node.visible)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = (ObjectId, &Label)> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| node.object.as_label().map(|label| (*id, label)))
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn take_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }

    /// Returns the cursor once after each change.
    pub fn take_cursor_change(&mut self) -> Option<CursorStyle> {
        std::mem::take(&mut self.cursor_changed).then_some(self.cursor)
    }

    fn collect_subtree(&self, id: ObjectId, out: &mut Vec<ObjectId>) {
        if let Some(node) = self.nodes.get(&id) {
            for child in &node.children {
                self.collect_subtree(*child, out);
            }
            out.push(id);
        }
    }
}

impl MeasureScene for MeasureSceneGraph {
    fn add(&mut self, object: SceneObject, parent: Option<ObjectId>) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let parent = match parent {
            Some(parent_id) => match self.nodes.get_mut(&parent_id) {
                Some(parent_node) => {
                    parent_node.children.push(id);
                    Some(parent_id)
                }
                None => {
                    warn!("Parent {:?} not found, adding {:?} at the root", parent_id, id);
                    None
                }
            },
            None => None,
        };

        self.nodes.insert(
            id,
            SceneNode {
                object,
                parent,
                children: Vec::new(),
                visible: true,
            },
        );
        self.changes.push(SceneChange::Upserted(id));
        id
    }

    fn replace(&mut self, id: ObjectId, object: SceneObject) {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.object = object;
                self.changes.push(SceneChange::Upserted(id));
            }
            None => warn!("Cannot replace missing scene object {:?}", id),
        }
    }

    fn remove(&mut self, id: ObjectId) {
        let mut doomed = Vec::new();
        self.collect_subtree(id, &mut doomed);
        if doomed.is_empty() {
            return;
        }

        if let Some(parent) = self.parent_of(id) {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retain(|child| *child != id);
            }
        }

        for doomed_id in doomed {
            self.nodes.remove(&doomed_id);
            self.changes.push(SceneChange::Removed(doomed_id));
        }
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn set_visible(&mut self, id: ObjectId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if node.visible != visible {
                node.visible = visible;
                self.changes.push(SceneChange::Visibility(id));
            }
        }
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        if self.cursor != cursor {
            self.cursor = cursor;
            self.cursor_changed = true;
        }
    }
}
