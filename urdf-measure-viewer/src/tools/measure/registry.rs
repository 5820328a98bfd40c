use super::scene::ObjectId;

/// Finalized labels the label-drag adapter may move.
#[derive(Debug, Clone, Default)]
pub struct DraggableLabelRegistry {
    labels: Vec<ObjectId>,
}

impl DraggableLabelRegistry {
    pub fn register(&mut self, id: ObjectId) {
        if !self.labels.contains(&id) {
            self.labels.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.labels.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.labels.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
