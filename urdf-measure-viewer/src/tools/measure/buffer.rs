use bevy::math::Vec3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasureError {
    CapacityExceeded { capacity: usize },
}

impl std::fmt::Display for MeasureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureError::CapacityExceeded { capacity } => {
                write!(f, "Point capacity of {} reached, point dropped", capacity)
            }
        }
    }
}

impl std::error::Error for MeasureError {}

/// Fixed-capacity, append-only storage for picked points.
///
/// Storage is reserved up front; `len` is the visible count.
#[derive(Debug, Clone)]
pub struct PointBuffer {
    points: Vec<Vec3>,
    capacity: usize,
}

impl PointBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a point and returns the new count, or rejects it when full.
    pub fn push(&mut self, point: Vec3) -> Result<usize, MeasureError> {
        if self.is_full() {
            return Err(MeasureError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.points.push(point);
        Ok(self.points.len())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.points.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn first(&self) -> Option<Vec3> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Vec3> {
        self.points.last().copied()
    }

    pub fn as_slice(&self) -> &[Vec3] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_points_past_capacity() {
        let mut buffer = PointBuffer::new(2);
        assert_eq!(buffer.push(Vec3::X), Ok(1));
        assert_eq!(buffer.push(Vec3::Y), Ok(2));
        assert_eq!(
            buffer.push(Vec3::Z),
            Err(MeasureError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(buffer.as_slice(), &[Vec3::X, Vec3::Y]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buffer = PointBuffer::new(3);
        buffer.push(Vec3::ONE).unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 3);
        assert_eq!(buffer.first(), None);
    }
}
