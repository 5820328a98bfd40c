use crate::tools::measure::scene::{PickHit, PointPicker};
use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings};
use bevy::prelude::*;

/// Surface picker backed by Bevy's mesh ray cast.
///
/// Casts from `camera` through the cursor and returns the nearest hit on any
/// mesh not rejected by `excluded`. Measurement geometry is excluded so the
/// user always picks the model itself.
pub struct MeshPointPicker<'a, 'w, 's> {
    pub ray_cast: &'a mut MeshRayCast<'w, 's>,
    pub camera: &'a Camera,
    pub camera_transform: &'a GlobalTransform,
    pub excluded: &'a dyn Fn(Entity) -> bool,
    pub max_distance: f32,
}

impl PointPicker for MeshPointPicker<'_, '_, '_> {
    fn pick(&mut self, cursor: Vec2) -> Option<PickHit> {
        let ray = self
            .camera
            .viewport_to_world(self.camera_transform, cursor)
            .ok()?;

        let excluded = self.excluded;
        let filter = |entity: Entity| !excluded(entity);
        let settings = MeshRayCastSettings::default().with_filter(&filter);

        let hits = self.ray_cast.cast_ray(ray, &settings);
        nearest_within(
            hits.iter().map(|(_, hit)| (hit.point, hit.distance)),
            self.max_distance,
        )
    }
}

/// Nearest `(point, distance)` no farther than `max_distance`.
pub fn nearest_within(
    hits: impl Iterator<Item = (Vec3, f32)>,
    max_distance: f32,
) -> Option<PickHit> {
    hits.filter(|(_, distance)| distance.is_finite() && *distance <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(point, distance)| PickHit { point, distance })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_hit_wins() {
        let hits = vec![
            (Vec3::new(0.0, 0.0, -4.0), 4.0),
            (Vec3::new(0.0, 0.0, -2.0), 2.0),
            (Vec3::new(0.0, 0.0, -3.0), 3.0),
        ];
        let hit = nearest_within(hits.into_iter(), 500.0).unwrap();
        assert_eq!(hit.point, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(hit.distance, 2.0);
    }

    #[test]
    fn far_hits_are_ignored() {
        let hits = vec![(Vec3::new(0.0, 0.0, -600.0), 600.0)];
        assert!(nearest_within(hits.into_iter(), 500.0).is_none());
    }

    #[test]
    fn empty_cast_picks_nothing() {
        assert!(nearest_within(std::iter::empty(), 500.0).is_none());
    }
}
