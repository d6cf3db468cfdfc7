use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::error::StageError;
use crate::math::Aabb;
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::transform::Transform;

pub struct Scene {
    pub objects: Arena<Object3D>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        // Remove from old parent's children list
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|child| child.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        // Set new parent and add to new parent's children list
        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }
    }

    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.objects.get(object_id).map(|object| &object.transform)
    }

    pub fn get_object_transform_mut(&mut self, object_id: ObjectId) -> Option<&mut Transform> {
        self.objects
            .get_mut(object_id)
            .map(|object| &mut object.transform)
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(transform) = self.get_object_transform_mut(object_id) {
            transform.set_translation(translation);
        }
    }

    pub fn set_object_rotation(&mut self, object_id: ObjectId, rotation: Vec3) {
        if let Some(transform) = self.get_object_transform_mut(object_id) {
            transform.set_rotation(rotation);
        }
    }

    /// World matrix of an object, composed from the root down.
    pub fn world_matrix(&self, object_id: ObjectId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.objects.get(object_id);

        while let Some(object) = current {
            matrix = *object.transform.get_local_matrix() * matrix;
            current = object.parent(self);
        }

        matrix
    }

    fn accumulate_bounds(&self, object_id: ObjectId, parent_world: Mat4, bounds: &mut Aabb) {
        if let Some(object) = self.objects.get(object_id) {
            let world = parent_world * *object.transform.get_local_matrix();

            if let Some(local_bounds) = &object.local_bounds {
                *bounds = bounds.union(&local_bounds.transform(&world));
            }

            for &child_id in &object.child_ids {
                self.accumulate_bounds(child_id, world, bounds);
            }
        }
    }

    /// World-space bounds of every geometry-carrying object under `roots`.
    ///
    /// Fails with [`StageError::DegenerateVolume`] when nothing contributes
    /// geometry or the result is not finite; callers skip whatever depended
    /// on the volume.
    pub fn compute_bounding_volume(&self, roots: &[ObjectId]) -> Result<Aabb, StageError> {
        let mut bounds = Aabb::EMPTY;

        for &root in roots {
            let parent_world = self
                .objects
                .get(root)
                .and_then(|object| object.parent_id)
                .map(|parent_id| self.world_matrix(parent_id))
                .unwrap_or(Mat4::IDENTITY);

            self.accumulate_bounds(root, parent_world, &mut bounds);
        }

        if bounds.is_finite() {
            Ok(bounds)
        } else {
            Err(StageError::DegenerateVolume)
        }
    }

    /// Moves an object so its visual center sits on its local origin.
    /// Returns the bounds measured before the move.
    pub fn recenter_object(&mut self, object_id: ObjectId) -> Result<Aabb, StageError> {
        if self.objects.get(object_id).is_none() {
            return Err(StageError::MissingObject);
        }

        let bounds = self.compute_bounding_volume(&[object_id])?;
        let center = bounds.center();

        if let Some(transform) = self.get_object_transform_mut(object_id) {
            transform.translate(-center);
        }

        Ok(bounds)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    #[test]
    fn test_bounds_of_empty_set_are_degenerate() {
        let scene = Scene::new();
        assert_eq!(
            scene.compute_bounding_volume(&[]),
            Err(StageError::DegenerateVolume)
        );
    }

    #[test]
    fn test_bounds_without_geometry_are_degenerate() {
        let mut scene = Scene::new();
        let group = scene.add_object(Object3D::named("Group"));
        assert_eq!(
            scene.compute_bounding_volume(&[group]),
            Err(StageError::DegenerateVolume)
        );
    }

    #[test]
    fn test_bounds_combine_extents_not_origins() {
        let mut scene = Scene::new();
        let a = scene.add_object(Object3D::named("A").with_bounds(unit_box()));
        let mut far = Object3D::named("B").with_bounds(Aabb::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0)));
        far.transform.set_translation(Vec3::new(5.0, 0.0, 0.0));
        let b = scene.add_object(far);

        let bounds = scene.compute_bounding_volume(&[a, b]).unwrap();
        assert_eq!(bounds.min, Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(bounds.max, Vec3::new(7.0, 1.0, 1.0));
    }

    #[test]
    fn test_bounds_follow_hierarchy_and_scale() {
        let mut scene = Scene::new();
        let mut group = Object3D::named("Group");
        group.transform.set_translation(Vec3::new(0.0, 10.0, 0.0));
        let group = scene.add_object(group);

        let mut child = Object3D::named("Child").with_bounds(unit_box());
        child.transform.set_scale(Vec3::splat(4.0));
        let child = scene.add_object(child);
        scene.set_object_parent(child, Some(group));

        let bounds = scene.compute_bounding_volume(&[group]).unwrap();
        assert!((bounds.center() - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-5);
        assert!((bounds.size() - Vec3::splat(4.0)).length() < 1e-5);

        // Measuring the child alone still applies the parent's offset
        let child_bounds = scene.compute_bounding_volume(&[child]).unwrap();
        assert!((child_bounds.min - bounds.min).length() < 1e-5);
        assert!((child_bounds.max - bounds.max).length() < 1e-5);
    }

    #[test]
    fn test_bounds_are_idempotent() {
        let mut scene = Scene::new();
        let mut object = Object3D::named("A").with_bounds(unit_box());
        object.transform.set_rotation(Vec3::new(0.3, 1.1, -0.4));
        let a = scene.add_object(object);

        let first = scene.compute_bounding_volume(&[a]).unwrap();
        let second = scene.compute_bounding_volume(&[a]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_recenter_moves_visual_center_to_origin() {
        let mut scene = Scene::new();
        let off_center = Aabb::new(Vec3::new(2.0, 2.0, 2.0), Vec3::new(4.0, 6.0, 2.5));
        let a = scene.add_object(Object3D::named("A").with_bounds(off_center));

        scene.recenter_object(a).unwrap();

        let translation = scene.get_object_transform(a).unwrap().translation();
        assert_eq!(translation, Vec3::new(-3.0, -4.0, -2.25));
        let bounds = scene.compute_bounding_volume(&[a]).unwrap();
        assert!(bounds.center().length() < 1e-6);
    }

    #[test]
    fn test_recenter_leaves_degenerate_object_untouched() {
        let mut scene = Scene::new();
        let mut object = Object3D::named("Empty");
        object.transform.set_translation(Vec3::new(1.0, 2.0, 3.0));
        let a = scene.add_object(object);

        assert_eq!(scene.recenter_object(a), Err(StageError::DegenerateVolume));
        let translation = scene.get_object_transform(a).unwrap().translation();
        assert_eq!(translation, Vec3::new(1.0, 2.0, 3.0));
    }
}
