use glam::Vec3;
use id_arena::Id;

use crate::math::Aabb;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    /// Geometry extents in the object's local space, if it carries any.
    pub local_bounds: Option<Aabb>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.local_bounds = Some(bounds);
        self
    }

    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a Object3D> {
        self.parent_id.and_then(|id| scene.get_object(id))
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::from_translation(Vec3::ZERO),
            local_bounds: None,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
