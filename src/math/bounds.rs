use glam::{Mat4, Vec3};

use crate::math::frustum::Frustum;

/// Axis-aligned box. An empty box has inverted infinite extrema, which is what
/// makes its center non-finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn new(point1: Vec3, point2: Vec3) -> Aabb {
        let min = point1.min(point2);
        let max = point1.max(point2);
        Aabb { min, max }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Aabb {
        let half = size.abs() * 0.5;
        Aabb {
            min: center - half,
            max: center + half,
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Aabb {
        points
            .into_iter()
            .fold(Aabb::EMPTY, |bounds, point| bounds.expand_to(point))
    }

    pub fn expand_to(&self, point: Vec3) -> Aabb {
        Aabb {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// True when both extrema and therefore the center are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Bounds of this box after an affine transform, re-fitted around all
    /// eight transformed corners.
    pub fn transform(&self, matrix: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }

        Aabb::from_points(
            self.corners()
                .map(|corner| matrix.transform_point3(corner)),
        )
    }

    pub fn inside_frustum(&self, frustum: &Frustum, tolerance: f32) -> bool {
        self.corners()
            .iter()
            .all(|corner| frustum.contains_point(*corner, tolerance))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}
