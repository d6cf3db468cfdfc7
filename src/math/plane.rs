use glam::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Plane through three points, normal following the a->b->c winding.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Plane {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Plane {
            normal,
            distance: -normal.dot(a),
        }
    }

    pub fn signed_distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    pub fn flip(self) -> Plane {
        Plane {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Flips the plane if needed so that `inside` lies on its positive side.
    pub fn facing(self, inside: Vec3) -> Plane {
        if self.signed_distance_to_point(inside) < 0.0 {
            self.flip()
        } else {
            self
        }
    }
}
