pub mod bounds;
pub mod easing;
pub mod frustum;
pub mod plane;

pub use bounds::Aabb;
pub use easing::Easing;
pub use frustum::Frustum;
pub use plane::Plane;
