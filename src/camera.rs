use glam::{Mat4, Vec3};

use crate::config::CameraConfig;
use crate::math::Frustum;

/// Perspective camera with an explicitly refreshed projection.
///
/// Field writes do not touch `projection`; call
/// [`update_projection_matrix`](Self::update_projection_matrix) after changing
/// fov, aspect or the clip planes.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    projection: Mat4,
}

impl CameraState {
    pub fn new(config: &CameraConfig, width: f32, height: f32) -> Self {
        let aspect = if width > 0.0 && height > 0.0 {
            width / height
        } else {
            1.0
        };

        let mut camera = Self {
            position: config.position,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: config.fov_degrees,
            near: config.near,
            far: config.far,
            aspect,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }

    pub fn distance_to_target(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh_gl(self.fov_radians(), self.aspect, self.near, self.far);
    }

    /// Keeps the aspect in sync with the viewport. Zero or non-finite sizes are
    /// ignored so a collapsed window does not poison the projection.
    pub fn set_viewport(&mut self, width: f32, height: f32) -> bool {
        let aspect = width / height;
        if !(width > 0.0 && height > 0.0 && aspect.is_finite()) {
            log::debug!("Ignoring viewport resize to {width}x{height}");
            return false;
        }

        self.aspect = aspect;
        self.update_projection_matrix();
        true
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(self.view_projection())
    }

    /// Unit vector the camera looks along.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

/// An orbit-style controller that must follow the framed center.
pub trait OrbitTarget {
    fn sync_target(&mut self, target: Vec3);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_follows_viewport() {
        let mut camera = CameraState::new(&CameraConfig::default(), 800.0, 600.0);
        assert!((camera.aspect - 4.0 / 3.0).abs() < 1e-6);

        let before = camera.projection_matrix();
        assert!(camera.set_viewport(1000.0, 500.0));
        assert_eq!(camera.aspect, 2.0);
        assert_ne!(camera.projection_matrix(), before);
    }

    #[test]
    fn test_degenerate_viewport_is_ignored() {
        let mut camera = CameraState::new(&CameraConfig::default(), 800.0, 600.0);
        let aspect = camera.aspect;
        assert!(!camera.set_viewport(800.0, 0.0));
        assert!(!camera.set_viewport(f32::NAN, 600.0));
        assert_eq!(camera.aspect, aspect);
    }

    #[test]
    fn test_projection_refreshes_only_on_request() {
        let mut camera = CameraState::new(&CameraConfig::default(), 800.0, 600.0);
        let before = camera.projection_matrix();
        camera.near = 2.0;
        assert_eq!(camera.projection_matrix(), before);
        camera.update_projection_matrix();
        assert_ne!(camera.projection_matrix(), before);
    }
}
