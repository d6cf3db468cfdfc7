//! Fitting the camera to a bounding volume.

use glam::Vec3;

use crate::camera::CameraState;
use crate::error::StageError;
use crate::math::Aabb;

/// Camera placed on +Z of `volume`'s center, far enough that the largest
/// dimension fits the vertical field of view times `margin`.
///
/// A flat or point-sized volume keeps the current camera distance. Clip planes
/// scale with the distance so close-ups and wide shots both keep depth
/// precision.
pub fn frame_camera(
    volume: &Aabb,
    camera: &CameraState,
    margin: f32,
) -> Result<CameraState, StageError> {
    if !volume.is_finite() {
        return Err(StageError::SkippedFraming);
    }

    let center = volume.center();
    let max_dim = volume.max_dimension();

    let distance = if max_dim > 0.0 {
        (max_dim / 2.0) / (camera.fov_radians() / 2.0).tan() * margin
    } else {
        camera.distance_to_target()
    };

    let mut framed = camera.clone();
    framed.position = center + Vec3::new(0.0, 0.0, distance);
    framed.target = center;
    framed.near = (distance / 100.0).max(0.01);
    framed.far = distance * 100.0;
    framed.update_projection_matrix();

    Ok(framed)
}

/// Vertical offset that moves `volume` so its top edge touches the top of the
/// visible slice at the depth of its center, minus `margin`.
///
/// Returns `None` when the volume is not finite or sits behind the camera.
pub fn align_top_to_viewport(volume: &Aabb, camera: &CameraState, margin: f32) -> Option<f32> {
    if !volume.is_finite() {
        return None;
    }

    let depth = (volume.center() - camera.position).dot(camera.direction());
    if !depth.is_finite() || depth <= 0.0 {
        return None;
    }

    let visible_height = 2.0 * depth * (camera.fov_radians() / 2.0).tan();
    let target_top = camera.position.y + visible_height / 2.0 - margin;

    Some(target_top - volume.max.y)
}
