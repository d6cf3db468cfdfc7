use glam::{EulerRot, Mat4, Quat, Vec3};
use std::cell::{Cell, Ref, RefCell};

/// Local transform of a scene object.
///
/// Rotation is stored as Euler angles in radians, applied in XYZ order, so
/// scroll-coupled code can drive a single axis directly.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Vec3,
    scale: Vec3,

    local_matrix: RefCell<Mat4>,
    local_dirty: Cell<bool>,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            local_matrix: RefCell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(true),
        }
    }

    pub fn get_local_matrix(&self) -> Ref<Mat4> {
        if self.local_dirty.get() {
            let rotation = Quat::from_euler(
                EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            );
            let matrix = Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation);

            self.local_matrix.replace(matrix);
            self.local_dirty.set(false);
        }

        self.local_matrix.borrow()
    }

    fn invalidate_local(&self) {
        self.local_dirty.set(true);
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate_local();
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.invalidate_local();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.invalidate_local();
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.translation += delta;
        self.invalidate_local();
    }

    pub fn set_transform(&mut self, translation: Vec3, rotation: Vec3, scale: Vec3) {
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
        self.invalidate_local();
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}
