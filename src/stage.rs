use glam::Vec3;

use crate::scene_graph::Scene;
use crate::tween::{Channel, TweenSubject, TweenTarget, TweenValue};

/// Everything tweens and the frame driver may write: the scene graph plus the
/// scale of the overlay container that frames the presentation.
pub struct Stage {
    pub scene: Scene,
    pub container_scale: f32,
}

impl Stage {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            container_scale: 1.0,
        }
    }
}

impl TweenSubject for Stage {
    fn read(&self, target: TweenTarget) -> Option<TweenValue> {
        match target {
            TweenTarget::Container => Some(TweenValue::Scalar(self.container_scale)),
            TweenTarget::Object { id, channel } => {
                let transform = self.scene.get_object_transform(id)?;
                let value = match channel {
                    Channel::Position => transform.translation(),
                    Channel::Rotation => transform.rotation(),
                    Channel::Scale => transform.scale(),
                };
                Some(TweenValue::Vec3(value))
            }
        }
    }

    fn write(&mut self, target: TweenTarget, value: TweenValue) -> bool {
        match (target, value) {
            (TweenTarget::Container, TweenValue::Scalar(scale)) => {
                self.container_scale = scale;
                true
            }
            (TweenTarget::Object { id, channel }, value) => {
                let value = match value {
                    TweenValue::Vec3(value) => value,
                    TweenValue::Scalar(uniform) => Vec3::splat(uniform),
                };

                let Some(transform) = self.scene.get_object_transform_mut(id) else {
                    return false;
                };

                match channel {
                    Channel::Position => transform.set_translation(value),
                    Channel::Rotation => transform.set_rotation(value),
                    Channel::Scale => transform.set_scale(value),
                }
                true
            }
            (TweenTarget::Container, TweenValue::Vec3(_)) => false,
        }
    }
}
