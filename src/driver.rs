use std::f32::consts::TAU;

use crate::config::MotionConfig;
use crate::scene_graph::{ObjectId, Scene};
use crate::scroll::ScrollProgress;
use crate::transition::{StateMachine, TransformOwner, TransitionState};

/// Per-object mapping from scroll progress and time to a pose.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Mapping {
    /// Full X turns over the approach to the zone.
    turns: f32,
    /// Sign of the decorative Y wobble.
    wobble_sign: f32,
}

/// Writes the continuous, frame-by-frame part of the choreography.
///
/// Both objects bob with the same phase. The secondary object spins further
/// over the same scroll distance and wobbles the other way. Once progress
/// reaches 1 the rotation is no longer written and stays where it was.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    motion: MotionConfig,
}

impl FrameDriver {
    pub fn new(motion: MotionConfig) -> Self {
        Self { motion }
    }

    pub fn float_offset(&self, elapsed_ms: f64) -> f32 {
        let phase = elapsed_ms * self.motion.float_time_scale as f64 * self.motion.float_speed as f64;
        phase.sin() as f32 * self.motion.float_amplitude
    }

    pub fn wobble(&self, elapsed_ms: f64) -> f32 {
        let phase = elapsed_ms * self.motion.wobble_time_scale as f64 * self.motion.float_speed as f64;
        self.motion.wobble_degrees.to_radians() * phase.cos() as f32
    }

    pub fn drive(&self, elapsed_ms: f64, progress: &ScrollProgress, machine: &StateMachine, scene: &mut Scene) {
        // Nothing moves before the appear sequence has started
        if machine.state() == TransitionState::Idle {
            return;
        }

        let managed = [
            machine.primary().map(|id| {
                (
                    id,
                    Mapping {
                        turns: self.motion.primary_turns,
                        wobble_sign: 1.0,
                    },
                )
            }),
            machine.secondary().map(|id| {
                (
                    id,
                    Mapping {
                        turns: self.motion.secondary_turns,
                        wobble_sign: -1.0,
                    },
                )
            }),
        ];

        for (id, mapping) in managed.into_iter().flatten() {
            if machine.owner_of(id) == TransformOwner::TransitionChain {
                continue;
            }
            self.drive_object(id, mapping, elapsed_ms, progress, machine.is_floating(), scene);
        }
    }

    fn drive_object(
        &self,
        id: ObjectId,
        mapping: Mapping,
        elapsed_ms: f64,
        progress: &ScrollProgress,
        floating: bool,
        scene: &mut Scene,
    ) {
        let Some(transform) = scene.get_object_transform_mut(id) else {
            return;
        };

        if floating {
            let mut translation = transform.translation();
            translation.y = self.float_offset(elapsed_ms);
            transform.set_translation(translation);
        }

        if !progress.is_complete() {
            let mut rotation = transform.rotation();
            rotation.x = progress.normalized * TAU * mapping.turns;
            rotation.y = mapping.wobble_sign * self.wobble(elapsed_ms);
            transform.set_rotation(rotation);
        }
    }
}
