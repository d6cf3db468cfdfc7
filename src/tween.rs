//! One-shot property tweens.
//!
//! [`Animator`] is the seam the transition logic talks to; [`Tweener`] is the
//! built-in implementation, advanced once per frame against a
//! [`TweenSubject`].

use glam::Vec3;

use crate::math::Easing;
use crate::scene_graph::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Position,
    Rotation,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenTarget {
    Object { id: ObjectId, channel: Channel },
    /// Uniform scale of the presentation container overlay.
    Container,
}

impl TweenTarget {
    pub fn object(id: ObjectId, channel: Channel) -> Self {
        TweenTarget::Object { id, channel }
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            TweenTarget::Object { id, .. } => Some(*id),
            TweenTarget::Container => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenValue {
    Vec3(Vec3),
    Scalar(f32),
}

impl TweenValue {
    pub fn lerp(self, to: TweenValue, t: f32) -> TweenValue {
        match (self, to) {
            (TweenValue::Vec3(from), TweenValue::Vec3(to)) => TweenValue::Vec3(from.lerp(to, t)),
            (TweenValue::Scalar(from), TweenValue::Scalar(to)) => {
                TweenValue::Scalar(from + (to - from) * t)
            }
            // Object channels read back as vectors; scalars apply uniformly
            (TweenValue::Vec3(from), TweenValue::Scalar(to)) => {
                TweenValue::Vec3(from.lerp(Vec3::splat(to), t))
            }
            (TweenValue::Scalar(from), TweenValue::Vec3(to)) => {
                TweenValue::Vec3(Vec3::splat(from).lerp(to, t))
            }
        }
    }

    pub fn offset_by(self, delta: TweenValue) -> TweenValue {
        match (self, delta) {
            (TweenValue::Vec3(value), TweenValue::Vec3(delta)) => TweenValue::Vec3(value + delta),
            (TweenValue::Scalar(value), TweenValue::Scalar(delta)) => {
                TweenValue::Scalar(value + delta)
            }
            (value, _) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TweenRequest {
    pub target: TweenTarget,
    pub to: TweenValue,
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub easing: Easing,
}

impl TweenRequest {
    pub fn new(target: TweenTarget, to: TweenValue, duration_ms: f64, easing: Easing) -> Self {
        Self {
            target,
            to,
            duration_ms,
            delay_ms: 0.0,
            easing,
        }
    }

    pub fn delayed(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// Anything tweens can read from and write to.
pub trait TweenSubject {
    fn read(&self, target: TweenTarget) -> Option<TweenValue>;
    /// Returns false when the target does not exist.
    fn write(&mut self, target: TweenTarget, value: TweenValue) -> bool;
}

/// Schedules tweens and reports their completion by id.
pub trait Animator {
    fn animate(&mut self, request: TweenRequest) -> TweenId;

    /// Stops a tween where it is, without reporting it as completed.
    /// Returns false if it already finished or was never started.
    fn cancel(&mut self, id: TweenId) -> bool;

    /// Non-animated snap.
    fn set(&mut self, subject: &mut dyn TweenSubject, target: TweenTarget, value: TweenValue) {
        if !subject.write(target, value) {
            log::debug!("Snap to {target:?} skipped, target missing");
        }
    }
}

#[derive(Debug)]
struct ActiveTween {
    id: TweenId,
    request: TweenRequest,
    start_ms: f64,
    from: Option<TweenValue>,
}

/// Frame-stepped tween runner.
///
/// Tweens start at the last advanced time plus their delay and capture their
/// start value on the first frame they run. Several tweens may drive the same
/// field; they are applied in start order so the newest wins.
#[derive(Debug, Default)]
pub struct Tweener {
    active: Vec<ActiveTween>,
    next_id: u64,
    clock_ms: f64,
}

impl Tweener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// True while a running or delayed tween targets `target`.
    pub fn is_animating(&self, target: TweenTarget) -> bool {
        self.active.iter().any(|tween| tween.request.target == target)
    }

    /// Steps every running tween to `now_ms` and returns the ids that finished,
    /// in start order.
    pub fn advance(&mut self, now_ms: f64, subject: &mut dyn TweenSubject) -> Vec<TweenId> {
        self.clock_ms = self.clock_ms.max(now_ms);
        let mut completed = Vec::new();

        for tween in &mut self.active {
            if now_ms < tween.start_ms {
                continue;
            }

            let from = match tween.from {
                Some(from) => from,
                None => match subject.read(tween.request.target) {
                    Some(from) => *tween.from.insert(from),
                    None => {
                        log::debug!(
                            "Tween {:?} dropped, {:?} is missing",
                            tween.id,
                            tween.request.target
                        );
                        completed.push(tween.id);
                        continue;
                    }
                },
            };

            let t = if tween.request.duration_ms > 0.0 {
                ((now_ms - tween.start_ms) / tween.request.duration_ms) as f32
            } else {
                1.0
            };

            let eased = tween.request.easing.evaluate(t);
            subject.write(tween.request.target, from.lerp(tween.request.to, eased));

            if t >= 1.0 {
                completed.push(tween.id);
            }
        }

        self.active.retain(|tween| !completed.contains(&tween.id));
        completed
    }
}

impl Animator for Tweener {
    fn animate(&mut self, request: TweenRequest) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;

        let start_ms = self.clock_ms + request.delay_ms.max(0.0);
        self.active.push(ActiveTween {
            id,
            request,
            start_ms,
            from: None,
        });

        id
    }

    fn cancel(&mut self, id: TweenId) -> bool {
        let before = self.active.len();
        self.active.retain(|tween| tween.id != id);
        self.active.len() != before
    }
}
