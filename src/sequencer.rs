//! Ordered chains of tween steps.
//!
//! A [`Sequence`] starts its next step only after every tween of the current
//! step has reported completion, so a chain like "spin, then shrink the
//! object, then shrink the container" is a flat list instead of nested
//! callbacks, and its progress can be inspected at any point.

use std::collections::VecDeque;

use itertools::Itertools;

use crate::math::Easing;
use crate::scene_graph::ObjectId;
use crate::tween::{Animator, TweenId, TweenRequest, TweenSubject, TweenTarget, TweenValue};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Goal {
    To(TweenValue),
    /// Relative to the value read when the step starts.
    By(TweenValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepTween {
    pub target: TweenTarget,
    pub goal: Goal,
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub easing: Easing,
}

impl StepTween {
    pub fn to(target: TweenTarget, value: TweenValue, duration_ms: f64, easing: Easing) -> Self {
        Self {
            target,
            goal: Goal::To(value),
            duration_ms,
            delay_ms: 0.0,
            easing,
        }
    }

    pub fn by(target: TweenTarget, delta: TweenValue, duration_ms: f64, easing: Easing) -> Self {
        Self {
            target,
            goal: Goal::By(delta),
            duration_ms,
            delay_ms: 0.0,
            easing,
        }
    }

    pub fn delayed(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    fn resolve(&self, subject: &dyn TweenSubject) -> Option<TweenRequest> {
        let to = match self.goal {
            Goal::To(value) => value,
            Goal::By(delta) => subject.read(self.target)?.offset_by(delta),
        };

        Some(TweenRequest::new(self.target, to, self.duration_ms, self.easing).delayed(self.delay_ms))
    }
}

/// Tweens that run together; the step ends when all of them have completed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStep {
    pub label: &'static str,
    pub tweens: Vec<StepTween>,
}

impl ChainStep {
    pub fn new(label: &'static str, tweens: Vec<StepTween>) -> Self {
        Self { label, tweens }
    }

    pub fn single(label: &'static str, tween: StepTween) -> Self {
        Self::new(label, vec![tween])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceProgress {
    /// The id does not belong to the running step.
    Unrelated,
    /// Other tweens of the current step are still running.
    Waiting,
    /// The next step was started.
    Advanced,
    Finished,
}

#[derive(Debug)]
pub struct Sequence {
    name: &'static str,
    steps: VecDeque<ChainStep>,
    objects: Vec<ObjectId>,
    current: Option<&'static str>,
    pending: Vec<TweenId>,
    finished: bool,
}

impl Sequence {
    pub fn new(name: &'static str, steps: Vec<ChainStep>) -> Self {
        let objects = steps
            .iter()
            .flat_map(|step| step.tweens.iter())
            .filter_map(|tween| tween.target.object_id())
            .unique()
            .collect();

        Self {
            name,
            steps: steps.into(),
            objects,
            current: None,
            pending: Vec::new(),
            finished: false,
        }
    }

    /// Objects any step of the chain writes to.
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    pub fn current_step(&self) -> Option<&'static str> {
        self.current
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Tweens of the running step that have not reported completion.
    pub fn pending_tweens(&self) -> &[TweenId] {
        &self.pending
    }

    pub fn start(&mut self, animator: &mut dyn Animator, subject: &dyn TweenSubject) {
        if self.current.is_none() && !self.finished {
            self.launch_next(animator, subject);
        }
    }

    pub fn on_tween_complete(
        &mut self,
        id: TweenId,
        animator: &mut dyn Animator,
        subject: &dyn TweenSubject,
    ) -> SequenceProgress {
        let Some(index) = self.pending.iter().position(|pending| *pending == id) else {
            return SequenceProgress::Unrelated;
        };

        self.pending.swap_remove(index);
        if !self.pending.is_empty() {
            return SequenceProgress::Waiting;
        }

        self.launch_next(animator, subject);
        if self.finished {
            SequenceProgress::Finished
        } else {
            SequenceProgress::Advanced
        }
    }

    fn launch_next(&mut self, animator: &mut dyn Animator, subject: &dyn TweenSubject) {
        while let Some(step) = self.steps.pop_front() {
            for tween in &step.tweens {
                match tween.resolve(subject) {
                    Some(request) => self.pending.push(animator.animate(request)),
                    None => log::debug!(
                        "{}: {:?} in step '{}' has no target, skipped",
                        self.name,
                        tween.target,
                        step.label
                    ),
                }
            }

            if !self.pending.is_empty() {
                log::debug!("{}: step '{}' started", self.name, step.label);
                self.current = Some(step.label);
                return;
            }
        }

        self.current = None;
        self.finished = true;
    }
}
