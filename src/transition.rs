//! Discrete presentation states and the one-shot chains they launch.
//!
//! The machine decides which writer owns an object's transform at any
//! instant. While a chain owns an object the frame driver leaves it alone;
//! see [`StateMachine::owner_of`].

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec3;

use crate::config::{IntroStyle, TransitionConfig};
use crate::error::StageError;
use crate::scene_graph::ObjectId;
use crate::sequencer::{ChainStep, Sequence, SequenceProgress, StepTween};
use crate::stage::Stage;
use crate::tween::{Animator, Channel, TweenId, TweenRequest, TweenSubject, TweenTarget, TweenValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    /// Waiting for the primary asset.
    Idle,
    /// Appear sequence running.
    Entering,
    /// Driven by scroll and time.
    Floating,
    /// Scan chain running after entering the pinned zone.
    ScanTriggered,
    /// Scan chain done; object hidden until the zone is left backwards.
    ScanComplete,
    /// Restoring scale after leaving the zone backwards.
    Returning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOwner {
    FrameDriver,
    TransitionChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Appear,
    Scan,
    Return,
}

#[derive(Debug)]
struct ActiveChain {
    kind: ChainKind,
    sequence: Sequence,
    /// Objects this chain took from the frame driver.
    claims: Vec<ObjectId>,
}

pub struct StateMachine {
    config: TransitionConfig,
    state: TransitionState,
    primary: Option<ObjectId>,
    secondary: Option<ObjectId>,
    owners: HashMap<ObjectId, TransformOwner>,
    floating: bool,
    chain: Option<ActiveChain>,
    cue_due_ms: Option<f64>,
    clock_ms: f64,
    scans_started: usize,
}

impl StateMachine {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            state: TransitionState::Idle,
            primary: None,
            secondary: None,
            owners: HashMap::new(),
            floating: true,
            chain: None,
            cue_due_ms: None,
            clock_ms: 0.0,
            scans_started: 0,
        }
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn primary(&self) -> Option<ObjectId> {
        self.primary
    }

    pub fn secondary(&self) -> Option<ObjectId> {
        self.secondary
    }

    pub fn bind_primary(&mut self, id: ObjectId) {
        self.primary = Some(id);
    }

    pub fn bind_secondary(&mut self, id: ObjectId) {
        self.secondary = Some(id);
    }

    /// Who may write `id`'s transform right now.
    pub fn owner_of(&self, id: ObjectId) -> TransformOwner {
        self.owners
            .get(&id)
            .copied()
            .unwrap_or(TransformOwner::FrameDriver)
    }

    /// Whether the floating oscillation is enabled.
    pub fn is_floating(&self) -> bool {
        self.floating
    }

    pub fn active_chain(&self) -> Option<(ChainKind, &Sequence)> {
        self.chain
            .as_ref()
            .map(|chain| (chain.kind, &chain.sequence))
    }

    /// Number of scan chains started over the session.
    pub fn scans_started(&self) -> usize {
        self.scans_started
    }

    pub fn set_clock(&mut self, now_ms: f64) {
        self.clock_ms = now_ms;
    }

    /// True once when the delayed scan cue is due.
    pub fn poll_cue(&mut self, now_ms: f64) -> bool {
        match self.cue_due_ms {
            Some(due) if now_ms >= due => {
                self.cue_due_ms = None;
                true
            }
            _ => false,
        }
    }

    fn enter(&mut self, state: TransitionState) {
        if self.state != state {
            log::info!("Transition {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn claim(&mut self, objects: &[ObjectId]) {
        for &id in objects {
            self.owners.insert(id, TransformOwner::TransitionChain);
        }
    }

    fn release(&mut self, objects: &[ObjectId]) {
        for id in objects {
            self.owners.remove(id);
        }
    }

    fn release_all(&mut self) {
        self.owners.clear();
    }

    /// Drops the running chain and stops its in-flight tweens, so nothing it
    /// started keeps writing once ownership moves on.
    fn abandon_chain(&mut self, animator: &mut dyn Animator) {
        let Some(chain) = self.chain.take() else {
            return;
        };
        if !chain.sequence.is_finished() {
            log::debug!(
                "Abandoning {:?} chain at step {:?} with {} step(s) left",
                chain.kind,
                chain.sequence.current_step(),
                chain.sequence.remaining_steps()
            );
        }
        for &id in chain.sequence.pending_tweens() {
            animator.cancel(id);
        }
        if chain.kind == ChainKind::Appear {
            self.release(&chain.claims);
        }
    }

    fn launch(
        &mut self,
        kind: ChainKind,
        mut sequence: Sequence,
        claims: Vec<ObjectId>,
        animator: &mut dyn Animator,
        stage: &Stage,
    ) {
        self.claim(&claims);
        sequence.start(animator, stage);
        let finished = sequence.is_finished();
        self.chain = Some(ActiveChain {
            kind,
            sequence,
            claims,
        });
        if finished {
            self.finish_chain();
        }
    }

    /// `Idle -> Entering`: scale the container (and optionally the objects) in.
    pub fn begin_appear(&mut self, animator: &mut dyn Animator, stage: &mut Stage) -> Result<(), StageError> {
        if self.state != TransitionState::Idle {
            log::debug!("Appear requested in {:?}, ignored", self.state);
            return Ok(());
        }
        let primary = self.primary.ok_or(StageError::MissingObject)?;

        let config = &self.config;
        let mut tweens = vec![StepTween::to(
            TweenTarget::Container,
            TweenValue::Scalar(1.0),
            config.appear_ms,
            config.appear_easing,
        )];
        animator.set(stage, TweenTarget::Container, TweenValue::Scalar(0.0));

        let objects: Vec<ObjectId> = std::iter::once(primary).chain(self.secondary).collect();

        if config.scale_object_on_appear {
            for &id in &objects {
                let scale = TweenTarget::object(id, Channel::Scale);
                animator.set(stage, scale, TweenValue::Scalar(0.0));
                tweens.push(StepTween::to(
                    scale,
                    TweenValue::Scalar(1.0),
                    config.appear_ms,
                    config.appear_easing,
                ));
            }
        }

        if let IntroStyle::Converge {
            start_offset,
            start_tilt,
            secondary_rest_x,
            secondary_delay_ms,
        } = config.intro
        {
            for &id in &objects {
                let is_primary = id == primary;
                let rest = if is_primary {
                    Vec3::ZERO
                } else {
                    Vec3::new(secondary_rest_x, 0.0, 0.0)
                };
                let delay = if is_primary { 0.0 } else { secondary_delay_ms };
                let position = TweenTarget::object(id, Channel::Position);
                let rotation = TweenTarget::object(id, Channel::Rotation);

                animator.set(stage, position, TweenValue::Vec3(rest + start_offset));
                animator.set(stage, rotation, TweenValue::Vec3(Vec3::new(start_tilt, 0.0, 0.0)));
                tweens.push(
                    StepTween::to(position, TweenValue::Vec3(rest), config.appear_ms, config.appear_easing)
                        .delayed(delay),
                );
                tweens.push(StepTween::to(
                    rotation,
                    TweenValue::Vec3(Vec3::ZERO),
                    config.appear_ms,
                    config.appear_easing,
                ));
            }
        }

        let sequence = Sequence::new("appear", vec![ChainStep::new("scale in", tweens)]);
        // Every managed object belongs to the appear chain until it ends,
        // even one it does not tween, so the driver does not start mid-intro.
        self.enter(TransitionState::Entering);
        self.launch(ChainKind::Appear, sequence, objects, animator, stage);

        Ok(())
    }

    /// Routes a tween completion to the running chain.
    pub fn on_tween_complete(&mut self, id: TweenId, animator: &mut dyn Animator, stage: &Stage) {
        let Some(chain) = self.chain.as_mut() else {
            return;
        };

        if chain.sequence.on_tween_complete(id, animator, stage) == SequenceProgress::Finished {
            self.finish_chain();
        }
    }

    fn finish_chain(&mut self) {
        let Some(chain) = self.chain.take() else {
            return;
        };
        log::debug!("{:?} chain finished", chain.kind);

        match chain.kind {
            ChainKind::Appear => {
                self.release(&chain.claims);
                if self.state == TransitionState::Entering {
                    self.enter(TransitionState::Floating);
                }
            }
            ChainKind::Scan => {
                // Ownership stays with the chain while the object is hidden
                if self.state == TransitionState::ScanTriggered {
                    self.enter(TransitionState::ScanComplete);
                }
            }
            ChainKind::Return => {
                if self.state == TransitionState::Returning {
                    self.enter(TransitionState::Floating);
                }
            }
        }
    }

    /// Forward entry into the pinned zone: spin, then shrink the object, then
    /// shrink the container. Re-entry while a scan is running or complete is
    /// ignored.
    pub fn on_zone_enter(&mut self, animator: &mut dyn Animator, stage: &mut Stage) -> Result<(), StageError> {
        let primary = self.primary.ok_or(StageError::MissingObject)?;

        match self.state {
            TransitionState::ScanTriggered | TransitionState::ScanComplete => {
                log::debug!("Zone re-entered in {:?}, scan already started", self.state);
                return Ok(());
            }
            TransitionState::Idle => {
                log::debug!("Zone entered before the appear sequence, ignored");
                return Ok(());
            }
            TransitionState::Entering | TransitionState::Floating | TransitionState::Returning => {}
        }

        self.abandon_chain(animator);
        self.floating = false;

        let position = TweenTarget::object(primary, Channel::Position);
        if let Some(TweenValue::Vec3(current)) = stage.read(position) {
            let baseline = Vec3::new(current.x, self.config.scan_baseline_y, current.z);
            animator.set(stage, position, TweenValue::Vec3(baseline));
        }

        self.cue_due_ms = Some(self.clock_ms + self.config.cue_delay_ms);

        let config = &self.config;
        let sequence = Sequence::new(
            "scan",
            vec![
                ChainStep::single(
                    "turn",
                    StepTween::by(
                        TweenTarget::object(primary, Channel::Rotation),
                        TweenValue::Vec3(Vec3::new(0.0, TAU, 0.0)),
                        config.scan_turn_ms,
                        config.scan_turn_easing,
                    ),
                ),
                ChainStep::single(
                    "shrink object",
                    StepTween::to(
                        TweenTarget::object(primary, Channel::Scale),
                        TweenValue::Scalar(0.0),
                        config.scan_shrink_ms,
                        config.scan_shrink_easing,
                    ),
                ),
                ChainStep::single(
                    "shrink container",
                    StepTween::to(
                        TweenTarget::Container,
                        TweenValue::Scalar(0.0),
                        config.scan_shrink_ms,
                        config.scan_shrink_easing,
                    ),
                ),
            ],
        );

        self.scans_started += 1;
        self.enter(TransitionState::ScanTriggered);
        self.launch(ChainKind::Scan, sequence, vec![primary], animator, stage);

        Ok(())
    }

    /// Backward entry through the zone's end. Nothing reacts to it.
    pub fn on_zone_enter_back(&mut self) {
        log::trace!("Zone entered from below in {:?}", self.state);
    }

    /// Backward exit through the zone's start: bring everything back and hand
    /// the transforms to the frame driver.
    pub fn on_zone_leave_back(&mut self, animator: &mut dyn Animator, stage: &mut Stage) -> Result<(), StageError> {
        if matches!(self.state, TransitionState::Idle | TransitionState::Entering) {
            log::debug!("Zone left backwards in {:?}, ignored", self.state);
            return Ok(());
        }

        animator.set(stage, TweenTarget::Container, TweenValue::Scalar(0.0));
        let primary = self.primary.ok_or(StageError::MissingObject)?;

        self.abandon_chain(animator);
        self.release_all();
        self.floating = true;

        let config = &self.config;
        let sequence = Sequence::new(
            "return",
            vec![ChainStep::new(
                "restore",
                vec![
                    StepTween::to(
                        TweenTarget::Container,
                        TweenValue::Scalar(1.0),
                        config.return_ms,
                        config.return_easing,
                    ),
                    StepTween::to(
                        TweenTarget::object(primary, Channel::Scale),
                        TweenValue::Scalar(1.0),
                        config.return_ms,
                        config.return_easing,
                    ),
                ],
            )],
        );

        self.enter(TransitionState::Returning);
        self.launch(ChainKind::Return, sequence, Vec::new(), animator, stage);

        Ok(())
    }

    /// The page was scrolled back to the very top. Forces the floating pose
    /// from any state, but leaves transform ownership as the zone logic set it.
    pub fn on_back_to_top(&mut self, animator: &mut dyn Animator, stage: &mut Stage) -> Result<(), StageError> {
        if self.state == TransitionState::Idle {
            log::debug!("Back to top before the appear sequence, ignored");
            return Ok(());
        }
        let primary = self.primary.ok_or(StageError::MissingObject)?;

        if self
            .chain
            .as_ref()
            .is_some_and(|chain| chain.kind == ChainKind::Scan)
        {
            self.abandon_chain(animator);
        }

        animator.set(stage, TweenTarget::object(primary, Channel::Scale), TweenValue::Scalar(1.0));
        self.floating = true;
        // Untracked
        let _ = animator.animate(TweenRequest::new(
            TweenTarget::Container,
            TweenValue::Scalar(1.0),
            self.config.appear_ms,
            self.config.appear_easing,
        ));

        self.enter(TransitionState::Floating);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::{Object3D, Scene};
    use crate::tween::Tweener;

    /// Records requests instead of running them; tests complete tweens by hand.
    #[derive(Default)]
    struct RecordingAnimator {
        requests: Vec<(TweenId, TweenRequest)>,
        completed: usize,
        cancelled: Vec<TweenId>,
    }

    impl Animator for RecordingAnimator {
        fn animate(&mut self, request: TweenRequest) -> TweenId {
            let id = TweenId(self.requests.len() as u64);
            self.requests.push((id, request));
            id
        }

        fn cancel(&mut self, id: TweenId) -> bool {
            if self.cancelled.contains(&id) {
                return false;
            }
            self.cancelled.push(id);
            true
        }
    }

    impl RecordingAnimator {
        fn pending(&self) -> Vec<(TweenId, TweenRequest)> {
            self.requests[self.completed..]
                .iter()
                .filter(|(id, _)| !self.cancelled.contains(id))
                .cloned()
                .collect()
        }

        fn requests_for(&self, target: TweenTarget) -> Vec<&TweenRequest> {
            self.requests
                .iter()
                .map(|(_, request)| request)
                .filter(|request| request.target == target)
                .collect()
        }
    }

    struct Fixture {
        machine: StateMachine,
        animator: RecordingAnimator,
        stage: Stage,
        model: ObjectId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut scene = Scene::new();
            let model = scene.add_object(Object3D::named("Model"));
            Self {
                machine: StateMachine::new(TransitionConfig::default()),
                animator: RecordingAnimator::default(),
                stage: Stage::new(scene),
                model,
            }
        }

        fn floating() -> Self {
            let mut fixture = Self::new();
            fixture.machine.bind_primary(fixture.model);
            fixture
                .machine
                .begin_appear(&mut fixture.animator, &mut fixture.stage)
                .unwrap();
            fixture.finish_pending();
            assert_eq!(fixture.machine.state(), TransitionState::Floating);
            fixture
        }

        /// Completes every request issued so far, applying its end value.
        fn finish_pending(&mut self) {
            loop {
                let pending = self.animator.pending();
                if pending.is_empty() {
                    break;
                }
                self.animator.completed = self.animator.requests.len();
                for (id, request) in pending {
                    self.stage.write(request.target, request.to);
                    self.machine
                        .on_tween_complete(id, &mut self.animator, &self.stage);
                }
            }
        }

        fn enter_zone(&mut self) {
            self.machine
                .on_zone_enter(&mut self.animator, &mut self.stage)
                .unwrap();
        }

        fn rotation_requests(&self) -> usize {
            self.animator
                .requests_for(TweenTarget::object(self.model, Channel::Rotation))
                .len()
        }
    }

    #[test]
    fn test_idle_only_leaves_through_appear() {
        let mut fixture = Fixture::new();
        fixture.machine.bind_primary(fixture.model);
        let Fixture {
            machine,
            animator,
            stage,
            ..
        } = &mut fixture;

        machine.on_zone_enter(animator, stage).unwrap();
        machine.on_zone_leave_back(animator, stage).unwrap();
        machine.on_back_to_top(animator, stage).unwrap();
        machine.on_zone_enter_back();
        assert_eq!(machine.state(), TransitionState::Idle);
        assert!(animator.requests.is_empty());

        machine.begin_appear(animator, stage).unwrap();
        assert_eq!(machine.state(), TransitionState::Entering);
    }

    #[test]
    fn test_handlers_without_object_are_guarded() {
        let mut fixture = Fixture::new();
        let Fixture {
            machine,
            animator,
            stage,
            ..
        } = &mut fixture;

        assert_eq!(machine.begin_appear(animator, stage), Err(StageError::MissingObject));
        assert_eq!(machine.on_zone_enter(animator, stage), Err(StageError::MissingObject));
        assert_eq!(machine.state(), TransitionState::Idle);
        assert!(animator.requests.is_empty());
    }

    #[test]
    fn test_appear_scales_container_in_and_owns_object() {
        let mut fixture = Fixture::new();
        fixture.machine.bind_primary(fixture.model);
        fixture
            .machine
            .begin_appear(&mut fixture.animator, &mut fixture.stage)
            .unwrap();

        assert_eq!(fixture.stage.container_scale, 0.0);
        assert_eq!(
            fixture.machine.owner_of(fixture.model),
            TransformOwner::TransitionChain
        );
        let container = fixture.animator.requests_for(TweenTarget::Container);
        assert_eq!(container.len(), 1);
        assert_eq!(container[0].to, TweenValue::Scalar(1.0));

        fixture.finish_pending();
        assert_eq!(fixture.machine.state(), TransitionState::Floating);
        assert_eq!(fixture.machine.owner_of(fixture.model), TransformOwner::FrameDriver);
        assert_eq!(fixture.stage.container_scale, 1.0);
    }

    #[test]
    fn test_appear_can_scale_object() {
        let mut fixture = Fixture::new();
        fixture.machine.config.scale_object_on_appear = true;
        fixture.machine.bind_primary(fixture.model);
        fixture
            .machine
            .begin_appear(&mut fixture.animator, &mut fixture.stage)
            .unwrap();

        let scale = TweenTarget::object(fixture.model, Channel::Scale);
        assert_eq!(fixture.stage.read(scale), Some(TweenValue::Vec3(Vec3::ZERO)));
        assert_eq!(fixture.animator.requests_for(scale).len(), 1);
    }

    #[test]
    fn test_converge_intro_moves_both_objects_to_rest() {
        let mut fixture = Fixture::new();
        fixture.machine.config.intro = IntroStyle::converge();
        let second = fixture.stage.scene.add_object(Object3D::named("Second"));
        fixture.machine.bind_primary(fixture.model);
        fixture.machine.bind_secondary(second);
        fixture
            .machine
            .begin_appear(&mut fixture.animator, &mut fixture.stage)
            .unwrap();

        let position = fixture.stage.read(TweenTarget::object(fixture.model, Channel::Position));
        assert_eq!(position, Some(TweenValue::Vec3(Vec3::new(0.0, -500.0, 0.0))));
        assert_eq!(fixture.machine.owner_of(second), TransformOwner::TransitionChain);

        let second_moves = fixture
            .animator
            .requests_for(TweenTarget::object(second, Channel::Position));
        assert_eq!(second_moves[0].delay_ms, 100.0);
        assert_eq!(second_moves[0].to, TweenValue::Vec3(Vec3::new(450.0, 0.0, 0.0)));

        fixture.finish_pending();
        assert_eq!(fixture.machine.state(), TransitionState::Floating);
        assert_eq!(fixture.machine.owner_of(second), TransformOwner::FrameDriver);
    }

    #[test]
    fn test_zone_enter_starts_scan_chain() {
        let mut fixture = Fixture::floating();
        fixture
            .stage
            .scene
            .set_object_translation(fixture.model, Vec3::new(0.0, 3.5, 0.0));
        fixture
            .stage
            .scene
            .set_object_rotation(fixture.model, Vec3::new(0.0, 0.5, 0.0));
        fixture.machine.set_clock(2000.0);
        fixture.enter_zone();

        assert_eq!(fixture.machine.state(), TransitionState::ScanTriggered);
        assert!(!fixture.machine.is_floating());
        assert_eq!(
            fixture.machine.owner_of(fixture.model),
            TransformOwner::TransitionChain
        );
        let translation = fixture
            .stage
            .scene
            .get_object_transform(fixture.model)
            .unwrap()
            .translation();
        assert_eq!(translation.y, 0.0);

        let turns = fixture
            .animator
            .requests_for(TweenTarget::object(fixture.model, Channel::Rotation));
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].to, TweenValue::Vec3(Vec3::new(0.0, 0.5 + TAU, 0.0)));

        assert!(!fixture.machine.poll_cue(2499.0));
        assert!(fixture.machine.poll_cue(2500.0));
        assert!(!fixture.machine.poll_cue(3000.0));
    }

    #[test]
    fn test_reentry_during_scan_does_not_restart_chain() {
        let mut fixture = Fixture::floating();
        fixture.enter_zone();
        fixture.enter_zone();
        fixture.enter_zone();

        assert_eq!(fixture.rotation_requests(), 1);
        assert_eq!(fixture.machine.scans_started(), 1);

        fixture.finish_pending();
        assert_eq!(fixture.machine.state(), TransitionState::ScanComplete);
        fixture.enter_zone();
        assert_eq!(fixture.rotation_requests(), 1);
    }

    #[test]
    fn test_scan_chain_runs_in_order_and_keeps_ownership() {
        let mut fixture = Fixture::floating();
        fixture.enter_zone();
        let before = fixture.animator.requests.len();

        // Only the turn is requested until it completes
        let pending = fixture.animator.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending[0].1.target,
            TweenTarget::object(fixture.model, Channel::Rotation)
        );

        fixture.finish_pending();
        let order: Vec<TweenTarget> = fixture.animator.requests[before - 1..]
            .iter()
            .map(|(_, request)| request.target)
            .collect();
        assert_eq!(
            order,
            [
                TweenTarget::object(fixture.model, Channel::Rotation),
                TweenTarget::object(fixture.model, Channel::Scale),
                TweenTarget::Container,
            ]
        );

        assert_eq!(fixture.machine.state(), TransitionState::ScanComplete);
        assert_eq!(
            fixture.machine.owner_of(fixture.model),
            TransformOwner::TransitionChain
        );
        assert_eq!(fixture.stage.container_scale, 0.0);
        assert!(fixture.machine.active_chain().is_none());
    }

    #[test]
    fn test_leave_back_returns_to_floating() {
        let mut fixture = Fixture::floating();
        fixture.enter_zone();
        fixture.finish_pending();

        fixture
            .machine
            .on_zone_leave_back(&mut fixture.animator, &mut fixture.stage)
            .unwrap();
        assert_eq!(fixture.machine.state(), TransitionState::Returning);
        assert_eq!(fixture.stage.container_scale, 0.0);
        assert_eq!(fixture.machine.owner_of(fixture.model), TransformOwner::FrameDriver);
        assert!(fixture.machine.is_floating());

        fixture.finish_pending();
        assert_eq!(fixture.machine.state(), TransitionState::Floating);
        assert_eq!(fixture.stage.container_scale, 1.0);
        let scale = fixture
            .stage
            .scene
            .get_object_transform(fixture.model)
            .unwrap()
            .scale();
        assert_eq!(scale, Vec3::ONE);
    }

    #[test]
    fn test_leave_back_mid_chain_abandons_remaining_steps() {
        let mut fixture = Fixture::floating();
        fixture.enter_zone();
        let (turn_id, _) = fixture.animator.pending()[0].clone();

        fixture
            .machine
            .on_zone_leave_back(&mut fixture.animator, &mut fixture.stage)
            .unwrap();
        let (kind, _) = fixture.machine.active_chain().unwrap();
        assert_eq!(kind, ChainKind::Return);

        // The stale turn finishing later must not resume the scan
        fixture
            .machine
            .on_tween_complete(turn_id, &mut fixture.animator, &fixture.stage);
        fixture.finish_pending();
        let shrinks = fixture
            .animator
            .requests_for(TweenTarget::object(fixture.model, Channel::Scale))
            .into_iter()
            .filter(|request| request.to == TweenValue::Scalar(0.0))
            .count();
        assert_eq!(shrinks, 0);
        assert_eq!(fixture.machine.state(), TransitionState::Floating);
    }

    #[test]
    fn test_back_to_top_overrides_without_releasing_ownership() {
        let mut fixture = Fixture::floating();
        fixture.enter_zone();
        fixture.finish_pending();
        assert_eq!(fixture.machine.state(), TransitionState::ScanComplete);

        fixture
            .machine
            .on_back_to_top(&mut fixture.animator, &mut fixture.stage)
            .unwrap();
        assert_eq!(fixture.machine.state(), TransitionState::Floating);
        assert!(fixture.machine.is_floating());
        let scale = fixture
            .stage
            .scene
            .get_object_transform(fixture.model)
            .unwrap()
            .scale();
        assert_eq!(scale, Vec3::ONE);
        assert_eq!(
            fixture.machine.owner_of(fixture.model),
            TransformOwner::TransitionChain
        );
        let container = fixture.animator.requests_for(TweenTarget::Container);
        assert_eq!(container.last().unwrap().to, TweenValue::Scalar(1.0));

        // Leaving the zone backwards afterwards still hands control back
        fixture
            .machine
            .on_zone_leave_back(&mut fixture.animator, &mut fixture.stage)
            .unwrap();
        assert_eq!(fixture.machine.owner_of(fixture.model), TransformOwner::FrameDriver);
    }

    #[test]
    fn test_back_to_top_mid_scan_stops_the_chain() {
        let mut fixture = Fixture::floating();
        fixture.enter_zone();
        fixture
            .machine
            .on_back_to_top(&mut fixture.animator, &mut fixture.stage)
            .unwrap();
        assert!(fixture.machine.active_chain().is_none());

        fixture.finish_pending();
        assert_eq!(fixture.machine.state(), TransitionState::Floating);
        let scale = fixture
            .stage
            .scene
            .get_object_transform(fixture.model)
            .unwrap()
            .scale();
        assert_eq!(scale, Vec3::ONE);
    }

    /// Passes writes through to the stage, counting the rotation ones.
    struct RotationWriteCounter<'a> {
        stage: &'a mut Stage,
        rotation_writes: usize,
    }

    impl TweenSubject for RotationWriteCounter<'_> {
        fn read(&self, target: TweenTarget) -> Option<TweenValue> {
            self.stage.read(target)
        }

        fn write(&mut self, target: TweenTarget, value: TweenValue) -> bool {
            if matches!(
                target,
                TweenTarget::Object {
                    channel: Channel::Rotation,
                    ..
                }
            ) {
                self.rotation_writes += 1;
            }
            self.stage.write(target, value)
        }
    }

    #[test]
    fn test_leave_back_mid_turn_stops_writing_released_fields() {
        let mut scene = Scene::new();
        let model = scene.add_object(Object3D::named("Model"));
        let mut stage = Stage::new(scene);
        let mut tweener = Tweener::new();
        let mut machine = StateMachine::new(TransitionConfig {
            appear_ms: 0.0,
            ..Default::default()
        });
        machine.bind_primary(model);
        machine.begin_appear(&mut tweener, &mut stage).unwrap();
        for id in tweener.advance(0.0, &mut stage) {
            machine.on_tween_complete(id, &mut tweener, &stage);
        }
        assert_eq!(machine.state(), TransitionState::Floating);

        machine.on_zone_enter(&mut tweener, &mut stage).unwrap();
        tweener.advance(300.0, &mut stage);
        assert!(tweener.is_animating(TweenTarget::object(model, Channel::Rotation)));

        machine.on_zone_leave_back(&mut tweener, &mut stage).unwrap();
        assert_eq!(machine.owner_of(model), TransformOwner::FrameDriver);
        // The driver owns position and rotation again; the return chain only scales
        for channel in [Channel::Position, Channel::Rotation] {
            assert!(!tweener.is_animating(TweenTarget::object(model, channel)));
        }

        let mut counter = RotationWriteCounter {
            stage: &mut stage,
            rotation_writes: 0,
        };
        tweener.advance(316.0, &mut counter);
        assert_eq!(counter.rotation_writes, 0);
    }
}
