//! The presentation session: one owner for the scene, camera, scroll state,
//! transition machine and tweens, driven by the host through a handful of
//! entry points.
//!
//! Host call order per display frame: any number of [`Presentation::on_scroll`]
//! / [`Presentation::on_zone_event`] calls, then one [`Presentation::tick`].

use glam::Vec3;

use crate::camera::{CameraState, OrbitTarget};
use crate::config::PresentationConfig;
use crate::driver::FrameDriver;
use crate::error::StageError;
use crate::framing;
use crate::scene_graph::{Object3D, ObjectId, Scene};
use crate::scroll::{ScrollProgress, ScrollProgressTracker, ZoneEvent, ZoneWatcher};
use crate::stage::Stage;
use crate::transition::{StateMachine, TransitionState};
use crate::tween::Tweener;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSlot {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// The first few pixels of the page.
    Top,
    /// The pinned scanner section.
    Scan,
}

/// Sound played shortly after a scan starts.
pub trait AudioCue {
    fn play(&mut self) -> anyhow::Result<()>;
}

pub struct SilentCue;

impl AudioCue for SilentCue {
    fn play(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct Presentation {
    config: PresentationConfig,
    stage: Stage,
    group: ObjectId,
    camera: CameraState,
    orbit: Option<Box<dyn OrbitTarget>>,
    tracker: ScrollProgressTracker,
    top_zone: ZoneWatcher,
    scan_zone: ZoneWatcher,
    machine: StateMachine,
    driver: FrameDriver,
    tweener: Tweener,
    cue: Box<dyn AudioCue>,
    started_at_ms: Option<f64>,
}

impl Presentation {
    pub fn new(config: PresentationConfig) -> Self {
        let mut scene = Scene::new();
        let group = scene.add_object(Object3D::named("Models"));

        let mut stage = Stage::new(scene);
        // Hidden until the appear sequence scales it in
        stage.container_scale = 0.0;

        let zones = &config.zones;
        let scan_start = zones.trigger_zone_start;
        let scan_end = scan_start + config.pin_height();

        Self {
            camera: CameraState::new(&config.camera, config.viewport.width, config.viewport.height),
            tracker: ScrollProgressTracker::new(scan_start),
            top_zone: ZoneWatcher::new(0.0, zones.top_zone_end, 0.0),
            scan_zone: ZoneWatcher::new(scan_start, scan_end, 0.0),
            machine: StateMachine::new(config.transitions.clone()),
            driver: FrameDriver::new(config.motion.clone()),
            tweener: Tweener::new(),
            cue: Box::new(SilentCue),
            orbit: None,
            started_at_ms: None,
            stage,
            group,
            config,
        }
    }

    pub fn with_cue(mut self, cue: Box<dyn AudioCue>) -> Self {
        self.cue = cue;
        self
    }

    pub fn attach_orbit(&mut self, orbit: Box<dyn OrbitTarget>) {
        self.orbit = Some(orbit);
    }

    pub fn config(&self) -> &PresentationConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.stage.scene
    }

    /// For spawning assets; hand them over with [`Self::on_asset_loaded`].
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.stage.scene
    }

    pub fn group(&self) -> ObjectId {
        self.group
    }

    pub fn state(&self) -> TransitionState {
        self.machine.state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn progress(&self) -> ScrollProgress {
        self.tracker.progress()
    }

    pub fn container_scale(&self) -> f32 {
        self.stage.container_scale
    }

    pub fn object(&self, slot: AssetSlot) -> Option<ObjectId> {
        match slot {
            AssetSlot::Primary => self.machine.primary(),
            AssetSlot::Secondary => self.machine.secondary(),
        }
    }

    fn report(result: Result<(), StageError>, what: &str) {
        if let Err(error) = result {
            log::debug!("{what}: {error}");
        }
    }

    /// Takes an asset spawned into [`Self::scene_mut`]: recenters it, places
    /// it in the model group, re-frames the camera and, for the primary,
    /// starts the appear sequence.
    pub fn on_asset_loaded(&mut self, slot: AssetSlot, root: ObjectId) {
        let size = match self.stage.scene.recenter_object(root) {
            Ok(bounds) => bounds.size(),
            Err(error) => {
                log::debug!("Not recentering {slot:?} asset: {error}");
                Vec3::NAN
            }
        };

        if slot == AssetSlot::Secondary {
            // Beside the primary, spaced by its own width
            let spacing = if size.x.is_finite() { size.x.max(1.0) } else { 1.0 };
            if let Some(transform) = self.stage.scene.get_object_transform_mut(root) {
                let mut translation = transform.translation();
                translation.x = spacing;
                transform.set_translation(translation);
            }
        }

        self.stage.scene.set_object_parent(root, Some(self.group));
        Self::report(self.frame_to_contents(), "Framing after asset load");

        match slot {
            AssetSlot::Primary => {
                self.machine.bind_primary(root);
                let result = self.machine.begin_appear(&mut self.tweener, &mut self.stage);
                Self::report(result, "Appear sequence");
            }
            AssetSlot::Secondary => self.machine.bind_secondary(root),
        }
    }

    /// Fits the camera to everything in the model group.
    pub fn frame_to_contents(&mut self) -> Result<(), StageError> {
        let volume = self
            .stage
            .scene
            .compute_bounding_volume(&[self.group])
            .map_err(|_| StageError::SkippedFraming)?;
        let framed = framing::frame_camera(&volume, &self.camera, self.config.camera.margin)?;

        log::info!(
            "Framed {:?} from {:?} (near {:.3}, far {:.1})",
            volume.size(),
            framed.position,
            framed.near,
            framed.far
        );
        if !volume.inside_frustum(&framed.frustum(), volume.max_dimension() * 1e-3) {
            log::debug!("Framed volume extends past the frustum at this aspect");
        }

        self.camera = framed;
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.sync_target(self.camera.target);
        }

        Ok(())
    }

    /// Shifts an object vertically so its top touches the top of the view.
    pub fn align_to_viewport_top(&mut self, id: ObjectId, margin: f32) -> Result<f32, StageError> {
        let volume = self.stage.scene.compute_bounding_volume(&[id])?;
        let delta =
            framing::align_top_to_viewport(&volume, &self.camera, margin).ok_or(StageError::SkippedFraming)?;

        if let Some(transform) = self.stage.scene.get_object_transform_mut(id) {
            transform.translate(Vec3::new(0.0, delta, 0.0));
        }
        Ok(delta)
    }

    /// Feeds a raw scroll offset; runs the built-in zone watchers.
    pub fn on_scroll(&mut self, raw: f32) -> ScrollProgress {
        let progress = self.tracker.update(raw);

        // The top-of-page override goes first so a zone-leave in the same
        // update has the last word on the container scale
        let top: Vec<ZoneEvent> = self.top_zone.update(raw).collect();
        let scan: Vec<ZoneEvent> = self.scan_zone.update(raw).collect();

        for event in top {
            self.on_zone_event(Zone::Top, event);
        }
        for event in scan {
            self.on_zone_event(Zone::Scan, event);
        }

        progress
    }

    /// Zone boundary crossings, from the built-in watchers or an external
    /// trigger provider.
    pub fn on_zone_event(&mut self, zone: Zone, event: ZoneEvent) {
        log::trace!("{zone:?} zone: {event:?}");

        let machine = &mut self.machine;
        let result = match (zone, event) {
            (Zone::Scan, ZoneEvent::Enter) => machine.on_zone_enter(&mut self.tweener, &mut self.stage),
            (Zone::Scan, ZoneEvent::LeaveBack) => {
                machine.on_zone_leave_back(&mut self.tweener, &mut self.stage)
            }
            (Zone::Scan, ZoneEvent::EnterBack) => {
                machine.on_zone_enter_back();
                Ok(())
            }
            (Zone::Top, ZoneEvent::EnterBack) => machine.on_back_to_top(&mut self.tweener, &mut self.stage),
            _ => Ok(()),
        };

        Self::report(result, "Zone event");
    }

    /// One display frame. `now_ms` is any monotonic clock; time is measured
    /// from the first tick.
    pub fn tick(&mut self, now_ms: f64) {
        let started_at = *self.started_at_ms.get_or_insert(now_ms);
        let elapsed = now_ms - started_at;
        self.machine.set_clock(elapsed);

        for id in self.tweener.advance(elapsed, &mut self.stage) {
            self.machine
                .on_tween_complete(id, &mut self.tweener, &self.stage);
        }

        if self.machine.poll_cue(elapsed) {
            if let Err(error) = self.cue.play() {
                let error = StageError::SideEffectFailure(format!("{error:#}"));
                log::warn!("Scan cue: {error}");
            }
        }

        let progress = self.tracker.progress();
        self.driver
            .drive(elapsed, &progress, &self.machine, &mut self.stage.scene);
    }

    pub fn on_resize(&mut self, width: f32, height: f32) {
        if self.camera.set_viewport(width, height) {
            log::debug!("Viewport {width}x{height}, aspect {:.3}", self.camera.aspect);
        }
    }
}
