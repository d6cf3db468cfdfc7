//! Scroll signal processing: normalized progress toward the pinned zone and
//! boundary crossings of trigger zones.

/// Snapshot of the scroll position relative to the trigger zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollProgress {
    /// Pixels from the top of the document.
    pub raw: f32,
    pub trigger_zone_start: f32,
    /// `raw / trigger_zone_start`, clamped to [0, 1].
    pub normalized: f32,
}

impl ScrollProgress {
    pub fn is_complete(&self) -> bool {
        self.normalized >= 1.0
    }
}

/// Turns raw scroll offsets into [`ScrollProgress`].
///
/// The zone start is measured once at startup; a later layout change is not
/// picked up.
#[derive(Debug, Clone)]
pub struct ScrollProgressTracker {
    current: ScrollProgress,
}

impl ScrollProgressTracker {
    pub fn new(trigger_zone_start: f32) -> Self {
        Self {
            current: ScrollProgress {
                raw: 0.0,
                trigger_zone_start,
                normalized: normalize(0.0, trigger_zone_start),
            },
        }
    }

    /// Called on every scroll event. Non-finite offsets are dropped.
    #[inline]
    pub fn update(&mut self, raw: f32) -> ScrollProgress {
        if raw.is_finite() {
            self.current.raw = raw;
            self.current.normalized = normalize(raw, self.current.trigger_zone_start);
        }

        self.current
    }

    pub fn progress(&self) -> ScrollProgress {
        self.current
    }
}

fn normalize(raw: f32, zone_start: f32) -> f32 {
    // A zone at (or above) the top of the document counts as reached
    if zone_start.is_nan() || zone_start <= 0.0 {
        return 1.0;
    }

    (raw / zone_start).clamp(0.0, 1.0)
}

/// Boundary crossings of a zone, named after the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneEvent {
    /// Crossed the start going down.
    Enter,
    /// Crossed the end going down.
    Leave,
    /// Crossed the end going up.
    EnterBack,
    /// Crossed the start going up.
    LeaveBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonePhase {
    Before,
    Inside,
    After,
}

/// Derives [`ZoneEvent`]s for `[start, end)` from raw scroll offsets.
#[derive(Debug, Clone)]
pub struct ZoneWatcher {
    start: f32,
    end: f32,
    phase: ZonePhase,
}

impl ZoneWatcher {
    /// The initial phase is taken from `initial_scroll` without emitting events.
    pub fn new(start: f32, end: f32, initial_scroll: f32) -> Self {
        let end = end.max(start);
        let mut watcher = Self {
            start,
            end,
            phase: ZonePhase::Before,
        };
        watcher.phase = watcher.phase_at(initial_scroll);
        watcher
    }

    fn phase_at(&self, scroll: f32) -> ZonePhase {
        if scroll < self.start {
            ZonePhase::Before
        } else if scroll < self.end {
            ZonePhase::Inside
        } else {
            ZonePhase::After
        }
    }

    pub fn is_inside(&self) -> bool {
        self.phase == ZonePhase::Inside
    }

    /// Events caused by moving to `scroll`, in the order they were crossed.
    /// A jump across the whole zone yields two events.
    pub fn update(&mut self, scroll: f32) -> impl Iterator<Item = ZoneEvent> {
        let next = if scroll.is_finite() {
            self.phase_at(scroll)
        } else {
            self.phase
        };

        let (first, second) = match (self.phase, next) {
            (ZonePhase::Before, ZonePhase::Inside) => (Some(ZoneEvent::Enter), None),
            (ZonePhase::Before, ZonePhase::After) => {
                (Some(ZoneEvent::Enter), Some(ZoneEvent::Leave))
            }
            (ZonePhase::Inside, ZonePhase::After) => (Some(ZoneEvent::Leave), None),
            (ZonePhase::After, ZonePhase::Inside) => (Some(ZoneEvent::EnterBack), None),
            (ZonePhase::After, ZonePhase::Before) => {
                (Some(ZoneEvent::EnterBack), Some(ZoneEvent::LeaveBack))
            }
            (ZonePhase::Inside, ZonePhase::Before) => (Some(ZoneEvent::LeaveBack), None),
            _ => (None, None),
        };

        self.phase = next;
        first.into_iter().chain(second)
    }
}
