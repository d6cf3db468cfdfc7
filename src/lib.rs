pub mod asset;
pub mod camera;
pub mod config;
pub mod driver;
pub mod error;
pub mod framing;
pub mod math;
pub mod presentation;
pub mod scene_graph;
pub mod scroll;
pub mod sequencer;
pub mod stage;
pub mod transition;
pub mod tween;

pub use camera::{CameraState, OrbitTarget};
pub use config::PresentationConfig;
pub use error::StageError;
pub use presentation::{AssetSlot, AudioCue, Presentation, SilentCue, Zone};
pub use scroll::{ScrollProgress, ZoneEvent};
pub use transition::{TransformOwner, TransitionState};
