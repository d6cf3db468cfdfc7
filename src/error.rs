use thiserror::Error;

/// Soft failures of the presentation core.
///
/// None of these are fatal: the session logs them and carries on with the
/// next frame or event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("bounding volume is empty or not finite")]
    DegenerateVolume,
    #[error("camera framing skipped, volume not finite")]
    SkippedFraming,
    #[error("handler invoked before the object was loaded")]
    MissingObject,
    #[error("side effect failed: {0}")]
    SideEffectFailure(String),
}
