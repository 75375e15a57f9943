//! Adaptive media engine boundary.
//!
//! The controller never talks to a video stack directly: the embedder wraps
//! its player (HLS, GStreamer, a plain file decoder) in [`MediaEngine`] and
//! forwards the engine's callbacks as [`EngineEvent`]s. This keeps the
//! state machine independent of any rendering toolkit and fully drivable in
//! tests.

/// A media engine failed to attach or decode.
#[derive(Debug, Clone, thiserror::Error)]
#[error("media engine error: {0}")]
pub struct EngineError(pub String);

/// Commands the controller issues to the engine.
pub trait MediaEngine: Send {
    /// Attach the engine to a signed media URL and begin buffering.
    fn attach(&mut self, url: &str) -> Result<(), EngineError>;

    /// Begin or resume playback.
    fn play(&mut self);

    /// Pause playback.
    fn pause(&mut self);

    /// Detach from the media source and release resources.
    fn detach(&mut self);
}

/// Events the embedder forwards from the engine to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Playback actually started (first frame rendered / unpaused).
    Started,
    /// Media duration became known, in seconds.
    DurationKnown(f64),
    /// Current playback position, in seconds of media time.
    Position(f64),
    /// Playback reached the end of the media.
    Ended,
    /// The engine cannot fetch or decode the stream.
    Failed(String),
}
