//! aula-player: the client-side secure playback controller.
//!
//! This crate implements the playback half of the secure session protocol:
//! it negotiates a signed media session with the server, drives an
//! embedder-provided adaptive media engine, force-pauses on visibility
//! loss, emits watched-position checkpoints on a media-time cadence, and
//! rotates a tiled per-viewer watermark overlay on a wall-clock cadence.
//!
//! The embedding UI supplies two seams: a [`SessionApi`] (HTTP by default,
//! mockable in tests) and a [`MediaEngine`] wrapping whatever video stack
//! renders the frames. Everything timing- and state-sensitive lives here.

pub mod api;
pub mod controller;
pub mod engine;
pub mod player;
pub mod session;
pub mod visibility;
pub mod watermark;

pub use api::{ApiError, HttpSessionApi, SessionApi};
pub use controller::{Phase, PlaybackController, PlayerError};
pub use engine::{EngineError, EngineEvent, MediaEngine};
pub use player::Player;
pub use session::PlaybackSession;
pub use visibility::{VisibilityHandle, VisibilitySource};
pub use watermark::{WatermarkFrame, WatermarkLine, WatermarkRenderer};
