//! The playback controller state machine.
//!
//! Owns exactly one playback attempt: negotiates the session, attaches the
//! media engine to the signed reference, force-pauses on visibility loss,
//! emits watched-position checkpoints on a media-time cadence, and triggers
//! the idempotent completion request when the position reaches the
//! duration.
//!
//! States: `Idle -> Requesting -> Ready -> Playing <-> Paused -> Ended`,
//! with `Errored` reachable from anywhere. Checkpoint submission is
//! fire-and-forget: a slow or failing write never stalls the state machine
//! and never surfaces to the viewer.

use std::sync::Arc;

use chrono::Utc;

use aula_core::LectureId;

use crate::api::{ApiError, SessionApi};
use crate::engine::{EngineEvent, MediaEngine};
use crate::session::PlaybackSession;
use crate::watermark::{WatermarkFrame, WatermarkRenderer};

/// Seconds of media time between watched-position checkpoints.
const CHECKPOINT_CADENCE_SECS: i64 = 10;

/// Player-visible failure classification.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// The server refused to issue a session. `code` distinguishes
    /// actionable enrollment denials from everything else.
    AuthorizationDenied { code: String, message: String },
    /// The signed reference lapsed and the single transparent re-issue
    /// also failed.
    SessionExpired,
    /// Session negotiation failed on the wire.
    Network(String),
    /// The media engine cannot fetch or decode the stream. Fatal to the
    /// session; not retried.
    Media(String),
}

impl PlayerError {
    /// Human-readable message for the viewer. Enrollment denials are
    /// actionable; anything else is deliberately generic.
    pub fn viewer_message(&self) -> &'static str {
        match self {
            PlayerError::AuthorizationDenied { code, .. }
                if code == "not_enrolled" || code == "enrollment_pending" =>
            {
                "Not enrolled or not approved yet. Request access to this course."
            }
            _ => "Unable to load lecture.",
        }
    }
}

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Requesting,
    Ready,
    Playing,
    Paused,
    Ended,
    Errored(PlayerError),
}

/// One playback attempt for one lecture by one viewer.
pub struct PlaybackController {
    api: Arc<dyn SessionApi>,
    engine: Box<dyn MediaEngine>,
    lecture_id: LectureId,

    phase: Phase,
    session: Option<PlaybackSession>,
    position: f64,
    duration: f64,
    hidden: bool,
    reissued_once: bool,
    completion_requested: bool,
    last_checkpoint_second: Option<i64>,

    watermark: WatermarkRenderer,
    overlay: WatermarkFrame,
}

impl PlaybackController {
    pub fn new(
        api: Arc<dyn SessionApi>,
        engine: Box<dyn MediaEngine>,
        lecture_id: LectureId,
    ) -> Self {
        let now = Utc::now();
        Self {
            api,
            engine,
            lecture_id,
            phase: Phase::Idle,
            session: None,
            position: 0.0,
            duration: 0.0,
            hidden: false,
            reissued_once: false,
            completion_requested: false,
            last_checkpoint_second: None,
            watermark: WatermarkRenderer::new(now),
            overlay: WatermarkFrame::empty(now),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn overlay(&self) -> &WatermarkFrame {
        &self.overlay
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn lecture_id(&self) -> LectureId {
        self.lecture_id
    }

    // -- lifecycle ----------------------------------------------------------

    /// Negotiate a session and attach the media engine (`Idle ->
    /// Requesting -> Ready`, or `Errored`). Called once on mount.
    pub async fn start(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            return;
        }
        self.phase = Phase::Requesting;

        match self.api.request_session(self.lecture_id).await {
            Ok(session) => self.attach_session(session),
            Err(ApiError::Denied { code, message }) => {
                tracing::info!(
                    lecture = %self.lecture_id,
                    code = %code,
                    "Playback session denied"
                );
                self.phase = Phase::Errored(PlayerError::AuthorizationDenied { code, message });
            }
            Err(e) => {
                self.phase = Phase::Errored(PlayerError::Network(e.to_string()));
            }
        }
    }

    /// Attach the engine to a freshly granted session.
    fn attach_session(&mut self, session: PlaybackSession) {
        match self.engine.attach(&session.signed_url) {
            Ok(()) => {
                self.session = Some(session);
                self.phase = Phase::Ready;
                self.rotate_watermark(Utc::now());
            }
            Err(e) => {
                self.phase = Phase::Errored(PlayerError::Media(e.to_string()));
            }
        }
    }

    /// Viewer-initiated pause.
    pub fn pause(&mut self) {
        if matches!(self.phase, Phase::Playing) {
            self.engine.pause();
            self.phase = Phase::Paused;
        }
    }

    /// Viewer-initiated resume. Refused while the surface is hidden; a
    /// session that lapsed while paused is transparently re-issued once.
    pub async fn resume(&mut self) {
        if self.hidden {
            return;
        }
        if !matches!(self.phase, Phase::Paused | Phase::Ready) {
            return;
        }

        let expired = self
            .session
            .as_ref()
            .map(|s| s.is_expired(Utc::now()))
            .unwrap_or(false);
        if expired && !self.reissue().await {
            return;
        }

        self.engine.play();
        // The transition to Playing happens on EngineEvent::Started.
    }

    /// Visibility change from the host surface. Loss of foreground forces a
    /// pause; this is an anti-capture measure, not a preference, so it is
    /// not viewer-overridable while hidden.
    pub fn set_visibility(&mut self, visible: bool) {
        self.hidden = !visible;
        if !visible && matches!(self.phase, Phase::Playing) {
            self.engine.pause();
            self.phase = Phase::Paused;
        }
    }

    /// Feed an engine event into the state machine.
    pub async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Started => {
                if matches!(self.phase, Phase::Ready | Phase::Paused) && !self.hidden {
                    self.phase = Phase::Playing;
                }
            }
            EngineEvent::DurationKnown(d) => {
                self.duration = d;
            }
            EngineEvent::Position(pos) => {
                self.position = pos;
                if let Some(sec) = self.checkpoint_due(pos) {
                    self.spawn_checkpoint(sec);
                }
                if self.duration > 0.0 && pos >= self.duration {
                    self.finish();
                }
            }
            EngineEvent::Ended => {
                self.finish();
            }
            EngineEvent::Failed(msg) => {
                self.handle_engine_failure(msg).await;
            }
        }
    }

    /// Tear down this playback attempt: flush a final checkpoint, detach
    /// the engine, discard the session. The grant is never reused.
    pub async fn shutdown(&mut self) {
        let final_sec = self.position.floor() as i64;
        if final_sec > 0 && self.session.is_some() {
            if let Err(e) = self.api.submit_checkpoint(self.lecture_id, final_sec).await {
                tracing::warn!(
                    lecture = %self.lecture_id,
                    watched = final_sec,
                    "final checkpoint failed: {e}"
                );
            }
        }
        self.engine.detach();
        self.session = None;
        self.phase = Phase::Idle;
    }

    // -- watermark ----------------------------------------------------------

    /// Refresh the overlay with a fresh timestamp. Driven by a wall-clock
    /// timer, independent of playback state.
    pub fn rotate_watermark(&mut self, now: chrono::DateTime<Utc>) {
        let identity = self.session.as_ref().map(|s| {
            format!(
                "{} | {} | {}",
                s.identity_base(),
                s.watermark_course,
                now.format("%Y-%m-%d %H:%M:%S UTC")
            )
        });
        self.overlay = self.watermark.render(identity.as_deref(), now);
    }

    // -- internals ----------------------------------------------------------

    /// Media-time checkpoint cadence: fire once per cadence boundary,
    /// deduplicated per media-second so a paused player neither skips nor
    /// repeats checkpoints.
    fn checkpoint_due(&mut self, position: f64) -> Option<i64> {
        if !matches!(self.phase, Phase::Playing) {
            return None;
        }
        let sec = position.floor() as i64;
        if sec % CHECKPOINT_CADENCE_SECS == 0 && self.last_checkpoint_second != Some(sec) {
            self.last_checkpoint_second = Some(sec);
            return Some(sec);
        }
        None
    }

    /// Fire-and-forget checkpoint submission. Failures are logged and
    /// covered by the next cadence tick; they never change playback state.
    fn spawn_checkpoint(&self, watched_seconds: i64) {
        let api = Arc::clone(&self.api);
        let lecture_id = self.lecture_id;
        tokio::spawn(async move {
            if let Err(e) = api.submit_checkpoint(lecture_id, watched_seconds).await {
                tracing::warn!(
                    lecture = %lecture_id,
                    watched = watched_seconds,
                    "checkpoint write failed: {e}"
                );
            }
        });
    }

    /// Reached the end of the lecture.
    fn finish(&mut self) {
        if matches!(self.phase, Phase::Ended) {
            return;
        }
        self.phase = Phase::Ended;

        // Final checkpoint at the end position.
        let final_sec = self.position.floor() as i64;
        if final_sec > 0 {
            self.spawn_checkpoint(final_sec);
        }

        // Completion is only claimed against a known duration, and only
        // once per controller; the server side is idempotent regardless.
        if self.duration > 0.0 && !self.completion_requested {
            self.completion_requested = true;
            let api = Arc::clone(&self.api);
            let lecture_id = self.lecture_id;
            tokio::spawn(async move {
                if let Err(e) = api.request_completion(lecture_id).await {
                    tracing::warn!(lecture = %lecture_id, "completion request failed: {e}");
                }
            });
        }
    }

    /// Engine failure: if the signed reference has lapsed, attempt one
    /// transparent re-issue; otherwise the failure is fatal to the session.
    async fn handle_engine_failure(&mut self, msg: String) {
        let expired = self
            .session
            .as_ref()
            .map(|s| s.is_expired(Utc::now()))
            .unwrap_or(false);

        if expired {
            if self.reissue().await {
                // Re-attached; playback resumes via EngineEvent::Started.
                return;
            }
        } else {
            self.phase = Phase::Errored(PlayerError::Media(msg));
        }
    }

    /// One transparent re-issuance per controller. Returns true when a
    /// fresh session was attached.
    async fn reissue(&mut self) -> bool {
        if self.reissued_once {
            self.phase = Phase::Errored(PlayerError::SessionExpired);
            return false;
        }
        self.reissued_once = true;
        self.phase = Phase::Requesting;

        tracing::debug!(lecture = %self.lecture_id, "Re-issuing expired playback session");

        match self.api.request_session(self.lecture_id).await {
            Ok(session) => {
                self.attach_session(session);
                matches!(self.phase, Phase::Ready)
            }
            Err(_) => {
                self.phase = Phase::Errored(PlayerError::SessionExpired);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_messages_distinguish_enrollment_from_generic() {
        let denied = PlayerError::AuthorizationDenied {
            code: "enrollment_pending".into(),
            message: "pending".into(),
        };
        assert!(denied.viewer_message().contains("Request access"));

        let network = PlayerError::Network("timeout".into());
        assert_eq!(network.viewer_message(), "Unable to load lecture.");

        let not_found = PlayerError::AuthorizationDenied {
            code: "lecture_not_found".into(),
            message: "missing".into(),
        };
        assert_eq!(not_found.viewer_message(), "Unable to load lecture.");
    }
}
