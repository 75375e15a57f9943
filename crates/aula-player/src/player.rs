//! Player facade: owns the controller plus its timers.
//!
//! Wires the wall-clock watermark rotation and the visibility subscription
//! onto a [`PlaybackController`], all cancelled together on shutdown. The
//! controller itself stays single-threaded in behavior: every mutation goes
//! through one async mutex, and the timers are independent tasks that never
//! block each other or playback.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use aula_core::LectureId;

use crate::api::SessionApi;
use crate::controller::{Phase, PlaybackController};
use crate::engine::{EngineEvent, MediaEngine};
use crate::visibility::VisibilityHandle;
use crate::watermark::WatermarkFrame;

/// Wall-clock period of the watermark rotation.
const WATERMARK_ROTATION: Duration = Duration::from_secs(5);

/// A running playback attempt: controller + timers + subscriptions.
pub struct Player {
    controller: Arc<Mutex<PlaybackController>>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Player {
    /// Create a player for one lecture. Timers start immediately; the
    /// session is only negotiated on [`Player::start`].
    pub fn new(
        api: Arc<dyn SessionApi>,
        engine: Box<dyn MediaEngine>,
        lecture_id: LectureId,
    ) -> Self {
        let controller = Arc::new(Mutex::new(PlaybackController::new(api, engine, lecture_id)));
        let cancel = CancellationToken::new();

        let mut player = Self {
            controller,
            cancel,
            tasks: Vec::new(),
        };
        player.spawn_watermark_timer();
        player
    }

    /// Negotiate the session and attach the engine.
    pub async fn start(&self) {
        self.controller.lock().await.start().await;
    }

    /// Forward an engine event.
    pub async fn handle_engine_event(&self, event: EngineEvent) {
        self.controller.lock().await.handle_engine_event(event).await;
    }

    /// Viewer-initiated pause.
    pub async fn pause(&self) {
        self.controller.lock().await.pause();
    }

    /// Viewer-initiated resume (refused while hidden).
    pub async fn resume(&self) {
        self.controller.lock().await.resume().await;
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> Phase {
        self.controller.lock().await.phase().clone()
    }

    /// Current watermark overlay.
    pub async fn overlay(&self) -> WatermarkFrame {
        self.controller.lock().await.overlay().clone()
    }

    /// Subscribe the player to host-surface visibility. The forwarder task
    /// dies with the player (or when the source is dropped).
    pub fn watch_visibility(&mut self, mut handle: VisibilityHandle) {
        let controller = Arc::clone(&self.controller);
        let cancel = self.cancel.clone();

        self.tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = handle.changed() => {
                        let Some(visible) = changed else { break };
                        controller.lock().await.set_visibility(visible);
                    }
                }
            }
        }));
    }

    /// Wall-clock watermark rotation, independent of playback state.
    fn spawn_watermark_timer(&mut self) {
        let controller = Arc::clone(&self.controller);
        let cancel = self.cancel.clone();

        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(WATERMARK_ROTATION);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        controller.lock().await.rotate_watermark(Utc::now());
                    }
                }
            }
        }));
    }

    /// Tear down: cancel timers and subscriptions, flush the final
    /// checkpoint, detach the engine. Consumes the player so nothing can
    /// touch the controller afterwards.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        self.controller.lock().await.shutdown().await;
    }
}
