//! Client-side view of a granted playback session.

use chrono::{DateTime, Utc};

use aula_core::LectureId;

/// A playback session as held by the controller. Scoped to one controller
/// instance; never shared, never persisted, discarded on teardown or
/// expiry.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub lecture_id: LectureId,
    /// Signed, time-limited media reference.
    pub signed_url: String,
    /// Server-built viewer identity payload ("Name | timestamp UTC").
    pub watermark_text: String,
    /// Course title shown alongside the viewer identity.
    pub watermark_course: String,
    pub expires_at: DateTime<Utc>,
}

impl PlaybackSession {
    /// The signed reference is a capability token: validity is checked at
    /// use time, never assumed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// The viewer label portion of the watermark payload (text before the
    /// first separator). Used as the stable base when the client refreshes
    /// the freshness timestamp locally.
    pub fn identity_base(&self) -> &str {
        self.watermark_text
            .split(" | ")
            .next()
            .unwrap_or(&self.watermark_text)
    }
}
