//! Watermark overlay renderer.
//!
//! Produces the geometry and text of the protective overlay: several
//! repeating rows of the viewer identity, rotated and slowly drifting, so
//! no crop of the frame is watermark-free and a captured still carries a
//! stale freshness timestamp. Output is pure data -- the embedder paints it
//! above the video surface and must never let it intercept input.
//!
//! Rendering cannot fail: when the identity text is momentarily
//! unavailable the renderer re-renders the last-known value, since
//! protection of the stream must stay continuous.

use chrono::{DateTime, Utc};

/// One drifting row of repeated watermark text.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkLine {
    /// The repeated identity text for this row.
    pub text: String,
    /// Vertical offset as a percentage of the frame height.
    pub top_pct: f32,
    /// Horizontal start offset as a percentage of the frame width
    /// (negative: the row begins off-screen so drift never uncovers a gap).
    pub left_pct: f32,
    /// Rotation applied to the row, in degrees.
    pub angle_deg: f32,
    /// Seconds for one full drift cycle of this row.
    pub drift_period_secs: f32,
    /// Current phase of the drift cycle in `[0, 1)`.
    pub drift_phase: f32,
}

/// A rendered overlay frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkFrame {
    pub lines: Vec<WatermarkLine>,
    pub generated_at: DateTime<Utc>,
}

impl WatermarkFrame {
    /// Empty frame shown before the first render.
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            lines: Vec::new(),
            generated_at: at,
        }
    }
}

/// Number of drifting rows tiled across the frame.
const ROWS: usize = 4;
/// Repetitions of the identity text within one row.
const REPEATS: usize = 5;
/// Row rotation in degrees.
const ANGLE_DEG: f32 = -16.0;

/// Stateful renderer: remembers the last identity text and a drift epoch.
#[derive(Debug)]
pub struct WatermarkRenderer {
    last_text: String,
    epoch: DateTime<Utc>,
}

impl WatermarkRenderer {
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            last_text: String::new(),
            epoch,
        }
    }

    /// Render the overlay for the given identity text at the given instant.
    ///
    /// `None` (or an empty string) re-renders the last-known identity; a
    /// renderer that has never seen an identity produces an empty frame
    /// rather than erroring.
    pub fn render(&mut self, identity: Option<&str>, at: DateTime<Utc>) -> WatermarkFrame {
        match identity {
            Some(text) if !text.is_empty() => self.last_text = text.to_string(),
            _ => {}
        }

        if self.last_text.is_empty() {
            return WatermarkFrame::empty(at);
        }

        let elapsed = (at - self.epoch).num_milliseconds().max(0) as f32 / 1000.0;
        let row_text = vec![self.last_text.as_str(); REPEATS].join(" \u{2022} ");

        let lines = (0..ROWS)
            .map(|i| {
                let period = 18.0 + 2.0 * i as f32;
                WatermarkLine {
                    text: row_text.clone(),
                    top_pct: 10.0 + 22.0 * i as f32,
                    left_pct: -20.0,
                    angle_deg: ANGLE_DEG,
                    drift_period_secs: period,
                    drift_phase: (elapsed % period) / period,
                }
            })
            .collect();

        WatermarkFrame {
            lines,
            generated_at: at,
        }
    }

    /// The identity text the renderer would fall back to.
    pub fn last_text(&self) -> &str {
        &self.last_text
    }
}
