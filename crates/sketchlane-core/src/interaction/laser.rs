//! Laser trace lifetime.
//!
//! Traces stay for [`LASER_HOLD_MS`], fade over [`LASER_FADE_MS`], and are
//! swept once older than hold + fade + [`LASER_SAFETY_MS`]. Any peer's sweep
//! removes them, so a trace is not left behind when its author disconnects.

use crate::elements::{Element, ElementId};
use crate::store::Document;

pub const LASER_HOLD_MS: u64 = 1000;
pub const LASER_FADE_MS: u64 = 1500;
pub const LASER_SAFETY_MS: u64 = 2000;

/// How often the sweep runs.
pub const LASER_SWEEP_INTERVAL_MS: u64 = 1000;

/// Age after which a trace is deleted.
pub const fn laser_lifetime_ms() -> u64 {
    LASER_HOLD_MS + LASER_FADE_MS + LASER_SAFETY_MS
}

/// Render opacity of a trace created at `created_at`.
pub fn laser_opacity(created_at: u64, now_ms: u64) -> f64 {
    let age = now_ms.saturating_sub(created_at);
    if age <= LASER_HOLD_MS {
        return 1.0;
    }
    let t = (age - LASER_HOLD_MS) as f64 / LASER_FADE_MS as f64;
    (1.0 - t).max(0.0)
}

pub fn is_expired(element: &Element, now_ms: u64) -> bool {
    element
        .created_at()
        .is_some_and(|created| now_ms.saturating_sub(created) > laser_lifetime_ms())
}

/// Ids of traces due for deletion.
pub fn expired_lasers(doc: &Document, now_ms: u64) -> Vec<ElementId> {
    doc.ordered()
        .into_iter()
        .filter(|e| is_expired(e, now_ms))
        .map(|e| e.id.clone())
        .collect()
}

/// Decides when the periodic sweep is due, independent of redraws.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaserSweeper {
    last_sweep: Option<u64>,
}

impl LaserSweeper {
    /// Whether a sweep should run now. Records the sweep when it does.
    pub fn due(&mut self, now_ms: u64) -> bool {
        let due = self
            .last_sweep
            .is_none_or(|last| now_ms.saturating_sub(last) >= LASER_SWEEP_INTERVAL_MS);
        if due {
            self.last_sweep = Some(now_ms);
        }
        due
    }
}
