//! Cancelable fade-out timelines keyed by curve id.
//!
//! A fade is advanced by the caller's clock rather than by a timer of its own,
//! so it runs on the same tick as the input it belongs to. Starting a new fade
//! in a [`FadeSlot`] supersedes the running one and hands it back so the caller
//! can report or clean up after it.

use crate::circle_store::CurveId;

/// One running fade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeOut {
    curve: CurveId,
    started_at: f64,
    duration: f64,
}

impl FadeOut {
    /// Start fading the visuals of `curve` at time `started_at`
    #[must_use]
    pub fn new(curve: CurveId, started_at: f64, duration: f64) -> Self {
        Self {
            curve,
            started_at,
            duration: duration.max(0.0),
        }
    }

    /// Curve whose visuals are fading
    #[must_use]
    pub fn curve(&self) -> CurveId {
        self.curve
    }

    /// Linear progress in `[0, 1]`
    #[must_use]
    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.started_at) / self.duration).clamp(0.0, 1.0)
    }

    /// Opacity goes from 1 at the start to 0 at the end
    #[must_use]
    pub fn opacity(&self, now: f64) -> f64 {
        1.0 - self.progress(now)
    }

    /// True once the fade has run its full duration
    #[must_use]
    pub fn is_finished(&self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Result of advancing a [`FadeSlot`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeFrame {
    /// The fade is still running at this opacity
    Running {
        /// Curve whose visuals are fading
        curve: CurveId,
        /// Current opacity
        opacity: f64,
    },
    /// The fade completed on this tick; the visuals can be dropped
    Finished {
        /// Curve whose visuals finished fading
        curve: CurveId,
    },
}

/// Holder for at most one running fade
#[derive(Debug, Default)]
pub struct FadeSlot {
    current: Option<FadeOut>,
}

impl FadeSlot {
    /// Empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fade, returning the one it superseded if that was still running
    /// when the new one starts. A fade that already ran out is dropped silently.
    pub fn begin(&mut self, fade: FadeOut) -> Option<FadeOut> {
        let superseded = self
            .current
            .replace(fade)
            .filter(|old| !old.is_finished(fade.started_at));
        if let Some(old) = &superseded {
            log::debug!("Fade for curve {} superseded by curve {}", old.curve, fade.curve);
        }
        superseded
    }

    /// Cancel the fade, returning it if it was still running at `now`
    pub fn cancel(&mut self, now: f64) -> Option<FadeOut> {
        let canceled = self.current.take().filter(|fade| !fade.is_finished(now));
        if let Some(fade) = &canceled {
            log::debug!("Fade for curve {} canceled", fade.curve);
        }
        canceled
    }

    /// The running fade
    #[must_use]
    pub fn current(&self) -> Option<&FadeOut> {
        self.current.as_ref()
    }

    /// Advance to `now`. A finished fade is reported once and then cleared.
    pub fn advance(&mut self, now: f64) -> Option<FadeFrame> {
        let fade = self.current?;
        if fade.is_finished(now) {
            self.current = None;
            return Some(FadeFrame::Finished { curve: fade.curve });
        }
        Some(FadeFrame::Running {
            curve: fade.curve,
            opacity: fade.opacity(now),
        })
    }
}
