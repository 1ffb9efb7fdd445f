//! Per-tick fingertip ingestion and the drawing state machine.
//!
//! The tracker is fed once per input tick with the drawing hand's fingertip
//! (if the hand is tracked) and whether the fingers are pinched. Only one hand
//! is wired in: the other hand stays free for UI interaction.
//!
//! `Idle → Drawing` happens on the first pinched sample while no curve is open;
//! `Drawing → Idle` on the first sample that is not pinched, or when the hand is
//! lost, while a curve is open.

use crate::{
    circle_store::{CircleStore, CurveId},
    config::TrackerConfig,
    fade::{FadeFrame, FadeOut, FadeSlot},
    filters::{create_filter, truncated_mean::TruncatedMean, SpeedFilter},
    Result,
};
use nalgebra::Point3;
use std::collections::VecDeque;

/// One fingertip sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeInput {
    /// Fingertip position in world space
    pub tip: Point3<f64>,
    /// Whether the fingers are pinched
    pub is_drawing: bool,
}

impl StrokeInput {
    /// Pinched sample
    #[must_use]
    pub fn drawing(tip: Point3<f64>) -> Self {
        Self { tip, is_drawing: true }
    }

    /// Released sample
    #[must_use]
    pub fn released(tip: Point3<f64>) -> Self {
        Self { tip, is_drawing: false }
    }
}

/// What a tick changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerEvent {
    /// A new curve was opened
    CurveStarted {
        /// The new curve
        curve: CurveId,
    },
    /// A point was appended; drives the stroke's visual effect
    Trace {
        /// Curve the point was appended to
        curve: CurveId,
        /// Fingertip position
        position: Point3<f64>,
        /// Smoothed fingertip speed in meters per second
        speed: f64,
    },
    /// The open curve was finalized and is ready for the geometry pipeline
    CurveFinished {
        /// The finished curve
        curve: CurveId,
    },
    /// A stroke fade-out was canceled because a new curve opened
    FadeCancelled {
        /// Curve whose fade was canceled
        curve: CurveId,
    },
}

/// Fingertip tracker driving the curve lifecycle
pub struct StrokeTracker {
    window_secs: f64,
    fade_duration: f64,
    history: VecDeque<(Point3<f64>, f64)>,
    speed_filter: Box<dyn SpeedFilter>,
    open_curve: Option<CurveId>,
    stroke_fade: FadeSlot,
    last_speed: f64,
}

impl StrokeTracker {
    /// Create a tracker from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured speed filter is unknown
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        let speed_filter = create_filter(&config.speed_filter)?;
        log::info!(
            "StrokeTracker: window {:.3}s, speed filter {}",
            config.speed_window_secs,
            speed_filter.name()
        );
        Ok(Self::with_filter(
            config.speed_window_secs,
            config.fade_duration_secs,
            speed_filter,
        ))
    }

    /// Create a tracker with an explicit speed filter
    #[must_use]
    pub fn with_filter(window_secs: f64, fade_duration: f64, speed_filter: Box<dyn SpeedFilter>) -> Self {
        Self {
            window_secs,
            fade_duration,
            history: VecDeque::new(),
            speed_filter,
            open_curve: None,
            stroke_fade: FadeSlot::new(),
            last_speed: 0.0,
        }
    }

    /// Feed one input tick.
    ///
    /// `input` is `None` when the drawing hand is not tracked this tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a point for the open curve
    pub fn receive(&mut self, store: &mut CircleStore, input: Option<StrokeInput>, time: f64) -> Result<Vec<TrackerEvent>> {
        while let Some(&(_, head_time)) = self.history.front() {
            if time - head_time > self.window_secs {
                self.history.pop_front();
            } else {
                break;
            }
        }

        if let Some(sample) = input {
            let repeated = self.history.back().is_some_and(|(last, _)| *last == sample.tip);
            self.history.push_back((sample.tip, time));
            if repeated && sample.is_drawing {
                return Ok(Vec::new());
            }
        }

        self.last_speed = self.speed_filter.smooth(&self.window_speeds());

        let mut events = Vec::new();
        match input {
            Some(sample) if sample.is_drawing => {
                let curve = match self.open_curve {
                    Some(curve) => curve,
                    None => self.open_new_curve(store, time, &mut events),
                };
                store.add_point(curve, sample.tip)?;
                events.push(TrackerEvent::Trace {
                    curve,
                    position: sample.tip,
                    speed: self.last_speed,
                });
            }
            _ => {
                if let Some(curve) = self.open_curve.take() {
                    self.finish_curve(store, curve, time, &mut events);
                }
            }
        }

        Ok(events)
    }

    /// Smoothed speed computed on the last non-duplicate tick
    #[must_use]
    pub fn smoothed_speed(&self) -> f64 {
        self.last_speed
    }

    /// Curve currently being drawn
    #[must_use]
    pub fn open_curve(&self) -> Option<CurveId> {
        self.open_curve
    }

    /// Number of samples inside the speed window
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.history.len()
    }

    /// Advance the fade of the last finished stroke
    pub fn advance_fade(&mut self, now: f64) -> Option<FadeFrame> {
        self.stroke_fade.advance(now)
    }

    fn open_new_curve(&mut self, store: &mut CircleStore, time: f64, events: &mut Vec<TrackerEvent>) -> CurveId {
        let curve = store.create_new_circle();
        self.open_curve = Some(curve);
        log::debug!("Started drawing curve {curve}");
        events.push(TrackerEvent::CurveStarted { curve });

        if let Some(fade) = self.stroke_fade.cancel(time) {
            events.push(TrackerEvent::FadeCancelled { curve: fade.curve() });
        }
        curve
    }

    fn finish_curve(&mut self, store: &mut CircleStore, curve: CurveId, time: f64, events: &mut Vec<TrackerEvent>) {
        match store.mark_done(curve) {
            Ok(()) => {
                log::info!("Curve {curve} finished");
                events.push(TrackerEvent::CurveFinished { curve });
            }
            Err(e) => log::warn!("Could not finish curve {curve}: {e}"),
        }

        if let Some(old) = self.stroke_fade.begin(FadeOut::new(curve, time, self.fade_duration)) {
            events.push(TrackerEvent::FadeCancelled { curve: old.curve() });
        }
    }

    /// Speeds between neighbouring samples in the window. Pairs without elapsed time are skipped.
    fn window_speeds(&self) -> Vec<f64> {
        self.history
            .iter()
            .zip(self.history.iter().skip(1))
            .filter_map(|((p0, t0), (p1, t1))| {
                let dt = (t1 - t0).abs();
                (dt > 0.0).then(|| (p1 - p0).norm() / dt)
            })
            .collect()
    }
}

impl Default for StrokeTracker {
    fn default() -> Self {
        Self::with_filter(
            crate::constants::SPEED_WINDOW_SECS,
            crate::constants::FADE_DURATION_SECS,
            Box::new(TruncatedMean::default()),
        )
    }
}
