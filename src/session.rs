//! Input-thread wiring of tracker, store and pipeline.
//!
//! A [`CaptureSession`] feeds fingertip samples to the [`StrokeTracker`], hands
//! every finished curve to the pipeline together with the latest camera frame,
//! and keeps only the visuals of the most recently finished curve. Results for
//! older curves that arrive late are dropped. Replaced visuals fade out; a
//! newer replacement cancels the fade of the one before.

use crate::{
    camera::CameraFrame,
    circle_store::{CircleStore, CurveId},
    config::Config,
    fade::{FadeFrame, FadeOut, FadeSlot},
    pipeline::{CircleVisuals, CurvePipeline},
    stroke_tracker::{StrokeInput, StrokeTracker, TrackerEvent},
    worker::{PipelineOutcome, PipelineWorker},
    Error, Result,
};
use std::collections::VecDeque;

/// Something that changed while polling
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// New visuals became current
    VisualsReady {
        /// Curve the visuals belong to
        curve: CurveId,
    },
    /// A result for an outdated curve was dropped
    StaleDiscarded {
        /// Curve of the dropped result
        curve: CurveId,
    },
    /// The pipeline failed for a curve; nothing is shown for it
    PipelineFailed {
        /// Curve that failed
        curve: CurveId,
        /// Error message
        reason: String,
    },
    /// Fade of the stroke that was just finished
    StrokeFade(FadeFrame),
    /// Fade of visuals that were replaced
    VisualsFade(FadeFrame),
}

/// Drawing session on the input thread
pub struct CaptureSession {
    store: CircleStore,
    tracker: StrokeTracker,
    pipeline: CurvePipeline,
    worker: Option<PipelineWorker>,
    pending: VecDeque<PipelineOutcome>,
    frame: Option<CameraFrame>,
    latest_finished: Option<CurveId>,
    processed: Option<CurveId>,
    current: Option<CircleVisuals>,
    retiring: Option<CircleVisuals>,
    visuals_fade: FadeSlot,
    fade_duration: f64,
}

impl CaptureSession {
    /// Session running the pipeline on a background worker
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid speed filter or if the worker cannot start
    pub fn new(config: &Config) -> Result<Self> {
        let mut session = Self::inline(config)?;
        session.worker = Some(PipelineWorker::spawn(session.pipeline)?);
        Ok(session)
    }

    /// Session running the pipeline on the calling thread as curves finish
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid speed filter
    pub fn inline(config: &Config) -> Result<Self> {
        Ok(Self {
            store: CircleStore::new(),
            tracker: StrokeTracker::new(&config.tracker)?,
            pipeline: CurvePipeline::new(config),
            worker: None,
            pending: VecDeque::new(),
            frame: None,
            latest_finished: None,
            processed: None,
            current: None,
            retiring: None,
            visuals_fade: FadeSlot::new(),
            fade_duration: config.tracker.fade_duration_secs,
        })
    }

    /// Camera frame used for curves finished from now on
    pub fn set_camera_frame(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
    }

    /// Feed one input tick
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a point; pipeline problems are only logged
    pub fn receive(&mut self, input: Option<StrokeInput>, time: f64) -> Result<Vec<TrackerEvent>> {
        let events = self.tracker.receive(&mut self.store, input, time)?;
        for event in &events {
            if let TrackerEvent::CurveFinished { curve } = *event {
                self.latest_finished = Some(curve);
                self.dispatch(curve);
            }
        }
        Ok(events)
    }

    /// Collect pipeline results and advance fades to `now`
    pub fn poll(&mut self, now: f64) -> Vec<SessionUpdate> {
        if let Some(worker) = &self.worker {
            self.pending.extend(worker.drain());
        }

        let mut updates = Vec::new();
        while let Some(outcome) = self.pending.pop_front() {
            updates.push(self.handle_outcome(outcome, now));
        }

        if let Some(frame) = self.tracker.advance_fade(now) {
            updates.push(SessionUpdate::StrokeFade(frame));
        }
        if let Some(frame) = self.visuals_fade.advance(now) {
            if let FadeFrame::Finished { .. } = frame {
                self.retiring = None;
            }
            updates.push(SessionUpdate::VisualsFade(frame));
        }
        updates
    }

    /// Run the pipeline on the calling thread for the latest finished curve,
    /// when it was never handed to the pipeline (no camera frame at the time).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if `curve` is not the latest finished curve, was
    ///   already processed, or no camera frame is available
    /// - any store or pipeline error
    pub fn process_now(&mut self, curve: CurveId, now: f64) -> Result<&CircleVisuals> {
        if self.latest_finished != Some(curve) {
            return Err(Error::InvalidInput(format!("curve {curve} is not the latest finished curve")));
        }
        if self.processed.is_some_and(|last| last >= curve) {
            return Err(Error::InvalidInput(format!("curve {curve} already processed")));
        }
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("no camera frame available".to_string()))?;
        let snapshot = self.store.snapshot(curve)?;

        self.processed = Some(curve);
        let visuals = self.pipeline.process(&snapshot, frame)?;
        self.show(visuals, now);
        self.current.as_ref().ok_or(Error::UnknownCurve(curve))
    }

    /// Wait up to `timeout` for the worker to deliver at least one more result.
    ///
    /// Returns immediately without a worker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if the worker thread is gone
    pub fn wait_for_result(&mut self, timeout: std::time::Duration) -> Result<bool> {
        match &self.worker {
            Some(worker) => match worker.recv_timeout(timeout)? {
                Some(outcome) => {
                    self.pending.push_back(outcome);
                    Ok(true)
                }
                None => Ok(false),
            },
            None => Ok(!self.pending.is_empty()),
        }
    }

    /// Curve store
    #[must_use]
    pub fn store(&self) -> &CircleStore {
        &self.store
    }

    /// Stroke tracker
    #[must_use]
    pub fn tracker(&self) -> &StrokeTracker {
        &self.tracker
    }

    /// Most recently finished curve
    #[must_use]
    pub fn latest_finished(&self) -> Option<CurveId> {
        self.latest_finished
    }

    /// Visuals currently on display
    #[must_use]
    pub fn current_visuals(&self) -> Option<&CircleVisuals> {
        self.current.as_ref()
    }

    /// Replaced visuals still fading out, with their opacity at `now`
    #[must_use]
    pub fn fading_visuals(&self, now: f64) -> Option<(&CircleVisuals, f64)> {
        let fade = self.visuals_fade.current()?;
        self.retiring.as_ref().map(|visuals| (visuals, fade.opacity(now)))
    }

    fn dispatch(&mut self, curve: CurveId) {
        let Some(frame) = self.frame.clone() else {
            log::warn!("No camera frame for curve {curve}, skipping");
            return;
        };
        let snapshot = match self.store.snapshot(curve) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Cannot snapshot curve {curve}: {e}");
                return;
            }
        };

        match &self.worker {
            Some(worker) => {
                if let Err(e) = worker.submit(snapshot, frame) {
                    log::warn!("Curve {curve} not submitted: {e}");
                    return;
                }
            }
            None => {
                let result = self.pipeline.process(&snapshot, &frame);
                self.pending.push_back(PipelineOutcome { curve, result });
            }
        }
        self.processed = Some(curve);
    }

    fn handle_outcome(&mut self, outcome: PipelineOutcome, now: f64) -> SessionUpdate {
        let PipelineOutcome { curve, result } = outcome;
        if self.latest_finished != Some(curve) {
            log::debug!("Discarding stale result for curve {curve}");
            return SessionUpdate::StaleDiscarded { curve };
        }

        match result {
            Ok(visuals) => {
                self.show(visuals, now);
                SessionUpdate::VisualsReady { curve }
            }
            Err(e) => {
                log::warn!("Pipeline failed for curve {curve}: {e}");
                SessionUpdate::PipelineFailed {
                    curve,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn show(&mut self, visuals: CircleVisuals, now: f64) {
        log::info!("Showing visuals for curve {}", visuals.curve);
        if let Some(previous) = self.current.replace(visuals) {
            if let Some(superseded) = self.visuals_fade.begin(FadeOut::new(previous.curve, now, self.fade_duration)) {
                log::debug!("Dropped fading visuals of curve {}", superseded.curve());
            }
            self.retiring = Some(previous);
        }
    }
}
