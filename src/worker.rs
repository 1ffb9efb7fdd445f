//! Background execution of the curve pipeline.
//!
//! One worker thread receives finished-curve jobs over a channel and sends back
//! one outcome per job, in submission order. Dropping the worker closes the job
//! channel and joins the thread after it finishes the job in hand.

use crate::{
    camera::CameraFrame,
    circle_store::{CurveId, CurveSnapshot},
    pipeline::{CircleVisuals, CurvePipeline},
    Error, Result,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::{
    thread::{self, JoinHandle},
    time::Duration,
};

/// One finished curve waiting for the pipeline
struct PipelineJob {
    snapshot: CurveSnapshot,
    frame: CameraFrame,
}

/// Result of running the pipeline for one curve
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Curve the job was submitted for
    pub curve: CurveId,
    /// Visuals, or the error that aborted the pipeline
    pub result: Result<CircleVisuals>,
}

/// Owner of the pipeline thread
pub struct PipelineWorker {
    jobs: Option<Sender<PipelineJob>>,
    results: Receiver<PipelineOutcome>,
    thread_handle: Option<JoinHandle<()>>,
}

impl PipelineWorker {
    /// Start the worker thread
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the thread cannot be spawned
    pub fn spawn(pipeline: CurvePipeline) -> Result<Self> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<PipelineJob>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<PipelineOutcome>();

        let handle = thread::Builder::new()
            .name("curve-pipeline".to_string())
            .spawn(move || run_worker(&pipeline, &job_rx, &result_tx))?;

        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            thread_handle: Some(handle),
        })
    }

    /// Queue a finished curve
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] once the worker has shut down
    pub fn submit(&self, snapshot: CurveSnapshot, frame: CameraFrame) -> Result<()> {
        let jobs = self.jobs.as_ref().ok_or(Error::WorkerUnavailable)?;
        log::debug!("Submitting curve {} ({} points)", snapshot.id, snapshot.points.len());
        jobs.send(PipelineJob { snapshot, frame })
            .map_err(|_| Error::WorkerUnavailable)
    }

    /// Next finished outcome, if one is ready
    #[must_use]
    pub fn try_recv(&self) -> Option<PipelineOutcome> {
        self.results.try_recv().ok()
    }

    /// Wait up to `timeout` for the next outcome
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if the worker thread is gone
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<PipelineOutcome>> {
        match self.results.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::WorkerUnavailable),
        }
    }

    /// All outcomes that are ready now
    #[must_use]
    pub fn drain(&self) -> Vec<PipelineOutcome> {
        self.results.try_iter().collect()
    }

    /// Stop accepting jobs and wait for the thread to finish its queue
    pub fn shutdown(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Pipeline worker thread panicked");
            }
        }
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(pipeline: &CurvePipeline, jobs: &Receiver<PipelineJob>, results: &Sender<PipelineOutcome>) {
    log::debug!("Pipeline worker started");
    for job in jobs {
        let curve = job.snapshot.id;
        let result = pipeline.process(&job.snapshot, &job.frame);
        if results.send(PipelineOutcome { curve, result }).is_err() {
            break;
        }
    }
    log::debug!("Pipeline worker stopped");
}
