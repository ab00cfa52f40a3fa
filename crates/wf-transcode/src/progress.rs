//! Progress reporting

use std::time::{Duration, Instant};

/// Stage label reported while blocks are being encoded
pub const STAGE_ENCODING: &str = "Encoding";

/// Receives advisory progress updates, once per scheduler batch.
///
/// Reports never gate correctness; a sink may drop them.
pub trait ProgressSink {
    /// `percent` is in 0.0..=100.0
    fn report(&mut self, percent: f64, stage: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(f64, &str),
{
    fn report(&mut self, percent: f64, stage: &str) {
        self(percent, stage)
    }
}

/// Sink that discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&mut self, _percent: f64, _stage: &str) {}
}

/// Progress snapshot with timing estimates
#[derive(Debug, Clone, PartialEq)]
pub struct JobProgress {
    /// Percent complete (0.0 - 100.0)
    pub percent: f64,
    /// Current stage description
    pub stage: String,
    /// Frames encoded so far
    pub frames_processed: usize,
    /// Frames in the job
    pub total_frames: usize,
    /// Elapsed time
    pub elapsed: Duration,
    /// Estimated time remaining
    pub remaining: Option<Duration>,
}

impl JobProgress {
    /// Progress of a job that has not started
    pub fn new(total_frames: usize) -> Self {
        Self {
            percent: 0.0,
            stage: "Initializing".to_string(),
            frames_processed: 0,
            total_frames,
            elapsed: Duration::ZERO,
            remaining: None,
        }
    }
}

/// Percent of `total` covered by `done`; an empty job counts as complete
pub fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        (done.min(total) as f64 / total as f64) * 100.0
    }
}

/// Tracks elapsed time and extrapolates the remaining time
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    start: Instant,
    progress: JobProgress,
}

impl ProgressTracker {
    /// Start tracking now
    pub fn start(total_frames: usize) -> Self {
        Self {
            start: Instant::now(),
            progress: JobProgress::new(total_frames),
        }
    }

    /// Record frames processed and return the updated snapshot
    pub fn update(&mut self, frames_processed: usize, stage: &str) -> &JobProgress {
        let p = &mut self.progress;
        p.frames_processed = frames_processed;
        p.stage = stage.to_string();
        p.elapsed = self.start.elapsed();
        p.percent = percent(frames_processed, p.total_frames);

        if frames_processed > 0 && p.total_frames > frames_processed {
            let secs = p.elapsed.as_secs_f64();
            if secs > 0.0 {
                let rate = frames_processed as f64 / secs;
                let remaining_frames = (p.total_frames - frames_processed) as f64;
                p.remaining = Some(Duration::from_secs_f64(remaining_frames / rate));
            }
        } else if frames_processed >= p.total_frames {
            p.remaining = Some(Duration::ZERO);
        }

        &self.progress
    }

    /// Latest snapshot
    pub fn progress(&self) -> &JobProgress {
        &self.progress
    }
}
