//! Background encode jobs
//!
//! A worker thread runs the batch loop and posts events back over a bounded
//! channel; the caller polls or blocks on the [`JobHandle`]. The outcome
//! travels on its own single-slot channel, so a caller that never reads
//! events cannot stall the worker. Several
//! independent jobs over one decode can also run on the rayon pool.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::audio::DecodedAudio;
use crate::codec::CodecFactory;
use crate::config::{EncodeConfig, SchedulerConfig};
use crate::encoder::BlockEncoder;
use crate::error::{TranscodeError, TranscodeResult};
use crate::job::{CancelToken, EncodedOutput};
use crate::progress::{JobProgress, NullSink, ProgressTracker};
use crate::scheduler::EncodeScheduler;

/// Queued events before progress updates start being dropped
const EVENT_QUEUE_SIZE: usize = 64;

// ═══════════════════════════════════════════════════════════════════════════════
// JOB EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Message posted by a worker thread
#[derive(Debug)]
pub enum JobEvent {
    /// One batch finished
    Progress { percent: f64, stage: String },
    /// The outcome is ready for [`JobHandle::wait`]; dropped like progress
    /// when the queue is full
    Finished,
}

// ═══════════════════════════════════════════════════════════════════════════════
// JOB HANDLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Caller side of a job running on its own thread
pub struct JobHandle {
    events: Receiver<JobEvent>,
    result: Receiver<TranscodeResult<EncodedOutput>>,
    cancel: CancelToken,
    progress: Arc<RwLock<JobProgress>>,
    thread: Option<JoinHandle<()>>,
}

impl JobHandle {
    /// Cancel at the next batch boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Next pending event, if any
    pub fn try_event(&self) -> Option<JobEvent> {
        self.events.try_recv().ok()
    }

    /// Block for the next event; `None` once the worker is gone
    pub fn next_event(&self) -> Option<JobEvent> {
        self.events.recv().ok()
    }

    /// Latest progress snapshot
    pub fn progress(&self) -> JobProgress {
        self.progress.read().clone()
    }

    /// Worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Block until the job ends and return its outcome.
    ///
    /// Unread events are discarded.
    pub fn wait(mut self) -> TranscodeResult<EncodedOutput> {
        let outcome = self.result.recv().ok();

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Encode worker panicked");
                return Err(TranscodeError::WorkerPanicked);
            }
        }

        outcome.unwrap_or(Err(TranscodeError::WorkerPanicked))
    }
}

/// Run one encode job on a dedicated thread.
///
/// The audio is shared read-only; the job gets its own encoder handle.
pub fn spawn_job(
    audio: Arc<DecodedAudio>,
    config: EncodeConfig,
    scheduler_config: SchedulerConfig,
    factory: Arc<dyn CodecFactory>,
) -> TranscodeResult<JobHandle> {
    let (tx, rx) = bounded(EVENT_QUEUE_SIZE);
    let (result_tx, result_rx) = bounded(1);
    let cancel = CancelToken::new();
    let progress = Arc::new(RwLock::new(JobProgress::new(audio.frame_count())));

    let worker_cancel = cancel.clone();
    let worker_progress = progress.clone();

    let thread = std::thread::Builder::new()
        .name("wf-encode".to_string())
        .spawn(move || {
            let result = run_job(
                &audio,
                &config,
                scheduler_config,
                factory.as_ref(),
                worker_cancel,
                &worker_progress,
                &tx,
            );
            // Single send into a one-slot channel never blocks; the handle
            // may already be gone
            let _ = result_tx.send(result);
            if let Err(TrySendError::Full(_)) = tx.try_send(JobEvent::Finished) {
                log::trace!("Event queue full, dropping finish notice");
            }
        })?;

    Ok(JobHandle {
        events: rx,
        result: result_rx,
        cancel,
        progress,
        thread: Some(thread),
    })
}

fn run_job(
    audio: &DecodedAudio,
    config: &EncodeConfig,
    scheduler_config: SchedulerConfig,
    factory: &dyn CodecFactory,
    cancel: CancelToken,
    progress: &RwLock<JobProgress>,
    tx: &Sender<JobEvent>,
) -> TranscodeResult<EncodedOutput> {
    let encoder = BlockEncoder::init(
        factory,
        audio.num_channels() as u16,
        audio.sample_rate(),
        config,
    )?;

    let total = audio.frame_count();
    let mut tracker = ProgressTracker::start(total);

    let sink = |percent: f64, stage: &str| {
        let frames = ((percent / 100.0) * total as f64).round() as usize;
        *progress.write() = tracker.update(frames, stage).clone();

        let event = JobEvent::Progress {
            percent,
            stage: stage.to_string(),
        };
        if let Err(TrySendError::Full(_)) = tx.try_send(event) {
            log::trace!("Event queue full, dropping progress update");
        }
    };

    EncodeScheduler::new(audio, encoder, scheduler_config, sink)?
        .with_cancel_token(cancel)
        .run()
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARALLEL VARIANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Encode one decode under several configs in parallel.
///
/// Results come back in `configs` order. Each job owns its encoder; blocks
/// within a job stay strictly sequential.
pub fn encode_variants(
    audio: &DecodedAudio,
    configs: &[EncodeConfig],
    scheduler_config: SchedulerConfig,
    factory: &dyn CodecFactory,
) -> Vec<TranscodeResult<EncodedOutput>> {
    configs
        .par_iter()
        .map(|config| {
            let encoder = BlockEncoder::init(
                factory,
                audio.num_channels() as u16,
                audio.sample_rate(),
                config,
            )?;
            log::debug!("Variant {} started", config.describe());
            EncodeScheduler::new(audio, encoder, scheduler_config, NullSink)?.run()
        })
        .collect()
}
