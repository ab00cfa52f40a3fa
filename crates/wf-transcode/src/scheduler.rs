//! Chunked encode scheduler
//!
//! Drives a [`BlockEncoder`] over a [`DecodedAudio`] in bounded batches.
//! Each [`EncodeScheduler::step`] encodes at most one batch, reports
//! progress, and hands control back to the caller. Cancellation is only
//! observed between batches; a batch in flight always runs to its end.

use crate::audio::DecodedAudio;
use crate::config::{BLOCK_SIZE, SchedulerConfig};
use crate::encoder::BlockEncoder;
use crate::error::{TranscodeError, TranscodeResult};
use crate::job::{CancelToken, EncodeJob, EncodedOutput, JobStatus};
use crate::progress::{ProgressSink, STAGE_ENCODING, percent};

/// Outcome of one scheduler step
#[derive(Debug)]
pub enum JobStep {
    /// A batch was encoded; percent of input frames consumed
    InProgress(f64),
    /// Flushed and assembled
    Done(EncodedOutput),
    /// The job aborted; no output survives
    Failed(TranscodeError),
}

/// Resumable encode job over borrowed audio
pub struct EncodeScheduler<'a> {
    audio: &'a DecodedAudio,
    encoder: BlockEncoder,
    config: SchedulerConfig,
    sink: Box<dyn ProgressSink + 'a>,
    cancel: CancelToken,
    job: Option<EncodeJob>,
    status: JobStatus,
    batches: usize,
}

impl<'a> EncodeScheduler<'a> {
    /// Create a scheduler; no encoding happens until the first step.
    ///
    /// The encoder must have been initialized for the audio's channel count.
    pub fn new(
        audio: &'a DecodedAudio,
        encoder: BlockEncoder,
        config: SchedulerConfig,
        sink: impl ProgressSink + 'a,
    ) -> TranscodeResult<Self> {
        if encoder.num_channels() as usize != audio.num_channels() {
            return Err(TranscodeError::ChannelMismatch {
                encoder: encoder.num_channels(),
                audio: audio.num_channels(),
            });
        }

        Ok(Self {
            audio,
            encoder,
            config,
            sink: Box::new(sink),
            cancel: CancelToken::new(),
            job: Some(EncodeJob::new(audio.frame_count())),
            status: JobStatus::Pending,
            batches: 0,
        })
    }

    /// Share an externally owned cancel flag
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this job at the next batch boundary
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Frames handed to the encoder so far (0 once the job has ended)
    pub fn frames_processed(&self) -> usize {
        self.job.as_ref().map_or(0, |job| job.frames_processed)
    }

    pub fn total_frames(&self) -> usize {
        self.audio.frame_count()
    }

    /// Batches completed so far
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Run one batch, or the final flush once input is exhausted.
    ///
    /// Any step after `Done` or `Failed` yields `Failed(JobFinished)`.
    pub fn step(&mut self) -> JobStep {
        let Some(mut job) = self.job.take() else {
            return JobStep::Failed(TranscodeError::JobFinished);
        };

        if self.cancel.is_cancelled() {
            log::info!(
                "Encode cancelled at frame {}/{}",
                job.frames_processed,
                job.total_frames
            );
            self.status = JobStatus::Cancelled;
            return JobStep::Failed(TranscodeError::Cancelled);
        }

        if job.is_input_exhausted() {
            return self.finish(job);
        }

        self.status = JobStatus::Encoding;
        if let Err(e) = self.encode_batch(&mut job) {
            log::debug!("Encode failed, dropping {} buffered bytes", job.pending_bytes());
            self.status = JobStatus::Failed;
            return JobStep::Failed(e);
        }

        self.batches += 1;
        let pct = percent(job.frames_processed, job.total_frames);
        log::debug!(
            "Batch {}: {}/{} frames ({:.1}%)",
            self.batches,
            job.frames_processed,
            job.total_frames,
            pct
        );
        self.sink.report(pct, STAGE_ENCODING);

        self.job = Some(job);
        JobStep::InProgress(pct)
    }

    /// Step until the job completes or fails
    pub fn run(mut self) -> TranscodeResult<EncodedOutput> {
        loop {
            match self.step() {
                JobStep::InProgress(_) => {}
                JobStep::Done(output) => return Ok(output),
                JobStep::Failed(e) => return Err(e),
            }
        }
    }

    /// Encode consecutive blocks up to the batch boundary
    fn encode_batch(&mut self, job: &mut EncodeJob) -> TranscodeResult<()> {
        let audio = self.audio;
        let left = audio
            .channel(0)
            .ok_or(TranscodeError::UnsupportedChannelLayout(0))?;
        let right = if self.encoder.num_channels() > 1 {
            Some(
                audio
                    .channel(1)
                    .ok_or(TranscodeError::UnsupportedChannelLayout(1))?,
            )
        } else {
            None
        };

        let batch_end = job
            .frames_processed
            .saturating_add(self.config.frames_per_batch())
            .min(job.total_frames);

        while job.frames_processed < batch_end {
            let start = job.frames_processed;
            let end = (start + BLOCK_SIZE).min(batch_end);

            let bytes = self
                .encoder
                .encode_block(&left[start..end], right.map(|r| &r[start..end]))
                .map_err(|message| TranscodeError::EncodeBlock {
                    frame_offset: start,
                    message,
                })?;

            job.push_chunk(bytes);
            job.frames_processed = end;
        }

        Ok(())
    }

    fn finish(&mut self, mut job: EncodeJob) -> JobStep {
        match self.encoder.flush() {
            Ok(tail) => job.push_chunk(tail),
            Err(message) => {
                self.status = JobStatus::Failed;
                return JobStep::Failed(TranscodeError::Flush(message));
            }
        }

        let blocks = self.encoder.blocks_encoded();
        let output = job.into_output();
        self.status = JobStatus::Completed;

        log::info!(
            "Encoded {} frames in {} blocks, {} batches: {} bytes",
            self.audio.frame_count(),
            blocks,
            self.batches,
            output.len()
        );

        JobStep::Done(output)
    }
}
