//! Encode job state and results

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::assembler::assemble;

/// Shared cancel flag, checked by the scheduler at batch boundaries only
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Mutable state of one running encode.
///
/// Owned by the scheduler; dropped (with any partial output) on failure.
#[derive(Debug, Default)]
pub struct EncodeJob {
    /// Frames already passed to the encoder
    pub frames_processed: usize,
    /// Frames in the input
    pub total_frames: usize,
    /// Encoded byte chunks in emission order
    pub pending_chunks: Vec<Vec<u8>>,
}

impl EncodeJob {
    pub fn new(total_frames: usize) -> Self {
        Self {
            frames_processed: 0,
            total_frames,
            pending_chunks: Vec::new(),
        }
    }

    /// All input frames have been encoded
    pub fn is_input_exhausted(&self) -> bool {
        self.frames_processed >= self.total_frames
    }

    /// Append a chunk; empty chunks are skipped
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        if !chunk.is_empty() {
            self.pending_chunks.push(chunk);
        }
    }

    /// Bytes accumulated so far
    pub fn pending_bytes(&self) -> usize {
        self.pending_chunks.iter().map(Vec::len).sum()
    }

    /// Consume the job into its assembled output
    pub fn into_output(self) -> EncodedOutput {
        EncodedOutput {
            bytes: assemble(&self.pending_chunks),
        }
    }
}

/// Compressed stream of one completed job
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedOutput {
    pub bytes: Vec<u8>,
}

impl EncodedOutput {
    /// Output size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Created, no batch run yet
    Pending,
    /// Batches in flight
    Encoding,
    /// Completed successfully
    Completed,
    /// Failed with error
    Failed,
    /// Cancelled at a batch boundary
    Cancelled,
}

impl JobStatus {
    /// Whether the job can make no further progress
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}
