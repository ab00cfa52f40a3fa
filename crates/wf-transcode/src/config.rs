//! Configuration types for encoding and scheduling

use serde::{Deserialize, Serialize};

use crate::error::{TranscodeError, TranscodeResult};

/// Samples per channel in one encoder block (MPEG Layer III frame granularity)
pub const BLOCK_SIZE: usize = 1152;

/// Default number of blocks encoded per scheduler step
pub const DEFAULT_BLOCKS_PER_BATCH: usize = 10;

/// Highest VBR quality index (0 = best, 9 = smallest)
pub const MAX_VBR_QUALITY: u8 = 9;

/// Bitrate control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitrateMode {
    /// Constant bitrate
    Cbr,
    /// Variable bitrate
    Vbr,
}

impl Default for BitrateMode {
    fn default() -> Self {
        Self::Cbr
    }
}

/// Encoder settings supplied by the caller. Never mutated by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Target bitrate in kbps (used in CBR mode)
    pub bitrate_kbps: u32,
    /// VBR quality, 0 (best) to 9 (smallest); required in VBR mode
    pub vbr_quality: Option<u8>,
    /// Bitrate control mode
    pub mode: BitrateMode,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self::cbr(128)
    }
}

impl EncodeConfig {
    /// Constant bitrate at `kbps`
    pub fn cbr(kbps: u32) -> Self {
        Self {
            bitrate_kbps: kbps,
            vbr_quality: None,
            mode: BitrateMode::Cbr,
        }
    }

    /// Variable bitrate at quality `quality` (0-9)
    pub fn vbr(quality: u8) -> Self {
        Self {
            bitrate_kbps: 0,
            vbr_quality: Some(quality),
            mode: BitrateMode::Vbr,
        }
    }

    /// Check the settings before any work is started
    pub fn validate(&self) -> TranscodeResult<()> {
        match self.mode {
            BitrateMode::Cbr => {
                if self.bitrate_kbps == 0 {
                    return Err(TranscodeError::InvalidConfig(
                        "CBR bitrate must be greater than 0 kbps".to_string(),
                    ));
                }
            }
            BitrateMode::Vbr => match self.vbr_quality {
                Some(q) if q <= MAX_VBR_QUALITY => {}
                Some(q) => {
                    return Err(TranscodeError::InvalidConfig(format!(
                        "VBR quality must be 0-{}, got {}",
                        MAX_VBR_QUALITY, q
                    )));
                }
                None => {
                    return Err(TranscodeError::InvalidConfig(
                        "VBR mode requires a quality level".to_string(),
                    ));
                }
            },
        }
        Ok(())
    }

    /// Human-readable summary, e.g. "CBR 128 kbps" or "VBR q2"
    pub fn describe(&self) -> String {
        match self.mode {
            BitrateMode::Cbr => format!("CBR {} kbps", self.bitrate_kbps),
            BitrateMode::Vbr => format!("VBR q{}", self.vbr_quality.unwrap_or(MAX_VBR_QUALITY)),
        }
    }
}

/// Batch sizing for the chunked encode scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Blocks encoded per step before yielding
    pub blocks_per_batch: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            blocks_per_batch: DEFAULT_BLOCKS_PER_BATCH,
        }
    }
}

impl SchedulerConfig {
    /// Small batches, frequent progress updates
    pub fn responsive() -> Self {
        Self { blocks_per_batch: 2 }
    }

    /// Large batches, fewer yields
    pub fn throughput() -> Self {
        Self { blocks_per_batch: 64 }
    }

    /// Set blocks per batch (clamped to at least 1)
    pub fn with_blocks_per_batch(mut self, blocks: usize) -> Self {
        self.blocks_per_batch = blocks.max(1);
        self
    }

    /// Frames covered by one full batch
    pub fn frames_per_batch(&self) -> usize {
        self.blocks_per_batch.max(1) * BLOCK_SIZE
    }
}
