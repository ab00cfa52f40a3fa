//! Block encoder adapter
//!
//! Wraps one [`BlockCodec`] handle for the lifetime of a job and enforces
//! the calling contract: blocks of at most [`BLOCK_SIZE`] samples per
//! channel, the single-channel path for mono streams, and exactly one flush.

use crate::codec::{BlockCodec, CodecFactory};
use crate::config::{BLOCK_SIZE, EncodeConfig};
use crate::error::{TranscodeError, TranscodeResult};

/// Per-job encoder handle
pub struct BlockEncoder {
    codec: Box<dyn BlockCodec>,
    num_channels: u16,
    blocks_encoded: u64,
    flushed: bool,
}

impl BlockEncoder {
    /// Initialize a fresh codec for one job
    pub fn init(
        factory: &dyn CodecFactory,
        num_channels: u16,
        sample_rate: u32,
        config: &EncodeConfig,
    ) -> TranscodeResult<Self> {
        config.validate()?;
        if num_channels == 0 || num_channels > 2 {
            return Err(TranscodeError::UnsupportedChannelLayout(num_channels));
        }

        let codec = factory.create(num_channels, sample_rate, config)?;
        Ok(Self::from_codec(codec, num_channels))
    }

    /// Wrap an already-initialized codec
    pub fn from_codec(codec: Box<dyn BlockCodec>, num_channels: u16) -> Self {
        Self {
            codec,
            num_channels,
            blocks_encoded: 0,
            flushed: false,
        }
    }

    /// Channel count the codec was initialized with
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Blocks passed to the codec so far
    pub fn blocks_encoded(&self) -> u64 {
        self.blocks_encoded
    }

    /// Encode one block.
    ///
    /// Mono encoders never look at `right`. Stereo encoders require `right`
    /// with the same length as `left`. An empty return is valid: the codec
    /// may be buffering.
    pub fn encode_block(&mut self, left: &[i16], right: Option<&[i16]>) -> Result<Vec<u8>, String> {
        if self.flushed {
            return Err("encode_block called after flush".to_string());
        }
        if left.len() > BLOCK_SIZE {
            return Err(format!(
                "block of {} samples exceeds the {}-sample limit",
                left.len(),
                BLOCK_SIZE
            ));
        }

        let encoded = if self.num_channels == 1 {
            self.codec.encode_mono(left)?
        } else {
            let right = right.ok_or_else(|| "stereo block is missing channel 1".to_string())?;
            if right.len() != left.len() {
                return Err(format!(
                    "channel length mismatch: left {} vs right {}",
                    left.len(),
                    right.len()
                ));
            }
            self.codec.encode_stereo(left, right)?
        };

        self.blocks_encoded += 1;
        Ok(encoded)
    }

    /// Emit the codec's buffered tail. Only the first call reaches the codec.
    pub fn flush(&mut self) -> Result<Vec<u8>, String> {
        if self.flushed {
            return Err("flush called twice".to_string());
        }
        self.flushed = true;
        self.codec.flush()
    }

    /// Whether `flush` has been called
    pub fn is_flushed(&self) -> bool {
        self.flushed
    }
}
