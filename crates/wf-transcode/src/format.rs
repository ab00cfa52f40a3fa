//! WAVE format description and sample encodings

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// `audioFormatTag` value for integer PCM
pub const WAVE_FORMAT_PCM: u16 = 0x0001;

/// Format metadata from the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveFormat {
    /// Format tag (1 = PCM)
    pub audio_format_tag: u16,
    /// Number of interleaved channels
    pub num_channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample (8, 16, 24, 32)
    pub bits_per_sample: u16,
}

impl WaveFormat {
    /// Canonical 16-bit PCM format
    pub fn pcm16(num_channels: u16, sample_rate: u32) -> Self {
        Self {
            audio_format_tag: WAVE_FORMAT_PCM,
            num_channels,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    /// Sample encoding for this format
    pub fn sample_depth(&self) -> Result<SampleDepth, ParseError> {
        SampleDepth::from_bits(self.bits_per_sample)
    }

    /// Bytes per interleaved frame (all channels)
    pub fn block_align(&self) -> usize {
        (self.bits_per_sample as usize / 8) * self.num_channels as usize
    }

    /// Check the invariants a parsed format must satisfy
    pub fn validate(&self) -> Result<SampleDepth, ParseError> {
        if self.audio_format_tag != WAVE_FORMAT_PCM {
            return Err(ParseError::UnsupportedFormat(self.audio_format_tag));
        }
        let depth = self.sample_depth()?;
        if self.num_channels == 0 {
            return Err(ParseError::InvalidChannelCount(self.num_channels));
        }
        if self.sample_rate == 0 {
            return Err(ParseError::InvalidSampleRate(self.sample_rate));
        }
        Ok(depth)
    }
}

/// Supported PCM sample encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleDepth {
    /// 8-bit unsigned, offset binary (128 = silence)
    U8,
    /// 16-bit signed little-endian
    S16,
    /// 24-bit signed little-endian, packed in 3 bytes
    S24,
    /// 32-bit signed little-endian
    S32,
}

impl SampleDepth {
    /// Map `bitsPerSample` to an encoding
    pub fn from_bits(bits: u16) -> Result<Self, ParseError> {
        match bits {
            8 => Ok(Self::U8),
            16 => Ok(Self::S16),
            24 => Ok(Self::S24),
            32 => Ok(Self::S32),
            other => Err(ParseError::UnsupportedBitDepth(other)),
        }
    }

    /// Bytes per single sample
    pub fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S24 => 3,
            Self::S32 => 4,
        }
    }

    /// Bits per single sample
    pub fn bits(self) -> u16 {
        self.bytes() as u16 * 8
    }

    /// Convert one raw little-endian sample to canonical i16.
    ///
    /// `raw` must hold exactly `self.bytes()` bytes. Wider depths are
    /// truncated by arithmetic shift, not rounded.
    #[inline]
    pub fn to_i16(self, raw: &[u8]) -> i16 {
        match self {
            Self::U8 => ((raw[0] as i16) - 128) * 256,
            Self::S16 => i16::from_le_bytes([raw[0], raw[1]]),
            Self::S24 => {
                let value =
                    ((raw[2] as i8 as i32) << 16) | ((raw[1] as i32) << 8) | raw[0] as i32;
                (value >> 8) as i16
            }
            Self::S32 => {
                let value = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                (value >> 16) as i16
            }
        }
    }
}
