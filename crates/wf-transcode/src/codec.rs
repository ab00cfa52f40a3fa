//! Block codec interface and the native LAME binding
//!
//! The pipeline only talks to [`BlockCodec`]; [`LameCodec`] is the
//! production implementation over `mp3lame-encoder` (native LAME, no
//! FFmpeg). Tests plug in scripted codecs through [`CodecFactory`].

use std::mem::MaybeUninit;

use mp3lame_encoder::{Builder, DualPcm, Encoder, FlushNoGap};

use crate::config::{BitrateMode, EncodeConfig};
use crate::error::{TranscodeError, TranscodeResult};

// ═══════════════════════════════════════════════════════════════════════════════
// CODEC TRAITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Stateful block-oriented lossy encoder.
///
/// Implementations may carry state across blocks (bit reservoir), so blocks
/// must be fed strictly in input order.
pub trait BlockCodec: Send {
    /// Encode one mono block
    fn encode_mono(&mut self, samples: &[i16]) -> Result<Vec<u8>, String>;

    /// Encode one stereo block; `left` and `right` have equal length
    fn encode_stereo(&mut self, left: &[i16], right: &[i16]) -> Result<Vec<u8>, String>;

    /// Emit any buffered tail. Called once, after the last block.
    fn flush(&mut self) -> Result<Vec<u8>, String>;
}

/// Creates one fresh codec per job
pub trait CodecFactory: Send + Sync {
    /// Initialize a codec for the given stream parameters
    fn create(
        &self,
        num_channels: u16,
        sample_rate: u32,
        config: &EncodeConfig,
    ) -> TranscodeResult<Box<dyn BlockCodec>>;

    /// File extension of the produced stream
    fn extension(&self) -> &'static str;
}

// ═══════════════════════════════════════════════════════════════════════════════
// LAME MP3 CODEC
// ═══════════════════════════════════════════════════════════════════════════════

/// Extra output room LAME asks for on flush
const FLUSH_BUFFER_SIZE: usize = 7200;

/// MP3 codec backed by LAME via the `mp3lame-encoder` crate
pub struct LameCodec {
    encoder: Encoder,
}

// SAFETY: the LAME global flags are owned exclusively by this value and are
// only touched through `&mut self`; nothing is shared between instances.
unsafe impl Send for LameCodec {}

impl LameCodec {
    /// Build and initialize a LAME encoder
    pub fn new(
        num_channels: u16,
        sample_rate: u32,
        config: &EncodeConfig,
    ) -> TranscodeResult<Self> {
        config.validate()?;

        if num_channels == 0 || num_channels > 2 {
            return Err(TranscodeError::UnsupportedChannelLayout(num_channels));
        }

        let mut builder = Builder::new()
            .ok_or_else(|| TranscodeError::EncoderInit("LAME encoder init failed".to_string()))?;

        builder.set_num_channels(num_channels as u8).map_err(|e| {
            TranscodeError::EncoderInit(format!("LAME set channels failed: {:?}", e))
        })?;

        builder.set_sample_rate(sample_rate).map_err(|e| {
            TranscodeError::EncoderInit(format!("LAME set sample rate failed: {:?}", e))
        })?;

        match config.mode {
            BitrateMode::Cbr => {
                builder.set_brate(lame_bitrate(config.bitrate_kbps)).map_err(|e| {
                    TranscodeError::EncoderInit(format!("LAME set bitrate failed: {:?}", e))
                })?;
                builder.set_quality(mp3lame_encoder::Quality::Best).map_err(|e| {
                    TranscodeError::EncoderInit(format!("LAME set quality failed: {:?}", e))
                })?;
            }
            BitrateMode::Vbr => {
                let quality = lame_quality(config.vbr_quality.unwrap_or(4));
                builder
                    .set_vbr_mode(mp3lame_encoder::VbrMode::Mtrh)
                    .map_err(|e| {
                        TranscodeError::EncoderInit(format!("LAME set VBR mode failed: {:?}", e))
                    })?;
                builder.set_vbr_quality(quality).map_err(|e| {
                    TranscodeError::EncoderInit(format!("LAME set VBR quality failed: {:?}", e))
                })?;
            }
        }

        let encoder = builder
            .build()
            .map_err(|e| TranscodeError::EncoderInit(format!("LAME build failed: {:?}", e)))?;

        log::debug!(
            "LAME ready: {} ch, {} Hz, {}",
            num_channels,
            sample_rate,
            config.describe()
        );

        Ok(Self { encoder })
    }
}

impl BlockCodec for LameCodec {
    fn encode_mono(&mut self, samples: &[i16]) -> Result<Vec<u8>, String> {
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(samples.len()));
        // A single-channel LAME context reads only `left`
        let input = DualPcm {
            left: samples,
            right: samples,
        };
        let written = self
            .encoder
            .encode(input, out.spare_capacity_mut())
            .map_err(|e| format!("LAME encode failed: {:?}", e))?;
        // SAFETY: encoder initialized `written` bytes of spare capacity
        unsafe {
            out.set_len(written);
        }
        Ok(out)
    }

    fn encode_stereo(&mut self, left: &[i16], right: &[i16]) -> Result<Vec<u8>, String> {
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(left.len()));
        let written = self
            .encoder
            .encode(DualPcm { left, right }, out.spare_capacity_mut())
            .map_err(|e| format!("LAME encode failed: {:?}", e))?;
        // SAFETY: encoder initialized `written` bytes of spare capacity
        unsafe {
            out.set_len(written);
        }
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>, String> {
        let mut out: Vec<u8> = Vec::with_capacity(FLUSH_BUFFER_SIZE);
        let spare: &mut [MaybeUninit<u8>] = out.spare_capacity_mut();
        let written = self
            .encoder
            .flush::<FlushNoGap>(spare)
            .map_err(|e| format!("LAME flush failed: {:?}", e))?;
        // SAFETY: encoder initialized `written` bytes of spare capacity
        unsafe {
            out.set_len(written);
        }
        Ok(out)
    }
}

/// Factory producing [`LameCodec`] instances
#[derive(Debug, Clone, Copy, Default)]
pub struct LameCodecFactory;

impl CodecFactory for LameCodecFactory {
    fn create(
        &self,
        num_channels: u16,
        sample_rate: u32,
        config: &EncodeConfig,
    ) -> TranscodeResult<Box<dyn BlockCodec>> {
        Ok(Box::new(LameCodec::new(num_channels, sample_rate, config)?))
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}

/// Nearest LAME bitrate at or below `kbps` (96 kbps floor)
pub fn lame_bitrate(kbps: u32) -> mp3lame_encoder::Bitrate {
    match kbps {
        0..=111 => mp3lame_encoder::Bitrate::Kbps96,
        112..=127 => mp3lame_encoder::Bitrate::Kbps112,
        128..=159 => mp3lame_encoder::Bitrate::Kbps128,
        160..=191 => mp3lame_encoder::Bitrate::Kbps160,
        192..=223 => mp3lame_encoder::Bitrate::Kbps192,
        224..=255 => mp3lame_encoder::Bitrate::Kbps224,
        256..=319 => mp3lame_encoder::Bitrate::Kbps256,
        _ => mp3lame_encoder::Bitrate::Kbps320,
    }
}

/// Effective kbps LAME will use for a CBR request
pub fn effective_cbr_kbps(kbps: u32) -> u32 {
    match kbps {
        0..=111 => 96,
        112..=127 => 112,
        128..=159 => 128,
        160..=191 => 160,
        192..=223 => 192,
        224..=255 => 224,
        256..=319 => 256,
        _ => 320,
    }
}

/// LAME quality for VBR level 0 (best) to 9 (worst)
pub fn lame_quality(level: u8) -> mp3lame_encoder::Quality {
    match level {
        0 => mp3lame_encoder::Quality::Best,
        1 => mp3lame_encoder::Quality::SecondBest,
        2 => mp3lame_encoder::Quality::NearBest,
        3 => mp3lame_encoder::Quality::VeryNice,
        4 => mp3lame_encoder::Quality::Nice,
        5 => mp3lame_encoder::Quality::Good,
        6 => mp3lame_encoder::Quality::Decent,
        7 => mp3lame_encoder::Quality::Ok,
        8 => mp3lame_encoder::Quality::SecondWorst,
        _ => mp3lame_encoder::Quality::Worst,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_bitrate() {
        assert_eq!(effective_cbr_kbps(64), 96);
        assert_eq!(effective_cbr_kbps(128), 128);
        assert_eq!(effective_cbr_kbps(150), 128);
        assert_eq!(effective_cbr_kbps(192), 192);
        assert_eq!(effective_cbr_kbps(1000), 320);
    }

    #[test]
    fn test_lame_rejects_surround() {
        let result = LameCodec::new(6, 48000, &EncodeConfig::cbr(192));
        assert!(matches!(
            result,
            Err(TranscodeError::UnsupportedChannelLayout(6))
        ));
    }

    #[test]
    fn test_lame_rejects_invalid_config() {
        let result = LameCodec::new(2, 44100, &EncodeConfig::vbr(12));
        assert!(matches!(result, Err(TranscodeError::InvalidConfig(_))));
    }

    #[test]
    fn test_lame_stereo_block_and_flush() {
        let mut codec = LameCodec::new(2, 44100, &EncodeConfig::cbr(128)).unwrap();
        let left = vec![1000i16; 1152];
        let right = vec![-1000i16; 1152];

        let mut total = 0;
        for _ in 0..8 {
            total += codec.encode_stereo(&left, &right).unwrap().len();
        }
        total += codec.flush().unwrap().len();
        assert!(total > 0);
    }

    #[test]
    fn test_lame_mono_vbr() {
        let mut codec = LameCodec::new(1, 22050, &EncodeConfig::vbr(2)).unwrap();
        let block: Vec<i16> = (0..1152).map(|i| ((i % 64) as i16 - 32) * 200).collect();

        let mut bytes = Vec::new();
        for _ in 0..8 {
            bytes.extend(codec.encode_mono(&block).unwrap());
        }
        bytes.extend(codec.flush().unwrap());
        assert!(!bytes.is_empty());
    }
}
