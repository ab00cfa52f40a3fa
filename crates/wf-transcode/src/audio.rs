//! Decoded PCM audio

use crate::format::WaveFormat;

/// Canonical 16-bit audio, one sample vector per channel.
///
/// Invariants: `channels.len() == format.num_channels`, every channel holds
/// exactly `frame_count` samples, and `duration_seconds` is
/// `frame_count / sample_rate`. Fields are private so a constructed value
/// cannot be mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    format: WaveFormat,
    channels: Vec<Vec<i16>>,
    frame_count: usize,
    duration_seconds: f64,
}

impl DecodedAudio {
    /// Build from per-channel samples.
    ///
    /// Channels longer than the shortest one are truncated so that all share
    /// one frame count, and `format.num_channels` is set to `channels.len()`.
    /// The source `bits_per_sample` is kept for reporting; samples are always
    /// canonical i16. Audio derived from this value (downmix, split) carries
    /// the 16-bit format it is written back out with.
    pub fn new(format: WaveFormat, mut channels: Vec<Vec<i16>>) -> Self {
        let frame_count = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in &mut channels {
            channel.truncate(frame_count);
        }

        let format = WaveFormat {
            num_channels: channels.len() as u16,
            ..format
        };

        let duration_seconds = if format.sample_rate == 0 {
            0.0
        } else {
            frame_count as f64 / format.sample_rate as f64
        };

        Self {
            format,
            channels,
            frame_count,
            duration_seconds,
        }
    }

    /// Source format
    pub fn format(&self) -> &WaveFormat {
        &self.format
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    /// Frames per channel
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// All channel buffers
    pub fn channels(&self) -> &[Vec<i16>] {
        &self.channels
    }

    /// One channel buffer
    pub fn channel(&self, index: usize) -> Option<&[i16]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Consume and return the channel buffers
    pub fn into_channels(self) -> Vec<Vec<i16>> {
        self.channels
    }

    /// 16-bit PCM format with this value's channel count and rate
    pub fn canonical_format(&self) -> WaveFormat {
        WaveFormat::pcm16(self.channels.len() as u16, self.format.sample_rate)
    }

    /// Mix all channels down to one (integer mean, truncated toward zero)
    pub fn downmix_to_mono(&self) -> DecodedAudio {
        let format = WaveFormat::pcm16(1, self.format.sample_rate);
        if self.channels.len() <= 1 {
            return DecodedAudio::new(format, self.channels.clone());
        }

        let count = self.channels.len() as i32;
        let mono: Vec<i16> = (0..self.frame_count)
            .map(|frame| {
                let sum: i32 = self.channels.iter().map(|c| c[frame] as i32).sum();
                (sum / count) as i16
            })
            .collect();

        DecodedAudio::new(format, vec![mono])
    }

    /// One mono `DecodedAudio` per source channel
    pub fn split_channels(&self) -> Vec<DecodedAudio> {
        self.channels
            .iter()
            .map(|channel| {
                DecodedAudio::new(
                    WaveFormat::pcm16(1, self.format.sample_rate),
                    vec![channel.clone()],
                )
            })
            .collect()
    }

    /// Duration as `m:ss.mmm` or `h:mm:ss.mmm`
    pub fn duration_str(&self) -> String {
        let total_ms = (self.duration_seconds * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let mins = (total_ms % 3_600_000) / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        let ms = total_ms % 1000;

        if hours > 0 {
            format!("{}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            format!("{}:{:02}.{:03}", mins, secs, ms)
        }
    }
}
