//! PCM normalizer
//!
//! Converts interleaved 8/16/24/32-bit little-endian PCM into canonical
//! 16-bit signed samples, one vector per channel.

use crate::format::SampleDepth;

/// Frames contained in `data_len` bytes. Trailing partial frames are dropped.
pub fn frame_count(data_len: usize, depth: SampleDepth, num_channels: usize) -> usize {
    let frame_bytes = depth.bytes() * num_channels;
    if frame_bytes == 0 {
        0
    } else {
        data_len / frame_bytes
    }
}

/// De-interleave and convert raw data-chunk bytes.
///
/// Frame `i`, channel `c` is read at `i * frame_bytes + c * depth.bytes()`.
/// Returns exactly `num_channels` vectors of equal length.
pub fn normalize(data: &[u8], depth: SampleDepth, num_channels: usize) -> Vec<Vec<i16>> {
    let frames = frame_count(data.len(), depth, num_channels);
    let sample_bytes = depth.bytes();
    let frame_bytes = sample_bytes * num_channels;

    let mut channels: Vec<Vec<i16>> = (0..num_channels)
        .map(|_| Vec::with_capacity(frames))
        .collect();

    if frame_bytes == 0 {
        return channels;
    }

    for frame in data.chunks_exact(frame_bytes) {
        for (channel, raw) in channels.iter_mut().zip(frame.chunks_exact(sample_bytes)) {
            channel.push(depth.to_i16(raw));
        }
    }

    channels
}
