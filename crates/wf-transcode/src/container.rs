//! RIFF/WAVE container parser
//!
//! Walks the chunk list of an in-memory WAVE file, picks up the first
//! `fmt ` and `data` chunks and hands the sample bytes to the normalizer.
//! Other chunks (LIST, cue, bext, ...) are skipped unread.

use crate::audio::DecodedAudio;
use crate::error::ParseError;
use crate::format::{SampleDepth, WaveFormat};
use crate::normalize::normalize;

const RIFF_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const FMT_MIN_LEN: u32 = 16;

/// One chunk header found while walking the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Four-character chunk id
    pub id: [u8; 4],
    /// Offset of the chunk body (just past the 8-byte header)
    pub offset: usize,
    /// Declared body size
    pub size: u32,
}

impl ChunkInfo {
    /// Chunk id as text (lossy for non-ASCII ids)
    pub fn id_str(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }
}

/// Iterator over the chunks following the 12-byte RIFF/WAVE header.
///
/// Stops when the next header would read past the end of the buffer.
/// Bodies are word-aligned: an odd size is followed by one pad byte.
pub struct ChunkIter<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ChunkIter<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: RIFF_HEADER_LEN,
        }
    }
}

impl Iterator for ChunkIter<'_> {
    type Item = ChunkInfo;

    fn next(&mut self) -> Option<ChunkInfo> {
        let header_end = self.pos.checked_add(CHUNK_HEADER_LEN)?;
        if header_end > self.bytes.len() {
            return None;
        }

        let header = &self.bytes[self.pos..header_end];
        let id = [header[0], header[1], header[2], header[3]];
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let chunk = ChunkInfo {
            id,
            offset: header_end,
            size,
        };

        let padded = (size as usize).saturating_add(size as usize & 1);
        self.pos = header_end.saturating_add(padded);

        Some(chunk)
    }
}

/// Location of the pieces needed for decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveLayout {
    /// Parsed `fmt ` chunk
    pub format: WaveFormat,
    /// Sample encoding of the data body
    pub depth: SampleDepth,
    /// Offset of the first `data` chunk body
    pub data_offset: usize,
    /// Usable size of the data body (declared size clamped to the buffer)
    pub data_size: usize,
}

/// Check the `RIFF....WAVE` signature
pub fn is_wave(bytes: &[u8]) -> bool {
    bytes.len() >= RIFF_HEADER_LEN && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// List every chunk header in the buffer
pub fn chunks(bytes: &[u8]) -> Result<Vec<ChunkInfo>, ParseError> {
    if !is_wave(bytes) {
        return Err(ParseError::InvalidContainer);
    }
    Ok(ChunkIter::new(bytes).collect())
}

/// Read the format fields from a `fmt ` body (little-endian, fixed offsets)
fn read_fmt(body: &[u8]) -> WaveFormat {
    WaveFormat {
        audio_format_tag: u16::from_le_bytes([body[0], body[1]]),
        num_channels: u16::from_le_bytes([body[2], body[3]]),
        sample_rate: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
        bits_per_sample: u16::from_le_bytes([body[14], body[15]]),
    }
}

/// Locate and validate the format and data chunks without decoding samples
pub fn probe(bytes: &[u8]) -> Result<WaveLayout, ParseError> {
    if !is_wave(bytes) {
        return Err(ParseError::InvalidContainer);
    }

    let mut fmt: Option<ChunkInfo> = None;
    let mut data: Option<ChunkInfo> = None;

    for chunk in ChunkIter::new(bytes) {
        match &chunk.id {
            b"fmt " if fmt.is_none() => fmt = Some(chunk),
            b"data" if data.is_none() => data = Some(chunk),
            _ => log::trace!("Skipping chunk '{}' ({} bytes)", chunk.id_str(), chunk.size),
        }
        if fmt.is_some() && data.is_some() {
            break;
        }
    }

    let fmt = fmt.ok_or(ParseError::MissingFmtChunk)?;
    if fmt.size < FMT_MIN_LEN || fmt.offset + FMT_MIN_LEN as usize > bytes.len() {
        return Err(ParseError::MalformedFmtChunk { size: fmt.size });
    }
    let format = read_fmt(&bytes[fmt.offset..fmt.offset + FMT_MIN_LEN as usize]);
    let depth = format.validate()?;

    let data = data.ok_or(ParseError::MissingDataChunk)?;
    let available = bytes.len().saturating_sub(data.offset);
    let data_size = if data.size as usize > available {
        log::warn!(
            "data chunk declares {} bytes but only {} remain; truncating",
            data.size,
            available
        );
        available
    } else {
        data.size as usize
    };

    Ok(WaveLayout {
        format,
        depth,
        data_offset: data.offset,
        data_size,
    })
}

/// Parse a complete RIFF/WAVE buffer into canonical 16-bit channels
pub fn parse(bytes: &[u8]) -> Result<DecodedAudio, ParseError> {
    let layout = probe(bytes)?;

    let data = &bytes[layout.data_offset..layout.data_offset + layout.data_size];
    let channels = normalize(data, layout.depth, layout.format.num_channels as usize);

    let decoded = DecodedAudio::new(layout.format, channels);
    log::debug!(
        "Parsed WAVE: {} ch, {} Hz, {}-bit, {} frames",
        decoded.num_channels(),
        decoded.sample_rate(),
        layout.format.bits_per_sample,
        decoded.frame_count()
    );

    Ok(decoded)
}
