//! PCM WAVE output

use std::io::Cursor;
use std::path::Path;

use crate::audio::DecodedAudio;
use crate::error::TranscodeResult;

/// Serialize as canonical 16-bit PCM RIFF/WAVE bytes.
///
/// The header always declares 16 bits, so re-parsing yields the same samples
/// with [`DecodedAudio::canonical_format`]. Audio parsed from 16-bit input,
/// or derived through downmix or split, comes back equal.
///
/// Mono and stereo get a plain PCM `fmt ` chunk (tag 1). Wider layouts are
/// written as WAVE_FORMAT_EXTENSIBLE by hound, which [`crate::parse`] does not
/// read back.
pub fn write_wav(audio: &DecodedAudio) -> TranscodeResult<Vec<u8>> {
    let num_channels = audio.num_channels();
    let frames = audio.frame_count();

    let spec = hound::WavSpec {
        channels: num_channels as u16,
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut output = Vec::with_capacity(44 + frames * num_channels * 2);
    let cursor = Cursor::new(&mut output);
    let mut writer = hound::WavWriter::new(cursor, spec)?;

    {
        let mut samples = writer.get_i16_writer((frames * num_channels) as u32);
        for frame in 0..frames {
            for channel in audio.channels() {
                samples.write_sample(channel[frame]);
            }
        }
        samples.flush()?;
    }

    writer.finalize()?;
    Ok(output)
}

/// Write a WAV file, creating parent directories as needed
pub fn write_wav_file(audio: &DecodedAudio, path: &Path) -> TranscodeResult<()> {
    let bytes = write_wav(audio)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    log::debug!("Wrote {} ({} frames)", path.display(), audio.frame_count());
    Ok(())
}
