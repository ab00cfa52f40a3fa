//! Pipeline Integration Tests
//!
//! End-to-end runs from raw WAVE bytes to encoded output, with the real
//! LAME codec and with scripted codecs that record every call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wf_transcode::{
    BlockCodec, CodecFactory, EncodeConfig, ErrorCategory, JobEvent, JobStep, NullSink,
    ParseError, Pipeline, SchedulerConfig, TranscodeError, TranscodeResult, encode_with, parse,
    start,
};

// ============================================================================
// TEST UTILITIES
// ============================================================================

/// Build a canonical 44-byte-header WAVE file around raw sample bytes
fn wave_bytes(channels: u16, rate: u32, bits: u16, data: &[u8]) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let mut out = Vec::with_capacity(44 + data.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&(rate * block_align as u32).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

/// 16-bit interleaved stereo sine, different pitch per channel
fn stereo_tone(frames: usize, rate: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(frames * 4);
    for i in 0..frames {
        let t = i as f64 / rate as f64;
        let l = ((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 12000.0) as i16;
        let r = ((2.0 * std::f64::consts::PI * 660.0 * t).sin() * 12000.0) as i16;
        data.extend_from_slice(&l.to_le_bytes());
        data.extend_from_slice(&r.to_le_bytes());
    }
    data
}

#[derive(Default)]
struct CallLog {
    mono_blocks: Vec<Vec<i16>>,
    stereo_blocks: usize,
    flushes: usize,
}

/// Records calls; emits 4 bytes per block and 2 on flush
struct ScriptedCodec {
    log: Arc<Mutex<CallLog>>,
    fail_on_block: Option<usize>,
    fail_flush: bool,
}

impl ScriptedCodec {
    fn blocks_seen(&self) -> usize {
        let log = self.log.lock().unwrap();
        log.mono_blocks.len() + log.stereo_blocks
    }
}

impl BlockCodec for ScriptedCodec {
    fn encode_mono(&mut self, samples: &[i16]) -> Result<Vec<u8>, String> {
        if Some(self.blocks_seen()) == self.fail_on_block {
            return Err("codec rejected block".to_string());
        }
        self.log.lock().unwrap().mono_blocks.push(samples.to_vec());
        Ok(vec![0xAA; 4])
    }

    fn encode_stereo(&mut self, _left: &[i16], _right: &[i16]) -> Result<Vec<u8>, String> {
        if Some(self.blocks_seen()) == self.fail_on_block {
            return Err("codec rejected block".to_string());
        }
        self.log.lock().unwrap().stereo_blocks += 1;
        Ok(vec![0xBB; 4])
    }

    fn flush(&mut self) -> Result<Vec<u8>, String> {
        self.log.lock().unwrap().flushes += 1;
        if self.fail_flush {
            return Err("flush failed".to_string());
        }
        Ok(vec![0xCC; 2])
    }
}

#[derive(Default)]
struct ScriptedFactory {
    log: Arc<Mutex<CallLog>>,
    created: AtomicUsize,
    fail_on_block: Option<usize>,
    fail_flush: bool,
}

impl CodecFactory for ScriptedFactory {
    fn create(
        &self,
        _num_channels: u16,
        _sample_rate: u32,
        _config: &EncodeConfig,
    ) -> TranscodeResult<Box<dyn BlockCodec>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedCodec {
            log: self.log.clone(),
            fail_on_block: self.fail_on_block,
            fail_flush: self.fail_flush,
        }))
    }

    fn extension(&self) -> &'static str {
        "bin"
    }
}

fn transcode(bytes: &[u8], factory: &dyn CodecFactory) -> TranscodeResult<Vec<u8>> {
    let decoded = parse(bytes)?;
    let output = encode_with(
        &decoded,
        &EncodeConfig::default(),
        SchedulerConfig::default(),
        factory,
        NullSink,
    )?;
    Ok(output.into_bytes())
}

// ============================================================================
// CONCRETE SCENARIOS
// ============================================================================

#[test]
fn test_two_second_silence_at_128k() {
    let bytes = wave_bytes(2, 44100, 16, &vec![0u8; 2 * 44100 * 2 * 2]);
    assert_eq!(bytes.len(), 44 + 352_800);

    let decoded = parse(&bytes).unwrap();
    assert_eq!(decoded.frame_count(), 88200);

    let output = start(&decoded, EncodeConfig::cbr(128), NullSink).unwrap();
    let expected = (128_000 / 8 * 2) as f64;
    let size = output.len() as f64;
    assert!(!output.is_empty());
    assert!(
        (size - expected).abs() <= expected * 0.15,
        "{} bytes is not within 15% of {}",
        size,
        expected
    );
}

#[test]
fn test_missing_data_chunk_never_reaches_encoder() {
    let mut bytes = wave_bytes(2, 44100, 16, &[]);
    bytes.truncate(36); // drop the data chunk header
    let factory = ScriptedFactory::default();

    let err = transcode(&bytes, &factory).unwrap_err();
    assert!(matches!(
        err,
        TranscodeError::Parse(ParseError::MissingDataChunk)
    ));
    assert_eq!(err.category(), ErrorCategory::Container);
    assert_eq!(factory.created.load(Ordering::SeqCst), 0);
}

#[test]
fn test_8bit_extremes() {
    let bytes = wave_bytes(1, 8000, 8, &[0x00, 0xFF]);
    let decoded = parse(&bytes).unwrap();
    assert_eq!(decoded.channel(0), Some(&[-32768i16, 32512][..]));
}

#[test]
fn test_unsupported_depth_is_configuration_error() {
    let bytes = wave_bytes(1, 8000, 12, &[0; 16]);
    let err = transcode(&bytes, &ScriptedFactory::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

// ============================================================================
// ENCODER CONTRACT
// ============================================================================

#[test]
fn test_output_is_deterministic() {
    let bytes = wave_bytes(2, 44100, 16, &stereo_tone(30_000, 44100));
    let pipeline = Pipeline::from_bytes(&bytes).unwrap();
    let config = EncodeConfig::cbr(192);

    let first = pipeline.encode(&config, NullSink).unwrap();
    let second = pipeline.encode(&config, NullSink).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_mono_input_uses_single_channel_path() {
    let samples: Vec<u8> = (0..3000i16).flat_map(|s| s.to_le_bytes()).collect();
    let bytes = wave_bytes(1, 22050, 16, &samples);
    let factory = ScriptedFactory::default();

    let output = transcode(&bytes, &factory).unwrap();

    let log = factory.log.lock().unwrap();
    assert_eq!(log.stereo_blocks, 0);
    assert_eq!(log.mono_blocks.len(), 3);
    assert_eq!(log.mono_blocks[2].len(), 3000 - 2 * 1152);
    assert_eq!(log.mono_blocks[1][0], 1152);
    assert_eq!(log.flushes, 1);
    assert_eq!(output.len(), 3 * 4 + 2);
    assert_eq!(&output[output.len() - 2..], &[0xCC, 0xCC]);
}

#[test]
fn test_block_failure_discards_output() {
    let bytes = wave_bytes(2, 44100, 16, &stereo_tone(20_000, 44100));
    let factory = ScriptedFactory {
        fail_on_block: Some(12),
        ..Default::default()
    };

    let err = transcode(&bytes, &factory).unwrap_err();
    match &err {
        TranscodeError::EncodeBlock { frame_offset, .. } => assert_eq!(*frame_offset, 12 * 1152),
        other => panic!("expected EncodeBlock, got {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Encoder);
    assert_eq!(err.stage(), "encode");
    // Aborted before the flush
    assert_eq!(factory.log.lock().unwrap().flushes, 0);
}

#[test]
fn test_flush_failure_surfaces() {
    let bytes = wave_bytes(1, 8000, 16, &[0; 200]);
    let factory = ScriptedFactory {
        fail_flush: true,
        ..Default::default()
    };

    let err = transcode(&bytes, &factory).unwrap_err();
    assert!(matches!(err, TranscodeError::Flush(_)));
    assert_eq!(err.stage(), "flush");
}

#[test]
fn test_surround_rejected_before_codec() {
    let bytes = wave_bytes(6, 48000, 16, &[0; 12 * 10]);
    let factory = ScriptedFactory::default();

    let err = transcode(&bytes, &factory).unwrap_err();
    assert!(matches!(err, TranscodeError::UnsupportedChannelLayout(6)));
    assert_eq!(factory.created.load(Ordering::SeqCst), 0);
}

// ============================================================================
// SCHEDULING
// ============================================================================

#[test]
fn test_progress_is_monotonic_and_completes() {
    let bytes = wave_bytes(2, 44100, 16, &stereo_tone(100_000, 44100));
    let decoded = parse(&bytes).unwrap();
    let factory = ScriptedFactory::default();

    let mut reports: Vec<(f64, String)> = Vec::new();
    encode_with(
        &decoded,
        &EncodeConfig::default(),
        SchedulerConfig::default(),
        &factory,
        |pct: f64, stage: &str| reports.push((pct, stage.to_string())),
    )
    .unwrap();

    // ceil(100000 / 11520) batches, one report each
    assert_eq!(reports.len(), 9);
    assert!(reports.windows(2).all(|w| w[0].0 < w[1].0));
    assert!(reports.iter().all(|(_, stage)| stage == "Encoding"));
    assert!((reports.last().unwrap().0 - 100.0).abs() < 1e-9);
}

#[test]
fn test_step_driven_cancel() {
    let bytes = wave_bytes(2, 44100, 16, &stereo_tone(60_000, 44100));
    let factory = Arc::new(ScriptedFactory::default());
    let pipeline = Pipeline::from_bytes(&bytes)
        .unwrap()
        .with_factory(factory.clone());

    let mut scheduler = pipeline.scheduler(&EncodeConfig::default(), NullSink).unwrap();
    let token = scheduler.cancel_token();

    for _ in 0..2 {
        assert!(matches!(scheduler.step(), JobStep::InProgress(_)));
    }
    token.cancel();

    assert!(matches!(
        scheduler.step(),
        JobStep::Failed(TranscodeError::Cancelled)
    ));
    let log = factory.log.lock().unwrap();
    assert_eq!(log.stereo_blocks, 20);
    assert_eq!(log.flushes, 0);
}

#[test]
fn test_worker_thread_with_lame() {
    let bytes = wave_bytes(2, 44100, 16, &stereo_tone(44_100, 44100));
    let pipeline = Pipeline::from_bytes(&bytes)
        .unwrap()
        .with_scheduler_config(SchedulerConfig::responsive());

    let handle = pipeline.spawn(EncodeConfig::vbr(4)).unwrap();
    let output = handle.wait().unwrap();
    assert!(output.len() > 1000);
}

#[test]
fn test_worker_cancel() {
    let bytes = wave_bytes(2, 44100, 16, &stereo_tone(200_000, 44100));
    let factory = Arc::new(ScriptedFactory::default());
    let pipeline = Pipeline::from_bytes(&bytes)
        .unwrap()
        .with_factory(factory.clone());

    let handle = pipeline.spawn(EncodeConfig::default()).unwrap();
    handle.cancel();
    assert!(handle.is_cancelled());

    // The worker may have finished before the flag was seen
    match handle.wait() {
        Err(TranscodeError::Cancelled) => assert_eq!(factory.log.lock().unwrap().flushes, 0),
        Ok(output) => assert!(!output.is_empty()),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_worker_events_end_with_finished() {
    let bytes = wave_bytes(1, 22050, 16, &[0; 2 * 30_000]);
    let pipeline = Pipeline::from_bytes(&bytes)
        .unwrap()
        .with_factory(Arc::new(ScriptedFactory::default()));

    let handle = pipeline.spawn(EncodeConfig::default()).unwrap();
    let mut progress_events = 0;
    loop {
        match handle.try_event() {
            Some(JobEvent::Progress { .. }) => progress_events += 1,
            Some(JobEvent::Finished) => break,
            None => std::thread::yield_now(),
        }
    }
    assert_eq!(progress_events, 3);
    assert!(handle.wait().is_ok());
}

#[test]
fn test_variants_share_one_decode() {
    let bytes = wave_bytes(2, 44100, 16, &stereo_tone(44_100, 44100));
    let pipeline = Pipeline::from_bytes(&bytes).unwrap();

    let results = pipeline.encode_variants(&[EncodeConfig::cbr(96), EncodeConfig::cbr(320)]);
    let sizes: Vec<usize> = results.into_iter().map(|r| r.unwrap().len()).collect();
    assert!(sizes[1] > sizes[0], "320k ({}) not larger than 96k ({})", sizes[1], sizes[0]);
}

#[test]
fn test_stereo_to_mono_then_encode() {
    let bytes = wave_bytes(2, 44100, 16, &stereo_tone(5_000, 44100));
    let factory = Arc::new(ScriptedFactory::default());
    let pipeline = Pipeline::from_bytes(&bytes)
        .unwrap()
        .with_factory(factory.clone());

    pipeline.to_mono().encode(&EncodeConfig::default(), NullSink).unwrap();

    let log = factory.log.lock().unwrap();
    assert_eq!(log.stereo_blocks, 0);
    assert_eq!(log.mono_blocks.len(), 5);
}
