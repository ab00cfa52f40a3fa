//! Caller-facing transcode API

use std::path::Path;
use std::sync::Arc;

use crate::audio::DecodedAudio;
use crate::codec::{CodecFactory, LameCodecFactory};
use crate::config::{EncodeConfig, SchedulerConfig};
use crate::container;
use crate::encoder::BlockEncoder;
use crate::error::TranscodeResult;
use crate::job::EncodedOutput;
use crate::progress::ProgressSink;
use crate::scheduler::EncodeScheduler;
use crate::worker::{self, JobHandle};

/// Encode `decoded` with the LAME codec and default batching
pub fn start<'a>(
    decoded: &'a DecodedAudio,
    config: EncodeConfig,
    sink: impl ProgressSink + 'a,
) -> TranscodeResult<EncodedOutput> {
    encode_with(
        decoded,
        &config,
        SchedulerConfig::default(),
        &LameCodecFactory,
        sink,
    )
}

/// Encode with an explicit codec factory and batch size
pub fn encode_with<'a>(
    decoded: &'a DecodedAudio,
    config: &EncodeConfig,
    scheduler_config: SchedulerConfig,
    factory: &dyn CodecFactory,
    sink: impl ProgressSink + 'a,
) -> TranscodeResult<EncodedOutput> {
    let encoder = BlockEncoder::init(
        factory,
        decoded.num_channels() as u16,
        decoded.sample_rate(),
        config,
    )?;
    log::info!(
        "Encoding {} frames ({} ch, {} Hz) at {}",
        decoded.frame_count(),
        decoded.num_channels(),
        decoded.sample_rate(),
        config.describe()
    );
    EncodeScheduler::new(decoded, encoder, scheduler_config, sink)?.run()
}

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// One decoded input plus the codec used to encode it.
///
/// Any number of jobs may run against the same decode; each gets its own
/// encoder handle.
pub struct Pipeline {
    decoded: Arc<DecodedAudio>,
    factory: Arc<dyn CodecFactory>,
    scheduler_config: SchedulerConfig,
}

impl Pipeline {
    /// Wrap already-decoded audio, encoding with LAME
    pub fn new(decoded: DecodedAudio) -> Self {
        Self {
            decoded: Arc::new(decoded),
            factory: Arc::new(LameCodecFactory),
            scheduler_config: SchedulerConfig::default(),
        }
    }

    /// Parse an in-memory WAVE file
    pub fn from_bytes(bytes: &[u8]) -> TranscodeResult<Self> {
        Ok(Self::new(container::parse(bytes)?))
    }

    /// Read and parse a WAVE file
    pub fn open(path: impl AsRef<Path>) -> TranscodeResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        log::debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(&bytes)
    }

    /// Use a different codec
    pub fn with_factory(mut self, factory: Arc<dyn CodecFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Set batch sizing
    pub fn with_scheduler_config(mut self, config: SchedulerConfig) -> Self {
        self.scheduler_config = config;
        self
    }

    pub fn decoded(&self) -> &DecodedAudio {
        &self.decoded
    }

    /// Shared handle to the decode
    pub fn shared_audio(&self) -> Arc<DecodedAudio> {
        self.decoded.clone()
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        self.scheduler_config
    }

    /// Extension of the encoded stream
    pub fn extension(&self) -> &'static str {
        self.factory.extension()
    }

    /// Run a full encode on the calling thread
    pub fn encode<'a>(
        &'a self,
        config: &EncodeConfig,
        sink: impl ProgressSink + 'a,
    ) -> TranscodeResult<EncodedOutput> {
        encode_with(
            &self.decoded,
            config,
            self.scheduler_config,
            self.factory.as_ref(),
            sink,
        )
    }

    /// Step-driven job; the caller calls `step()` between its own work
    pub fn scheduler<'a>(
        &'a self,
        config: &EncodeConfig,
        sink: impl ProgressSink + 'a,
    ) -> TranscodeResult<EncodeScheduler<'a>> {
        let encoder = BlockEncoder::init(
            self.factory.as_ref(),
            self.decoded.num_channels() as u16,
            self.decoded.sample_rate(),
            config,
        )?;
        EncodeScheduler::new(&self.decoded, encoder, self.scheduler_config, sink)
    }

    /// Encode on a background thread
    pub fn spawn(&self, config: EncodeConfig) -> TranscodeResult<JobHandle> {
        worker::spawn_job(
            self.decoded.clone(),
            config,
            self.scheduler_config,
            self.factory.clone(),
        )
    }

    /// Encode several configs in parallel; results follow `configs` order
    pub fn encode_variants(&self, configs: &[EncodeConfig]) -> Vec<TranscodeResult<EncodedOutput>> {
        worker::encode_variants(
            &self.decoded,
            configs,
            self.scheduler_config,
            self.factory.as_ref(),
        )
    }

    /// New pipeline over the mono downmix, same codec and batching
    pub fn to_mono(&self) -> Pipeline {
        Pipeline {
            decoded: Arc::new(self.decoded.downmix_to_mono()),
            factory: self.factory.clone(),
            scheduler_config: self.scheduler_config,
        }
    }

    /// One mono decode per source channel
    pub fn split_channels(&self) -> Vec<DecodedAudio> {
        self.decoded.split_channels()
    }
}
