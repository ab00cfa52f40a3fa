//! Error types for the transcoding pipeline

use thiserror::Error;

/// Container-level failures raised while walking a RIFF/WAVE buffer.
///
/// Every variant fails the whole parse; no partial `DecodedAudio` is ever
/// returned alongside one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid container: missing RIFF/WAVE signature")]
    InvalidContainer,

    #[error("Missing 'fmt ' chunk")]
    MissingFmtChunk,

    #[error("Missing 'data' chunk")]
    MissingDataChunk,

    #[error("Malformed 'fmt ' chunk: {size} bytes (need at least 16)")]
    MalformedFmtChunk { size: u32 },

    #[error("Unsupported format tag {0:#06x} (only PCM = 0x0001 is supported)")]
    UnsupportedFormat(u16),

    #[error("Unsupported bit depth: {0} (expected 8, 16, 24 or 32)")]
    UnsupportedBitDepth(u16),

    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(u16),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
}

/// Coarse error classes, used by hosts to tell the user which stage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad input container, detected before any encode work
    Container,
    /// Unsupported bit depth or invalid encode settings
    Configuration,
    /// Encoder init/encode/flush failure mid-job
    Encoder,
    /// Job stopped at a batch boundary by its cancel token
    Cancelled,
    /// I/O or worker-thread failure
    Resource,
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported channel layout: {0} channels (mono or stereo only)")]
    UnsupportedChannelLayout(u16),

    #[error("Encoder expects {encoder} channels, audio has {audio}")]
    ChannelMismatch { encoder: u16, audio: usize },

    #[error("Encoder initialization failed: {0}")]
    EncoderInit(String),

    #[error("Encoding failed at frame {frame_offset}: {message}")]
    EncodeBlock { frame_offset: usize, message: String },

    #[error("Encoder flush failed: {0}")]
    Flush(String),

    #[error("Job cancelled")]
    Cancelled,

    #[error("Job already finished")]
    JobFinished,

    #[error("Encode worker panicked")]
    WorkerPanicked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV write error: {0}")]
    WavWrite(String),
}

impl TranscodeError {
    /// Error class for this failure
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse(ParseError::UnsupportedBitDepth(_)) => ErrorCategory::Configuration,
            Self::Parse(_) => ErrorCategory::Container,
            Self::InvalidConfig(_)
            | Self::UnsupportedChannelLayout(_)
            | Self::ChannelMismatch { .. } => ErrorCategory::Configuration,
            Self::EncoderInit(_) | Self::EncodeBlock { .. } | Self::Flush(_) => {
                ErrorCategory::Encoder
            }
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::JobFinished | Self::WorkerPanicked | Self::Io(_) | Self::WavWrite(_) => {
                ErrorCategory::Resource
            }
        }
    }

    /// Short label of the pipeline stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::InvalidConfig(_)
            | Self::UnsupportedChannelLayout(_)
            | Self::ChannelMismatch { .. } => "configure",
            Self::EncoderInit(_) => "encoder init",
            Self::EncodeBlock { .. } => "encode",
            Self::Flush(_) => "flush",
            Self::Cancelled | Self::JobFinished | Self::WorkerPanicked => "schedule",
            Self::Io(_) => "io",
            Self::WavWrite(_) => "wav write",
        }
    }
}

impl From<hound::Error> for TranscodeError {
    fn from(err: hound::Error) -> Self {
        TranscodeError::WavWrite(err.to_string())
    }
}

/// Result type for pipeline operations
pub type TranscodeResult<T> = Result<T, TranscodeError>;
