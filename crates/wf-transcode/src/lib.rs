//! WF-Transcode — PCM WAVE to compressed audio
//!
//! Turns raw RIFF/WAVE bytes into an MP3 stream without blocking the caller
//! for the whole job:
//! - RIFF/WAVE chunk parsing (8/16/24/32-bit integer PCM)
//! - Normalization to canonical 16-bit samples per channel
//! - Block encoding through a pluggable codec (LAME in production)
//! - Batched, resumable scheduling with progress and cancellation
//! - Stereo-to-mono downmix and channel separation to WAV
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Pipeline                               │
//! │                                                                  │
//! │  ┌───────────┐   ┌────────────┐   ┌────────────┐   ┌──────────┐ │
//! │  │ Container │ → │ Normalizer │ → │ Scheduler  │ → │Assembler │ │
//! │  │  Parser   │   │ (→ i16)    │   │ (batches)  │   │ (concat) │ │
//! │  └───────────┘   └────────────┘   └─────┬──────┘   └──────────┘ │
//! │                                         │ 1152-sample blocks    │
//! │                                   ┌─────▼──────┐                │
//! │                                   │BlockEncoder│ → BlockCodec   │
//! │                                   └────────────┘                │
//! │                                                                  │
//! │  step() by caller │ worker thread + channel │ rayon variants    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wf_transcode::{EncodeConfig, Pipeline};
//!
//! let pipeline = Pipeline::open("input.wav")?;
//! let mp3 = pipeline.encode(&EncodeConfig::cbr(192), |pct: f64, stage: &str| {
//!     eprintln!("{stage}: {pct:.0}%");
//! })?;
//! std::fs::write("output.mp3", mp3.into_bytes())?;
//! ```

mod assembler;
mod audio;
mod codec;
mod config;
mod container;
mod encoder;
mod error;
mod format;
mod job;
mod normalize;
mod pipeline;
mod progress;
mod scheduler;
mod wav;
mod worker;

pub use assembler::*;
pub use audio::*;
pub use codec::*;
pub use config::*;
pub use container::*;
pub use encoder::*;
pub use error::*;
pub use format::*;
pub use job::*;
pub use normalize::*;
pub use pipeline::*;
pub use progress::*;
pub use scheduler::*;
pub use wav::*;
pub use worker::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
