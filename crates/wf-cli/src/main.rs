//! WavForge command-line converter
//!
//! Usage:
//!   wavforge probe <input.wav> [--json]        - Show format and duration
//!   wavforge encode <input.wav> -o <out.mp3>   - Encode to MP3 (CBR or VBR)
//!   wavforge mono <input.wav> -o <out.wav>     - Downmix to mono WAV
//!   wavforge split <input.wav> -o <dir>        - One WAV per channel

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use wf_transcode::{
    DecodedAudio, EncodeConfig, JobEvent, Pipeline, SchedulerConfig, write_wav_file,
};

#[derive(Parser)]
#[command(name = "wavforge", version, about = "WavForge PCM converter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show format, frame count and duration
    Probe {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Encode to MP3
    Encode {
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// CBR bitrate in kbps
        #[arg(short, long, default_value_t = 128, conflicts_with = "vbr")]
        bitrate: u32,
        /// VBR quality, 0 (best) to 9 (smallest)
        #[arg(long)]
        vbr: Option<u8>,
        /// Downmix to mono before encoding
        #[arg(long)]
        mono: bool,
        /// Blocks of 1152 frames per progress step
        #[arg(long, default_value_t = wf_transcode::DEFAULT_BLOCKS_PER_BATCH)]
        batch_blocks: usize,
        /// Print the effective settings as JSON before encoding
        #[arg(long)]
        print_config: bool,
    },
    /// Downmix all channels to a mono WAV
    Mono {
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write each channel to its own mono WAV
    Split {
        input: PathBuf,
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { input, json } => probe(&input, json),
        Commands::Encode {
            input,
            output,
            bitrate,
            vbr,
            mono,
            batch_blocks,
            print_config,
        } => {
            let config = encode_config(bitrate, vbr);
            let scheduler = SchedulerConfig::default().with_blocks_per_batch(batch_blocks);
            encode(&input, &output, config, scheduler, mono, print_config)
        }
        Commands::Mono { input, output } => mono(&input, &output),
        Commands::Split { input, output } => split(&input, &output),
    }
}

fn open(input: &Path) -> Result<Pipeline> {
    Pipeline::open(input).with_context(|| format!("Failed to read {}", input.display()))
}

#[derive(Serialize)]
struct ProbeReport {
    path: String,
    channels: usize,
    sample_rate: u32,
    bits_per_sample: u16,
    frames: usize,
    duration_seconds: f64,
    duration: String,
}

impl ProbeReport {
    fn new(path: &Path, audio: &DecodedAudio) -> Self {
        Self {
            path: path.display().to_string(),
            channels: audio.num_channels(),
            sample_rate: audio.sample_rate(),
            bits_per_sample: audio.format().bits_per_sample,
            frames: audio.frame_count(),
            duration_seconds: audio.duration_seconds(),
            duration: audio.duration_str(),
        }
    }
}

fn probe(input: &Path, json: bool) -> Result<()> {
    let pipeline = open(input)?;
    let report = ProbeReport::new(input, pipeline.decoded());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.path);
        println!("  Channels:    {}", report.channels);
        println!("  Sample rate: {} Hz", report.sample_rate);
        println!("  Bit depth:   {}", report.bits_per_sample);
        println!("  Frames:      {}", report.frames);
        println!("  Duration:    {}", report.duration);
    }
    Ok(())
}

/// CLI flags to encoder settings; `--vbr` wins over `--bitrate`
fn encode_config(bitrate: u32, vbr: Option<u8>) -> EncodeConfig {
    match vbr {
        Some(quality) => EncodeConfig::vbr(quality),
        None => EncodeConfig::cbr(bitrate),
    }
}

#[derive(Serialize)]
struct EffectiveConfig<'a> {
    encode: &'a EncodeConfig,
    scheduler: &'a SchedulerConfig,
    mono: bool,
}

fn encode(
    input: &Path,
    output: &Path,
    config: EncodeConfig,
    scheduler: SchedulerConfig,
    mono: bool,
    print_config: bool,
) -> Result<()> {
    config.validate()?;

    if print_config {
        let effective = EffectiveConfig {
            encode: &config,
            scheduler: &scheduler,
            mono,
        };
        println!("{}", serde_json::to_string_pretty(&effective)?);
    }

    let mut pipeline = open(input)?.with_scheduler_config(scheduler);
    if mono {
        pipeline = pipeline.to_mono();
    }

    log::info!(
        "Encoding {} ({} ch, {}) at {}",
        input.display(),
        pipeline.decoded().num_channels(),
        pipeline.decoded().duration_str(),
        config.describe()
    );

    let handle = pipeline.spawn(config)?;
    while let Some(JobEvent::Progress { percent, stage }) = handle.next_event() {
        eprint!("\r{}: {:5.1}%", stage, percent);
        let _ = std::io::stderr().flush();
    }
    eprintln!();

    let result = handle.wait();

    let encoded = result.with_context(|| format!("Encoding {} failed", input.display()))?;
    write_output(output, &encoded.bytes)?;

    println!("Wrote {} ({} bytes)", output.display(), encoded.len());
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn mono(input: &Path, output: &Path) -> Result<()> {
    let pipeline = open(input)?;
    if pipeline.decoded().num_channels() == 1 {
        log::warn!("{} is already mono; copying samples", input.display());
    }

    let mono = pipeline.to_mono();
    write_wav_file(mono.decoded(), output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

/// `<dir>/<stem>_ch<N>.wav`, channels numbered from 1
fn channel_path(dir: &Path, input: &Path, index: usize) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    dir.join(format!("{}_ch{}.wav", stem, index + 1))
}

fn split(input: &Path, dir: &Path) -> Result<()> {
    let pipeline = open(input)?;
    let channels = pipeline.split_channels();
    if channels.is_empty() {
        bail!("{} has no channels", input.display());
    }

    for (index, channel) in channels.iter().enumerate() {
        let path = channel_path(dir, input, index);
        write_wav_file(channel, &path)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
