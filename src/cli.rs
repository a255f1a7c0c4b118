use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{parse_input_kind, parse_sample_rate, Options};
use crate::logging::LogLevel;

/// Decode 3DO AIFF-C, ADP4 and SDX2 audio to raw 16-bit PCM
#[derive(Parser, Debug, Default)]
#[command(name = "aifcdec")]
#[command(version = "0.8.0")]
#[command(about = "Decode 3DO AIFF-C, ADP4 and SDX2 audio to raw 16-bit PCM", long_about = None)]
pub struct Cli {
    /// Input file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file for the decoded PCM (summary only when omitted)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Input kind (container, adp4, sdx2)
    #[arg(short, long, value_name = "KIND")]
    pub kind: Option<String>,

    /// Sample rate of headerless input in Hz
    #[arg(short, long, value_name = "HZ")]
    pub rate: Option<String>,

    /// Headerless input has two interleaved channels
    #[arg(long)]
    pub stereo: bool,

    /// Persistent decoder state file, read before and written after decoding
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Write little-endian PCM instead of big-endian
    #[arg(long = "little-endian")]
    pub little_endian: bool,

    /// Log level (nothing, user, error, warning, info, debug, all or 0-6)
    #[arg(short, long, value_name = "LEVEL")]
    pub verbose: Option<String>,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        opts.input = Some(self.input.clone());

        if let Some(ref output) = self.output {
            opts.output = Some(output.clone());
        }

        if let Some(ref kind) = self.kind {
            opts.input_kind = parse_input_kind(kind)?;
        }

        if let Some(ref rate) = self.rate {
            opts.sample_rate = parse_sample_rate(rate).context("Invalid --rate")?;
        }

        if self.stereo {
            opts.stereo = true;
        }

        if let Some(ref state) = self.state {
            opts.state_file = Some(state.clone());
        }

        if self.little_endian {
            opts.little_endian_output = true;
        }

        if let Some(ref level) = self.verbose {
            opts.log_level = LogLevel::parse(level)
                .with_context(|| format!("Invalid log level: {}", level))?;
        }

        Ok(opts)
    }
}
