use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::logging::LogLevel;

/// How the input file is to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    /// AIFF or AIFF-C container
    #[default]
    Container,
    /// Headerless ADP4 payload
    Adp4,
    /// Headerless SDX2 payload
    Sdx2,
}

/// Decoder options that can be set via CLI or config file
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    // Commandline-only options
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub state_file: Option<PathBuf>,

    // Commandline and config file options
    pub input_kind: InputKind,
    /// Sample rate of headerless input, in Hz
    pub sample_rate: u32,
    /// Headerless input has two interleaved channels
    pub stereo: bool,
    pub little_endian_output: bool,
    pub log_level: LogLevel,
}

pub const DEFAULT_SAMPLE_RATE: u32 = 22050;
pub const MAX_SAMPLE_RATE: u32 = 192000;

impl Default for Options {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            state_file: None,
            input_kind: InputKind::Container,
            sample_rate: DEFAULT_SAMPLE_RATE,
            stereo: false,
            little_endian_output: false,
            log_level: LogLevel::default(),
        }
    }
}

/// Load options from a `key = value` config file.
///
/// A missing file yields the defaults. Unknown keys are reported and
/// skipped.
pub fn load_config(path: &Path) -> Result<Options> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Options::default());
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read config file {}", path.display()))
        }
    };
    parse_config(&data).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Parse config file contents on top of the default options
pub fn parse_config(data: &str) -> Result<Options> {
    let mut opts = Options::default();

    for (lineno, line) in data.lines().enumerate() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::warn!("Config line {}: key without value", lineno + 1);
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "input.kind" => opts.input_kind = parse_input_kind(value)?,
            "input.rate" => opts.sample_rate = parse_sample_rate(value)?,
            "input.stereo" => opts.stereo = parse_bool(value)?,
            "output.little_endian" => opts.little_endian_output = parse_bool(value)?,
            "log.level" => {
                opts.log_level = LogLevel::parse(value)
                    .with_context(|| format!("Invalid log level: {}", value))?
            }
            _ => log::warn!("Config line {}: ignoring unknown key '{}'", lineno + 1, key),
        }
    }

    Ok(opts)
}

/// Parse an input kind (container, adp4, sdx2)
pub fn parse_input_kind(s: &str) -> Result<InputKind> {
    match s.to_lowercase().as_str() {
        "container" | "aiff" | "aifc" => Ok(InputKind::Container),
        "adp4" => Ok(InputKind::Adp4),
        "sdx2" => Ok(InputKind::Sdx2),
        _ => anyhow::bail!(
            "Invalid input kind: {}. Valid options: container, adp4, sdx2",
            s
        ),
    }
}

/// Parse a sample rate in Hz
pub fn parse_sample_rate(s: &str) -> Result<u32> {
    let rate: u32 = s.trim().parse().context("Invalid sample rate value")?;
    if rate == 0 || rate > MAX_SAMPLE_RATE {
        anyhow::bail!("Sample rate out of range (1 to {})", MAX_SAMPLE_RATE);
    }
    Ok(rate)
}

/// Parse a boolean option value
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("Invalid boolean value: {}", s),
    }
}
