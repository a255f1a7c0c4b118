use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use uqm_3do_audio::cli::Cli;
use uqm_3do_audio::config::{self, InputKind, Options};
use uqm_3do_audio::logging::{self, LogLevel};
use uqm_3do_audio::sound::{
    decode_adp4, decode_container, decode_sdx2, Adp4State, CodecFlags, PlaybackStream, Sdx2State,
};

/// What one run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Summary {
    channels: u16,
    sample_rate: u32,
    samples: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = load_options(&cli, |level| {
        logging::log_init(level);
    })?;

    let summary = run(&options)?;
    info!(
        "Decoded {} samples, {} channel(s) at {} Hz",
        summary.samples, summary.channels, summary.sample_rate
    );
    Ok(())
}

/// Install logging, then load the config file and merge the command line.
///
/// Logging starts at the `-v` level so that config file warnings are seen;
/// the final level is applied once the config has been merged.
fn load_options(cli: &Cli, init_logging: impl FnOnce(LogLevel)) -> Result<Options> {
    let early = cli
        .verbose
        .as_deref()
        .and_then(LogLevel::parse)
        .unwrap_or_default();
    init_logging(early);

    let options = match cli.config {
        Some(ref path) => config::load_config(path)?,
        None => Options::default(),
    };
    let options = cli.merge_into_options(options)?;

    logging::set_log_level(options.log_level);
    Ok(options)
}

fn run(opts: &Options) -> Result<Summary> {
    let input = opts.input.as_deref().context("No input file given")?;
    let file =
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;

    match opts.input_kind {
        InputKind::Container => {
            if opts.state_file.is_some() {
                warn!("Decoder state is only used with headerless input, ignoring --state");
            }
            let stream = decode_container(file)
                .with_context(|| format!("Failed to decode {}", input.display()))?;
            write_output(stream, opts)
        }
        InputKind::Adp4 => {
            let size = file.metadata()?.len();
            let mut state = load_state(opts.state_file.as_deref(), Adp4State::from_be_bytes)?;
            let flags = CodecFlags::pcm16(opts.stereo);
            let stream = decode_adp4(file, size, opts.sample_rate, flags, Some(&mut state))
                .with_context(|| format!("Failed to decode ADP4 data in {}", input.display()))?;
            save_state(opts.state_file.as_deref(), state.to_be_bytes())?;
            write_output(stream, opts)
        }
        InputKind::Sdx2 => {
            let size = file.metadata()?.len();
            let mut state = load_state(opts.state_file.as_deref(), Sdx2State::from_be_bytes)?;
            let flags = CodecFlags::pcm16(opts.stereo);
            let stream = decode_sdx2(file, size, opts.sample_rate, flags, Some(&mut state))
                .with_context(|| format!("Failed to decode SDX2 data in {}", input.display()))?;
            save_state(opts.state_file.as_deref(), state.to_be_bytes())?;
            write_output(stream, opts)
        }
    }
}

/// Read a 4-byte decoder state, or the default when there is no file yet
fn load_state<S: Default>(path: Option<&Path>, from_bytes: fn([u8; 4]) -> S) -> Result<S> {
    let Some(path) = path else {
        return Ok(S::default());
    };
    if !path.exists() {
        return Ok(S::default());
    }
    let data = fs::read(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    let bytes: [u8; 4] = data
        .as_slice()
        .try_into()
        .with_context(|| format!("State file {} must hold exactly 4 bytes", path.display()))?;
    Ok(from_bytes(bytes))
}

fn save_state(path: Option<&Path>, bytes: [u8; 4]) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, bytes)
            .with_context(|| format!("Failed to write state file {}", path.display()))?;
    }
    Ok(())
}

/// Drain `stream`, writing the samples to the configured output if any
fn write_output<P: PlaybackStream>(mut stream: P, opts: &Options) -> Result<Summary> {
    let mut writer = match opts.output {
        Some(ref path) => Some(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => None,
    };

    let mut buf = [0i16; 4096];
    let mut samples = 0;
    loop {
        let n = stream.read_samples(&mut buf);
        if n == 0 {
            break;
        }
        samples += n;
        if let Some(ref mut w) = writer {
            for &sample in &buf[..n] {
                let bytes = if opts.little_endian_output {
                    sample.to_le_bytes()
                } else {
                    sample.to_be_bytes()
                };
                w.write_all(&bytes)?;
            }
        }
    }
    if let Some(mut w) = writer {
        w.flush()?;
    }

    Ok(Summary {
        channels: stream.channels(),
        sample_rate: stream.sample_rate(),
        samples,
    })
}
