//! 3DO SDX2 decoder
//!
//! SDX2 ("squareroot-delta-exact") stores one signed byte per sample. The
//! byte indexes a table of squared deltas; odd bytes add the delta to the
//! channel's previous sample, even bytes restart from zero. Stereo payloads
//! interleave the two channels byte by byte.

use std::io::{Read, Seek};

use log::{debug, warn};

use super::decoder::{check_pcm16_output, read_payload, DecodeError, DecodeResult};
use super::formats::CodecFlags;
use super::stream::{DecodedAudioBuffer, DecodedStream};
use super::tables::SDX2_SQUARE;

/// Previous sample of each channel. `last_sample2` is unused for mono.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sdx2State {
    pub last_sample1: i16,
    pub last_sample2: i16,
}

impl Sdx2State {
    pub fn new(last_sample1: i16, last_sample2: i16) -> Self {
        Self {
            last_sample1,
            last_sample2,
        }
    }

    /// Serialize as two big-endian `i16` values, first channel first
    pub fn to_be_bytes(&self) -> [u8; 4] {
        let a = self.last_sample1.to_be_bytes();
        let b = self.last_sample2.to_be_bytes();
        [a[0], a[1], b[0], b[1]]
    }

    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self::new(
            i16::from_be_bytes([bytes[0], bytes[1]]),
            i16::from_be_bytes([bytes[2], bytes[3]]),
        )
    }
}

/// Decode one compressed byte against a channel's previous sample.
///
/// The sum wraps on overflow rather than saturating; real 3DO content is
/// decoded the same way.
pub fn decode_byte(compressed: i8, last_sample: &mut i16) -> i16 {
    let delta = SDX2_SQUARE[(compressed as i16 + 128) as usize];
    let sample = if compressed & 1 != 0 {
        last_sample.wrapping_add(delta)
    } else {
        delta
    };
    *last_sample = sample;
    sample
}

fn check_flags(flags: CodecFlags, compressed_size: u64) -> DecodeResult<()> {
    check_pcm16_output("SDX2", flags)?;
    if flags.is_stereo() && compressed_size % 2 != 0 {
        return Err(DecodeError::UnsupportedConfiguration(format!(
            "SDX2: stereo data has an odd length of {} bytes",
            compressed_size
        )));
    }
    Ok(())
}

/// Decode a whole SDX2 payload into big-endian 16-bit PCM.
///
/// The output is exactly twice the size of `compressed`.
pub fn decode_sdx2_buffer(
    compressed: &[u8],
    sample_rate: u32,
    flags: CodecFlags,
    state: &mut Sdx2State,
) -> DecodeResult<DecodedAudioBuffer> {
    check_flags(flags, compressed.len() as u64)?;

    let out_len = compressed.len().checked_mul(2).ok_or_else(|| {
        DecodeError::SizeInvariant(format!(
            "SDX2: {} compressed bytes overflow the output size",
            compressed.len()
        ))
    })?;

    let mut data = Vec::with_capacity(out_len);
    if flags.is_stereo() {
        for frame in compressed.chunks_exact(2) {
            let left = decode_byte(frame[0] as i8, &mut state.last_sample1);
            let right = decode_byte(frame[1] as i8, &mut state.last_sample2);
            data.extend_from_slice(&left.to_be_bytes());
            data.extend_from_slice(&right.to_be_bytes());
        }
    } else {
        for &byte in compressed {
            let sample = decode_byte(byte as i8, &mut state.last_sample1);
            data.extend_from_slice(&sample.to_be_bytes());
        }
    }

    Ok(DecodedAudioBuffer::new(data, sample_rate, flags.channels()))
}

/// Read `compressed_size` bytes from `stream` and decode them up front.
///
/// State handling and stream ownership follow
/// [`try_decode_adp4`](super::adp4::try_decode_adp4).
pub fn try_decode_sdx2<R: Read + Seek>(
    mut stream: R,
    compressed_size: u64,
    sample_rate: u32,
    flags: CodecFlags,
    state: Option<&mut Sdx2State>,
) -> DecodeResult<DecodedStream<Sdx2State>> {
    check_flags(flags, compressed_size)?;

    let compressed = read_payload(&mut stream, compressed_size)?;

    let mut scratch = Sdx2State::default();
    let state = match state {
        Some(state) => state,
        None => &mut scratch,
    };
    let initial = *state;
    let buffer = decode_sdx2_buffer(&compressed, sample_rate, flags, state)?;

    debug!(
        "SDX2: decoded {} bytes into {} samples at {} Hz, {} channel(s)",
        compressed.len(),
        buffer.sample_count(),
        sample_rate,
        buffer.channels()
    );
    Ok(DecodedStream::new(buffer, initial, *state))
}

/// Like [`try_decode_sdx2`], but reports failures as a warning and `None`.
pub fn decode_sdx2<R: Read + Seek>(
    stream: R,
    compressed_size: u64,
    sample_rate: u32,
    flags: CodecFlags,
    state: Option<&mut Sdx2State>,
) -> Option<DecodedStream<Sdx2State>> {
    match try_decode_sdx2(stream, compressed_size, sample_rate, flags, state) {
        Ok(stream) => Some(stream),
        Err(err) => {
            warn!("SDX2 decode failed: {}", err);
            None
        }
    }
}
