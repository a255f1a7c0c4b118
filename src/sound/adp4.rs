//! 3DO ADP4 decoder
//!
//! ADP4 is the 3DO flavour of 4-bit IMA ADPCM. Each compressed byte holds
//! two nibbles, high nibble first, and each nibble expands to one signed
//! 16-bit sample. Only mono payloads are supported.
//!
//! The decoder keeps no state of its own: the running prediction lives in
//! an [`Adp4State`] owned by the caller, so decoding can be resumed across
//! separate calls over consecutive pieces of a payload.

use std::io::{Read, Seek};

use log::{debug, warn};

use super::decoder::{check_pcm16_output, read_payload, DecodeError, DecodeResult};
use super::formats::CodecFlags;
use super::stream::{DecodedAudioBuffer, DecodedStream};
use super::tables::{ADP4_MAX_STEP_INDEX, ADP4_STEP_INDEX_DELTA, ADP4_STEP_SIZE};

/// Running ADP4 prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Adp4State {
    pub last_sample: i16,
    /// Index into the step size table, kept within `0..=88`
    pub step_index: i16,
}

impl Adp4State {
    pub fn new(last_sample: i16, step_index: i16) -> Self {
        Self {
            last_sample,
            step_index: step_index.clamp(0, ADP4_MAX_STEP_INDEX),
        }
    }

    /// Serialize as two big-endian `i16` values: last sample, step index
    pub fn to_be_bytes(&self) -> [u8; 4] {
        let s = self.last_sample.to_be_bytes();
        let i = self.step_index.to_be_bytes();
        [s[0], s[1], i[0], i[1]]
    }

    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self::new(
            i16::from_be_bytes([bytes[0], bytes[1]]),
            i16::from_be_bytes([bytes[2], bytes[3]]),
        )
    }
}

/// Decode one nibble, updating `state`.
pub fn decode_nibble(nibble: u8, state: &mut Adp4State) -> i16 {
    let nibble = nibble & 0x0F;
    let index = state.step_index.clamp(0, ADP4_MAX_STEP_INDEX);
    let step = ADP4_STEP_SIZE[index as usize] as i32;

    let mut delta = step >> 3;
    if nibble & 0x01 != 0 {
        delta += step >> 2;
    }
    if nibble & 0x02 != 0 {
        delta += step >> 1;
    }
    if nibble & 0x04 != 0 {
        delta += step;
    }

    let last = state.last_sample as i32;
    let sample = if nibble & 0x08 != 0 {
        last - delta
    } else {
        last + delta
    };
    state.last_sample = sample.clamp(i16::MIN as i32, i16::MAX as i32) as i16;

    // The sign bit does not take part in the index adjustment.
    let index = index + ADP4_STEP_INDEX_DELTA[(nibble & 0x07) as usize];
    state.step_index = index.clamp(0, ADP4_MAX_STEP_INDEX);

    state.last_sample
}

fn check_flags(flags: CodecFlags) -> DecodeResult<()> {
    check_pcm16_output("ADP4", flags)?;
    if flags.is_stereo() {
        return Err(DecodeError::UnsupportedConfiguration(
            "ADP4: stereo data is unsupported".to_string(),
        ));
    }
    Ok(())
}

/// Decode a whole ADP4 payload into big-endian 16-bit PCM.
///
/// The output is exactly four times the size of `compressed`.
pub fn decode_adp4_buffer(
    compressed: &[u8],
    sample_rate: u32,
    flags: CodecFlags,
    state: &mut Adp4State,
) -> DecodeResult<DecodedAudioBuffer> {
    check_flags(flags)?;

    let out_len = compressed.len().checked_mul(4).ok_or_else(|| {
        DecodeError::SizeInvariant(format!(
            "ADP4: {} compressed bytes overflow the output size",
            compressed.len()
        ))
    })?;

    let mut data = Vec::with_capacity(out_len);
    for &byte in compressed {
        data.extend_from_slice(&decode_nibble(byte >> 4, state).to_be_bytes());
        data.extend_from_slice(&decode_nibble(byte & 0x0F, state).to_be_bytes());
    }

    Ok(DecodedAudioBuffer::new(data, sample_rate, 1))
}

/// Read `compressed_size` bytes from `stream` and decode them up front.
///
/// When `state` is given decoding continues from it and leaves it holding
/// the state after the last byte; otherwise decoding starts from silence.
/// The stream is consumed and dropped when this returns; pass `&mut stream`
/// to keep it.
pub fn try_decode_adp4<R: Read + Seek>(
    mut stream: R,
    compressed_size: u64,
    sample_rate: u32,
    flags: CodecFlags,
    state: Option<&mut Adp4State>,
) -> DecodeResult<DecodedStream<Adp4State>> {
    check_flags(flags)?;

    let compressed = read_payload(&mut stream, compressed_size)?;

    let mut scratch = Adp4State::default();
    let state = match state {
        Some(state) => state,
        None => &mut scratch,
    };
    let initial = *state;
    let buffer = decode_adp4_buffer(&compressed, sample_rate, flags, state)?;

    debug!(
        "ADP4: decoded {} bytes into {} samples at {} Hz",
        compressed.len(),
        buffer.sample_count(),
        sample_rate
    );
    Ok(DecodedStream::new(buffer, initial, *state))
}

/// Like [`try_decode_adp4`], but reports failures as a warning and `None`.
pub fn decode_adp4<R: Read + Seek>(
    stream: R,
    compressed_size: u64,
    sample_rate: u32,
    flags: CodecFlags,
    state: Option<&mut Adp4State>,
) -> Option<DecodedStream<Adp4State>> {
    match try_decode_adp4(stream, compressed_size, sample_rate, flags, state) {
        Ok(stream) => Some(stream),
        Err(err) => {
            warn!("ADP4 decode failed: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::decoder::PlaybackStream;
    use proptest::prelude::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[test]
    fn test_zero_nibble_from_silence() {
        let mut state = Adp4State::default();
        assert_eq!(decode_nibble(0x0, &mut state), 0);
        assert_eq!(state, Adp4State::new(0, 0));
    }

    #[test]
    fn test_full_nibble_from_silence() {
        // step 7: 0 + 1 + 3 + 7 = 11, negated by the sign bit
        let mut state = Adp4State::default();
        assert_eq!(decode_nibble(0xF, &mut state), -11);
        assert_eq!(state, Adp4State::new(-11, 8));
    }

    #[test]
    fn test_nibble_ignores_high_bits() {
        let mut a = Adp4State::default();
        let mut b = Adp4State::default();
        assert_eq!(decode_nibble(0x35, &mut a), decode_nibble(0x05, &mut b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_clamps_high() {
        let mut state = Adp4State::new(32000, 88);
        assert_eq!(decode_nibble(0x7, &mut state), i16::MAX);
        assert_eq!(state.step_index, 88);
    }

    #[test]
    fn test_sample_clamps_low() {
        let mut state = Adp4State::new(-32000, 88);
        assert_eq!(decode_nibble(0xF, &mut state), i16::MIN);
    }

    #[test]
    fn test_buffer_two_bytes() {
        let mut state = Adp4State::default();
        let buf = decode_adp4_buffer(&[0x0F, 0x00], 22050, CodecFlags::SIXTEEN_BIT, &mut state)
            .unwrap();
        // 0x0 -> 0, 0xF -> -11, then step 16 -> -9, step 14 -> -8
        assert_eq!(buf.samples().collect::<Vec<_>>(), vec![0, -11, -9, -8]);
        assert_eq!(
            buf.as_bytes(),
            &[0x00, 0x00, 0xFF, 0xF5, 0xFF, 0xF7, 0xFF, 0xF8]
        );
        assert_eq!(state, Adp4State::new(-8, 6));
        assert_eq!(buf.channels(), 1);
        assert_eq!(buf.sample_rate(), 22050);
    }

    #[rstest]
    #[case::unsigned(CodecFlags::SIXTEEN_BIT | CodecFlags::UNSIGNED)]
    #[case::eight_bit(CodecFlags::empty())]
    #[case::little_endian(CodecFlags::SIXTEEN_BIT | CodecFlags::LITTLE_ENDIAN)]
    #[case::stereo(CodecFlags::SIXTEEN_BIT | CodecFlags::STEREO)]
    fn test_rejected_flags(#[case] flags: CodecFlags) {
        let mut state = Adp4State::new(100, 10);
        let result = decode_adp4_buffer(&[0x12, 0x34], 22050, flags, &mut state);
        assert!(matches!(result, Err(DecodeError::UnsupportedConfiguration(_))));
        // Nothing decoded, state untouched
        assert_eq!(state, Adp4State::new(100, 10));
    }

    #[test]
    fn test_rejected_flags_before_reading_stream() {
        let mut cursor = Cursor::new(vec![0u8; 8]);
        let result = try_decode_adp4(&mut cursor, 100, 22050, CodecFlags::pcm16(true), None);
        assert!(matches!(result, Err(DecodeError::UnsupportedConfiguration(_))));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_size_larger_than_stream() {
        let cursor = Cursor::new(vec![0u8; 8]);
        let result = try_decode_adp4(cursor, 9, 22050, CodecFlags::SIXTEEN_BIT, None);
        assert!(matches!(result, Err(DecodeError::SizeInvariant(_))));
    }

    #[test]
    fn test_stream_reads_from_current_position() {
        let mut cursor = Cursor::new(vec![0xAA, 0x0F, 0x00, 0xBB]);
        cursor.set_position(1);
        let stream = try_decode_adp4(&mut cursor, 2, 11025, CodecFlags::SIXTEEN_BIT, None)
            .unwrap();
        assert_eq!(cursor.position(), 3);
        assert_eq!(
            stream.buffer().samples().collect::<Vec<_>>(),
            vec![0, -11, -9, -8]
        );
        assert_eq!(stream.initial_state(), Adp4State::default());
        assert_eq!(stream.final_state(), Adp4State::new(-8, 6));
        assert_eq!(stream.sample_rate(), 11025);
        assert!(!stream.is_stereo());
    }

    #[test]
    fn test_persistent_state_continues_across_calls() {
        let payload = [0x7F, 0x31, 0xC4, 0x08, 0x77, 0x90];

        let mut whole_state = Adp4State::default();
        let whole =
            decode_adp4_buffer(&payload, 22050, CodecFlags::SIXTEEN_BIT, &mut whole_state)
                .unwrap();

        let mut state = Adp4State::default();
        let first = try_decode_adp4(
            Cursor::new(&payload[..3]),
            3,
            22050,
            CodecFlags::SIXTEEN_BIT,
            Some(&mut state),
        )
        .unwrap();
        let second = try_decode_adp4(
            Cursor::new(&payload[3..]),
            3,
            22050,
            CodecFlags::SIXTEEN_BIT,
            Some(&mut state),
        )
        .unwrap();

        let mut joined = first.buffer().as_bytes().to_vec();
        joined.extend_from_slice(second.buffer().as_bytes());
        assert_eq!(joined, whole.as_bytes());
        assert_eq!(state, whole_state);
        assert_eq!(second.initial_state(), first.final_state());
    }

    #[test]
    fn test_restore_initial_state_reproduces_output() {
        let payload = [0x12, 0x9A, 0xFF, 0x03];
        let mut state = Adp4State::new(1000, 20);
        let first = try_decode_adp4(
            Cursor::new(payload),
            4,
            22050,
            CodecFlags::SIXTEEN_BIT,
            Some(&mut state),
        )
        .unwrap();
        assert_ne!(state, first.initial_state());

        first.restore_initial_state(&mut state);
        let again = try_decode_adp4(
            Cursor::new(payload),
            4,
            22050,
            CodecFlags::SIXTEEN_BIT,
            Some(&mut state),
        )
        .unwrap();
        assert_eq!(first.buffer(), again.buffer());
    }

    #[test]
    fn test_decode_adp4_none_on_failure() {
        let cursor = Cursor::new(vec![0u8; 4]);
        assert!(decode_adp4(cursor, 4, 22050, CodecFlags::UNSIGNED, None).is_none());
    }

    #[test]
    fn test_state_bytes() {
        let state = Adp4State::new(-2, 40);
        assert_eq!(state.to_be_bytes(), [0xFF, 0xFE, 0x00, 40]);
        assert_eq!(Adp4State::from_be_bytes(state.to_be_bytes()), state);
        // Out-of-range step index is pulled back into the table
        assert_eq!(Adp4State::from_be_bytes([0, 0, 0x7F, 0xFF]).step_index, 88);
    }

    proptest! {
        #[test]
        fn prop_step_index_stays_in_table(
            start in 0i16..=88,
            last in any::<i16>(),
            nibbles in proptest::collection::vec(0u8..16, 0..2000)
        ) {
            let mut state = Adp4State::new(last, start);
            for nibble in nibbles {
                decode_nibble(nibble, &mut state);
                prop_assert!(state.step_index >= 0 && state.step_index <= 88);
            }
        }

        #[test]
        fn prop_output_is_four_times_input(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut state = Adp4State::default();
            let buf =
                decode_adp4_buffer(&data, 22050, CodecFlags::SIXTEEN_BIT, &mut state).unwrap();
            prop_assert_eq!(buf.len(), data.len() * 4);
        }

        #[test]
        fn prop_decoding_is_deterministic(
            data in proptest::collection::vec(any::<u8>(), 0..256),
            last in any::<i16>(),
            index in 0i16..=88
        ) {
            let mut a = Adp4State::new(last, index);
            let mut b = a;
            let first = decode_adp4_buffer(&data, 22050, CodecFlags::SIXTEEN_BIT, &mut a).unwrap();
            let second = decode_adp4_buffer(&data, 22050, CodecFlags::SIXTEEN_BIT, &mut b).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(a, b);
        }
    }
}
