//! In-memory playback streams
//!
//! Both 3DO codecs decode their whole payload up front. The result is a
//! [`DecodedAudioBuffer`] of big-endian 16-bit PCM, wrapped in a
//! [`DecodedStream`] that remembers the decoder state it started from.
//! Uncompressed container payloads are served by [`RawStream`].

use super::decoder::PlaybackStream;
use super::formats::CodecFlags;

/// Big-endian 16-bit PCM produced by one decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudioBuffer {
    data: Vec<u8>,
    sample_rate: u32,
    channels: u16,
}

impl DecodedAudioBuffer {
    pub fn new(data: Vec<u8>, sample_rate: u32, channels: u16) -> Self {
        Self {
            data,
            sample_rate,
            channels,
        }
    }

    /// Length of the buffer in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of 16-bit samples across all channels
    pub fn sample_count(&self) -> usize {
        self.data.len() / 2
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the sample at `index`, if present
    pub fn sample(&self, index: usize) -> Option<i16> {
        let ofs = index.checked_mul(2)?;
        let bytes = self.data.get(ofs..ofs.checked_add(2)?)?;
        Some(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Iterate over the decoded samples
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.data
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
    }
}

/// Playback adapter over a decoded buffer.
///
/// `S` is the codec's persistent state type. The state captured before
/// decoding started is kept alongside the state left after the last byte,
/// so a caller that persists decoder state can put it back and decode the
/// same payload again with identical results.
#[derive(Debug, Clone)]
pub struct DecodedStream<S> {
    buffer: DecodedAudioBuffer,
    /// Read position in samples
    pos: usize,
    initial_state: S,
    final_state: S,
}

impl<S: Copy> DecodedStream<S> {
    pub fn new(buffer: DecodedAudioBuffer, initial_state: S, final_state: S) -> Self {
        Self {
            buffer,
            pos: 0,
            initial_state,
            final_state,
        }
    }

    pub fn buffer(&self) -> &DecodedAudioBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> DecodedAudioBuffer {
        self.buffer
    }

    /// Decoder state at the start of the payload
    pub fn initial_state(&self) -> S {
        self.initial_state
    }

    /// Decoder state after the last payload byte
    pub fn final_state(&self) -> S {
        self.final_state
    }

    /// Write the captured initial state back into `state`
    pub fn restore_initial_state(&self, state: &mut S) {
        *state = self.initial_state;
    }

    /// Current read position in samples
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<S: Copy + Send> PlaybackStream for DecodedStream<S> {
    fn is_stereo(&self) -> bool {
        self.buffer.channels == 2
    }

    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    fn end_of_data(&self) -> bool {
        self.pos >= self.buffer.sample_count()
    }

    fn read_samples(&mut self, out: &mut [i16]) -> usize {
        let remaining = self.buffer.sample_count().saturating_sub(self.pos);
        let count = remaining.min(out.len());
        let start = self.pos * 2;
        let src = &self.buffer.data[start..start + count * 2];
        for (dst, pair) in out.iter_mut().zip(src.chunks_exact(2)) {
            *dst = i16::from_be_bytes([pair[0], pair[1]]);
        }
        self.pos += count;
        count
    }

    fn rewind(&mut self) {
        self.pos = 0;
    }
}

/// Uncompressed PCM stream in any layout `CodecFlags` can describe.
///
/// 8-bit samples are widened to 16 bits on read.
#[derive(Debug, Clone)]
pub struct RawStream {
    data: Vec<u8>,
    /// Read position in bytes
    pos: usize,
    sample_rate: u32,
    flags: CodecFlags,
}

impl RawStream {
    pub fn new(data: Vec<u8>, sample_rate: u32, flags: CodecFlags) -> Self {
        Self {
            data,
            pos: 0,
            sample_rate,
            flags,
        }
    }

    pub fn flags(&self) -> CodecFlags {
        self.flags
    }

    /// Total number of whole samples in the stream
    pub fn sample_count(&self) -> usize {
        self.data.len() / self.flags.bytes_per_sample()
    }

    fn sample_at(&self, ofs: usize) -> i16 {
        if self.flags.is_16bit() {
            let pair = [self.data[ofs], self.data[ofs + 1]];
            let value = if self.flags.is_little_endian() {
                u16::from_le_bytes(pair)
            } else {
                u16::from_be_bytes(pair)
            };
            if self.flags.is_unsigned() {
                (value ^ 0x8000) as i16
            } else {
                value as i16
            }
        } else {
            let byte = self.data[ofs];
            let signed = if self.flags.is_unsigned() {
                (byte ^ 0x80) as i8
            } else {
                byte as i8
            };
            (signed as i16) << 8
        }
    }
}

impl PlaybackStream for RawStream {
    fn is_stereo(&self) -> bool {
        self.flags.is_stereo()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn end_of_data(&self) -> bool {
        self.data.len() - self.pos < self.flags.bytes_per_sample()
    }

    fn read_samples(&mut self, out: &mut [i16]) -> usize {
        let width = self.flags.bytes_per_sample();
        let mut count = 0;
        for dst in out.iter_mut() {
            if self.data.len() - self.pos < width {
                break;
            }
            *dst = self.sample_at(self.pos);
            self.pos += width;
            count += 1;
        }
        count
    }

    fn rewind(&mut self) {
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be_buffer(samples: &[i16], channels: u16) -> DecodedAudioBuffer {
        let data = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
        DecodedAudioBuffer::new(data, 22050, channels)
    }

    #[test]
    fn test_buffer_accessors() {
        let buf = be_buffer(&[1, -2, 300], 1);
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.sample_count(), 3);
        assert_eq!(buf.sample(1), Some(-2));
        assert_eq!(buf.sample(3), None);
        assert_eq!(buf.samples().collect::<Vec<_>>(), vec![1, -2, 300]);
        assert_eq!(buf.as_bytes(), &[0x00, 0x01, 0xFF, 0xFE, 0x01, 0x2C]);
    }

    #[test]
    fn test_decoded_stream_reads_in_pieces() {
        let mut stream = DecodedStream::new(be_buffer(&[10, 20, 30, 40, 50], 1), 0u8, 1u8);
        let mut out = [0i16; 2];

        assert_eq!(stream.read_samples(&mut out), 2);
        assert_eq!(out, [10, 20]);
        assert_eq!(stream.read_samples(&mut out), 2);
        assert_eq!(out, [30, 40]);
        assert!(!stream.end_of_data());
        assert_eq!(stream.read_samples(&mut out), 1);
        assert_eq!(out[0], 50);
        assert!(stream.end_of_data());
        assert_eq!(stream.read_samples(&mut out), 0);
    }

    #[test]
    fn test_decoded_stream_rewind() {
        let mut stream = DecodedStream::new(be_buffer(&[7, 8], 2), 0u8, 0u8);
        let mut out = [0i16; 4];
        assert_eq!(stream.read_samples(&mut out), 2);
        assert!(stream.end_of_data());

        stream.rewind();
        assert_eq!(stream.position(), 0);
        assert!(!stream.end_of_data());
        assert_eq!(stream.read_samples(&mut out), 2);
        assert_eq!(&out[..2], &[7, 8]);
        assert!(stream.is_stereo());
        assert_eq!(stream.channels(), 2);
    }

    #[test]
    fn test_decoded_stream_restore_initial_state() {
        let stream = DecodedStream::new(be_buffer(&[], 1), 5i32, 9i32);
        let mut state = stream.final_state();
        assert_eq!(state, 9);
        stream.restore_initial_state(&mut state);
        assert_eq!(state, 5);
        assert!(stream.end_of_data());
    }

    #[test]
    fn test_raw_stream_16bit_big_endian() {
        let mut stream =
            RawStream::new(vec![0x12, 0x34, 0xFF, 0xFF], 8000, CodecFlags::SIXTEEN_BIT);
        let mut out = [0i16; 4];
        assert_eq!(stream.read_samples(&mut out), 2);
        assert_eq!(&out[..2], &[0x1234, -1]);
        assert!(stream.end_of_data());
    }

    #[test]
    fn test_raw_stream_16bit_little_endian() {
        let flags = CodecFlags::SIXTEEN_BIT | CodecFlags::LITTLE_ENDIAN;
        let mut stream = RawStream::new(vec![0x34, 0x12], 8000, flags);
        let mut out = [0i16; 1];
        assert_eq!(stream.read_samples(&mut out), 1);
        assert_eq!(out[0], 0x1234);
    }

    #[test]
    fn test_raw_stream_8bit() {
        let mut signed = RawStream::new(vec![0x7F, 0x80], 8000, CodecFlags::empty());
        let mut out = [0i16; 2];
        assert_eq!(signed.read_samples(&mut out), 2);
        assert_eq!(out, [0x7F00, i16::MIN]);

        let mut unsigned = RawStream::new(vec![0x80, 0x00], 8000, CodecFlags::UNSIGNED);
        assert_eq!(unsigned.read_samples(&mut out), 2);
        assert_eq!(out, [0, i16::MIN]);
    }

    #[test]
    fn test_raw_stream_ignores_trailing_odd_byte() {
        let mut stream = RawStream::new(vec![0, 1, 2], 8000, CodecFlags::SIXTEEN_BIT);
        assert_eq!(stream.sample_count(), 1);
        let mut out = [0i16; 4];
        assert_eq!(stream.read_samples(&mut out), 1);
        assert!(stream.end_of_data());
        stream.rewind();
        assert!(!stream.end_of_data());
    }
}
