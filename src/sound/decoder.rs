//! Decoder error type and playback stream trait
//!
//! Defines the `PlaybackStream` trait consumed by the mixer and the error
//! taxonomy shared by the container parser and both 3DO codecs.

use std::io::{self, Read, Seek, SeekFrom};

use super::formats::CodecFlags;

/// Error type for decoder operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Malformed or unsupported container layout (bad magic, unknown
    /// version, missing chunk, bad channel count, unknown codec tag)
    #[error("Invalid audio data: {0}")]
    Format(String),
    /// The requested sample layout cannot be produced by this codec
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    /// A byte count exceeds the stream or overflows the output size
    #[error("Size invariant violated: {0}")]
    SizeInvariant(String),
    /// The underlying byte source failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        DecodeError::Io(err.to_string())
    }
}

/// Result type for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Reject any output layout other than signed 16-bit big-endian.
///
/// Both 3DO codecs only ever produce that layout, so the check runs before
/// any payload is read or buffer allocated.
pub(crate) fn check_pcm16_output(codec: &str, flags: CodecFlags) -> DecodeResult<()> {
    if flags.is_unsigned() {
        return Err(DecodeError::UnsupportedConfiguration(format!(
            "{}: unsigned sample format unsupported",
            codec
        )));
    }
    if !flags.is_16bit() {
        return Err(DecodeError::UnsupportedConfiguration(format!(
            "{}: only 16-bit output is supported",
            codec
        )));
    }
    if flags.is_little_endian() {
        return Err(DecodeError::UnsupportedConfiguration(format!(
            "{}: only big-endian output is supported",
            codec
        )));
    }
    Ok(())
}

/// Read `size` bytes from the stream's current position.
///
/// Fails with `SizeInvariant` when fewer than `size` bytes remain.
pub(crate) fn read_payload<R: Read + Seek>(stream: &mut R, size: u64) -> DecodeResult<Vec<u8>> {
    let pos = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(pos))?;

    let remaining = end.saturating_sub(pos);
    if size > remaining {
        return Err(DecodeError::SizeInvariant(format!(
            "payload of {} bytes exceeds the {} bytes left in the stream",
            size, remaining
        )));
    }
    let len = usize::try_from(size).map_err(|_| {
        DecodeError::SizeInvariant(format!("payload of {} bytes is not addressable", size))
    })?;

    let mut data = vec![0u8; len];
    stream.read_exact(&mut data)?;
    Ok(data)
}

/// A fully decoded, rewindable PCM source.
///
/// Samples are delivered interleaved as native `i16` regardless of how the
/// backing buffer stores them.
pub trait PlaybackStream: Send {
    /// Returns true if the stream has two interleaved channels
    fn is_stereo(&self) -> bool;

    /// Returns the sample frequency in Hz
    fn sample_rate(&self) -> u32;

    /// Returns true once every sample has been read
    fn end_of_data(&self) -> bool;

    /// Read up to `out.len()` samples, returning how many were written.
    ///
    /// Returns 0 at end of data.
    fn read_samples(&mut self, out: &mut [i16]) -> usize;

    /// Reset the read position to the first sample
    fn rewind(&mut self);

    /// Returns the number of channels
    fn channels(&self) -> u16 {
        if self.is_stereo() {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::Format("No 'FORM' header".to_string());
        assert_eq!(format!("{}", err), "Invalid audio data: No 'FORM' header");

        let err = DecodeError::UnsupportedConfiguration("stereo".to_string());
        assert_eq!(format!("{}", err), "Unsupported configuration: stereo");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: DecodeError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, DecodeError::Io(_)));
    }

    #[test]
    fn test_check_pcm16_output() {
        assert!(check_pcm16_output("test", CodecFlags::SIXTEEN_BIT).is_ok());
        assert!(check_pcm16_output("test", CodecFlags::pcm16(true)).is_ok());
        for bad in [
            CodecFlags::empty(),
            CodecFlags::SIXTEEN_BIT | CodecFlags::UNSIGNED,
            CodecFlags::SIXTEEN_BIT | CodecFlags::LITTLE_ENDIAN,
        ] {
            assert!(matches!(
                check_pcm16_output("test", bad),
                Err(DecodeError::UnsupportedConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_read_payload_from_current_position() {
        let mut cursor = io::Cursor::new(vec![1u8, 2, 3, 4, 5]);
        cursor.set_position(1);
        assert_eq!(read_payload(&mut cursor, 3).unwrap(), vec![2, 3, 4]);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_read_payload_too_large() {
        let mut cursor = io::Cursor::new(vec![0u8; 4]);
        cursor.set_position(2);
        assert!(matches!(
            read_payload(&mut cursor, 3),
            Err(DecodeError::SizeInvariant(_))
        ));
        // Position untouched on failure
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_decode_error_is_send() {
        fn assert_send<T: Send + Sync>() {}
        assert_send::<DecodeError>();
    }
}
