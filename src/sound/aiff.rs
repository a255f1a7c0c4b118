//! AIFF/AIFC container parser
//!
//! Walks the FORM chunk list of an AIFF or AIFF-C file and locates the
//! sample data. Supports:
//! - Uncompressed PCM (`NONE`, `raw `, `twos`, `sowt`) 8-bit and 16-bit
//! - 3DO SDX2 and ADP4 compressed audio
//! - Mono and stereo
//! - 80-bit extended precision sample rates
//!
//! Compressed payloads are handed to the matching codec and decoded up
//! front; uncompressed payloads are served as they are.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use log::{debug, trace, warn};

use super::adp4::{try_decode_adp4, Adp4State};
use super::decoder::{read_payload, DecodeError, DecodeResult, PlaybackStream};
use super::formats::CodecFlags;
use super::sdx2::{try_decode_sdx2, Sdx2State};
use super::stream::{DecodedStream, RawStream};

// AIFF format constants (big-endian IDs)
const FORM_ID: u32 = 0x464F524D; // "FORM"
const FORM_TYPE_AIFF: u32 = 0x41494646; // "AIFF"
const FORM_TYPE_AIFC: u32 = 0x41494643; // "AIFC"
const COMMON_ID: u32 = 0x434F4D4D; // "COMM"
const SOUND_DATA_ID: u32 = 0x53534E44; // "SSND"
const FORMAT_VERSION_ID: u32 = 0x46564552; // "FVER"
const WAVE_ID: u32 = 0x77617665; // "wave"

const FVER_AIFF: u32 = 0;
const FVER_AIFC: u32 = 0xA2805140;

const AIFF_COMM_SIZE: u32 = 18;
const AIFF_EXT_COMM_SIZE: u32 = 22;
const AIFF_SSND_SIZE: u32 = 8;

/// Container flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    /// Plain AIFF, always uncompressed
    Aiff,
    /// AIFF-C, carries a codec tag in its COMM chunk
    Aifc,
}

/// Four-character codec identifier from an AIFF-C COMM chunk
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecTag(pub u32);

impl CodecTag {
    pub const NONE: CodecTag = CodecTag(0x4E4F4E45); // "NONE"
    pub const RAW: CodecTag = CodecTag(0x72617720); // "raw "
    pub const SOWT: CodecTag = CodecTag(0x736F7774); // "sowt"
    pub const TWOS: CodecTag = CodecTag(0x74776F73); // "twos"
    pub const SDX2: CodecTag = CodecTag(0x53445832); // "SDX2"
    pub const ADP4: CodecTag = CodecTag(0x41445034); // "ADP4"

    /// True for the tags whose payload is plain PCM
    pub fn is_uncompressed(self) -> bool {
        matches!(
            self,
            CodecTag::NONE | CodecTag::RAW | CodecTag::SOWT | CodecTag::TWOS
        )
    }
}

impl fmt::Display for CodecTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.to_be_bytes() {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '?'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CodecTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodecTag(\"{}\")", self)
    }
}

/// Everything the parser learned about a container.
///
/// `data_offset` and `data_len` locate the sample bytes within the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerDescriptor {
    pub version: FormatVersion,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_rate: u32,
    pub codec: CodecTag,
    pub data_offset: u64,
    pub data_len: u64,
}

/// COMM chunk fields
#[derive(Debug, Clone, Copy)]
struct CommonChunk {
    channels: u16,
    bits_per_sample: u16,
    sample_rate: u32,
    codec: CodecTag,
}

/// Decode an 80-bit extended float sample rate to whole Hz.
///
/// Only the top 32 mantissa bits take part. The value is shifted down one
/// bit at a time and rounded up if the last bit shifted out was set.
pub fn read_extended(buf: &[u8; 10]) -> u32 {
    let mut mantissa = u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]);
    let exp = 30u8.wrapping_sub(buf[1]);

    let mut last = 0u32;
    for _ in 0..exp {
        last = mantissa;
        mantissa >>= 1;
    }
    if last & 1 != 0 {
        mantissa += 1;
    }
    mantissa
}

fn read_u16<R: Read>(stream: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32<R: Read>(stream: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a chunk tag and length, or `None` at end of stream.
fn read_chunk_header<R: Read>(stream: &mut R) -> DecodeResult<Option<(u32, u32)>> {
    let mut buf = [0u8; 8];
    match stream.read_exact(&mut buf) {
        Ok(()) => Ok(Some((
            u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        ))),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn read_common_chunk<R: Read>(
    stream: &mut R,
    chunk_len: u32,
    version: FormatVersion,
) -> DecodeResult<CommonChunk> {
    let min_len = match version {
        FormatVersion::Aiff => AIFF_COMM_SIZE,
        FormatVersion::Aifc => AIFF_EXT_COMM_SIZE,
    };
    if chunk_len < min_len {
        return Err(DecodeError::Format(format!(
            "COMM chunk of {} bytes is too small",
            chunk_len
        )));
    }

    let channels = read_u16(stream)?;
    let _sample_frames = read_u32(stream)?;
    let bits_per_sample = read_u16(stream)?;
    let mut rate = [0u8; 10];
    stream.read_exact(&mut rate)?;
    let codec = match version {
        FormatVersion::Aiff => CodecTag::NONE,
        FormatVersion::Aifc => CodecTag(read_u32(stream)?),
    };

    Ok(CommonChunk {
        channels,
        bits_per_sample,
        sample_rate: read_extended(&rate),
        codec,
    })
}

/// Parse the container headers without decoding any samples.
///
/// On success the stream is left somewhere past the last chunk read; use
/// `data_offset` to find the samples.
pub fn parse_container<R: Read + Seek>(stream: &mut R) -> DecodeResult<ContainerDescriptor> {
    let start = stream.stream_position()?;
    let size = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(start))?;

    if read_u32(stream)? != FORM_ID {
        return Err(DecodeError::Format("No 'FORM' header".to_string()));
    }
    let _form_size = read_u32(stream)?;
    let mut version = match read_u32(stream)? {
        FORM_TYPE_AIFF => FormatVersion::Aiff,
        FORM_TYPE_AIFC => FormatVersion::Aifc,
        other => {
            return Err(DecodeError::Format(format!(
                "Unknown form type '{}'",
                CodecTag(other)
            )))
        }
    };

    let mut common: Option<CommonChunk> = None;
    let mut data: Option<(u64, u64)> = None;

    while common.is_none() || data.is_none() {
        let Some((id, len)) = read_chunk_header(stream)? else {
            break;
        };
        let pos = stream.stream_position()?;
        trace!("AIFF: chunk '{}' of {} bytes at {}", CodecTag(id), len, pos);

        match id {
            COMMON_ID => {
                common = Some(read_common_chunk(stream, len, version)?);
            }
            SOUND_DATA_ID => {
                if len < AIFF_SSND_SIZE {
                    return Err(DecodeError::Format(format!(
                        "SSND chunk of {} bytes is too small",
                        len
                    )));
                }
                let _offset = read_u32(stream)?;
                let _block_size = read_u32(stream)?;
                data = Some((stream.stream_position()?, u64::from(len - AIFF_SSND_SIZE)));
            }
            FORMAT_VERSION_ID => match read_u32(stream)? {
                FVER_AIFF => version = FormatVersion::Aiff,
                FVER_AIFC => version = FormatVersion::Aifc,
                other => warn!("AIFF: ignoring unknown format version 0x{:08X}", other),
            },
            WAVE_ID => {
                return Err(DecodeError::Format(
                    "'wave' extra data chunk is unsupported".to_string(),
                ));
            }
            _ => debug!("AIFF: skipping chunk '{}'", CodecTag(id)),
        }

        let mut next = pos + u64::from(len);
        if len % 2 != 0 && next + 1 <= size {
            next += 1;
        }
        stream.seek(SeekFrom::Start(next))?;
    }

    let common =
        common.ok_or_else(|| DecodeError::Format("No 'COMM' chunk found".to_string()))?;
    let (data_offset, data_len) =
        data.ok_or_else(|| DecodeError::Format("No 'SSND' chunk found".to_string()))?;

    if common.channels != 1 && common.channels != 2 {
        return Err(DecodeError::Format(format!(
            "Unsupported channel count {}",
            common.channels
        )));
    }
    let end = data_offset.checked_add(data_len).ok_or_else(|| {
        DecodeError::SizeInvariant("sample data range overflows".to_string())
    })?;
    if end > size {
        return Err(DecodeError::SizeInvariant(format!(
            "sample data ends at {} but the stream holds {} bytes",
            end, size
        )));
    }
    if !common.codec.is_uncompressed()
        && common.codec != CodecTag::SDX2
        && common.codec != CodecTag::ADP4
    {
        return Err(DecodeError::Format(format!(
            "Unknown codec tag '{}'",
            common.codec
        )));
    }

    Ok(ContainerDescriptor {
        version,
        channels: common.channels,
        bits_per_sample: common.bits_per_sample,
        sample_rate: common.sample_rate,
        codec: common.codec,
        data_offset,
        data_len,
    })
}

/// Playback stream produced from a container
#[derive(Debug, Clone)]
pub enum AudioStream {
    Raw(RawStream),
    Adp4(DecodedStream<Adp4State>),
    Sdx2(DecodedStream<Sdx2State>),
}

impl AudioStream {
    fn inner(&self) -> &dyn PlaybackStream {
        match self {
            AudioStream::Raw(s) => s,
            AudioStream::Adp4(s) => s,
            AudioStream::Sdx2(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PlaybackStream {
        match self {
            AudioStream::Raw(s) => s,
            AudioStream::Adp4(s) => s,
            AudioStream::Sdx2(s) => s,
        }
    }
}

impl PlaybackStream for AudioStream {
    fn is_stereo(&self) -> bool {
        self.inner().is_stereo()
    }

    fn sample_rate(&self) -> u32 {
        self.inner().sample_rate()
    }

    fn end_of_data(&self) -> bool {
        self.inner().end_of_data()
    }

    fn read_samples(&mut self, out: &mut [i16]) -> usize {
        self.inner_mut().read_samples(out)
    }

    fn rewind(&mut self) {
        self.inner_mut().rewind()
    }
}

fn raw_flags(desc: &ContainerDescriptor) -> DecodeResult<CodecFlags> {
    let mut flags = match desc.bits_per_sample {
        8 => CodecFlags::empty(),
        16 => CodecFlags::SIXTEEN_BIT,
        bits => {
            return Err(DecodeError::UnsupportedConfiguration(format!(
                "{}-bit uncompressed samples",
                bits
            )))
        }
    };
    if desc.channels == 2 {
        flags |= CodecFlags::STEREO;
    }
    if desc.codec == CodecTag::SOWT && flags.is_16bit() {
        flags |= CodecFlags::LITTLE_ENDIAN;
    }
    Ok(flags)
}

/// Parse a container and build a playback stream for its samples.
///
/// Takes the stream by value; pass `&mut stream` to keep ownership.
pub fn try_decode_container<R: Read + Seek>(mut stream: R) -> DecodeResult<AudioStream> {
    let desc = parse_container(&mut stream)?;
    stream.seek(SeekFrom::Start(desc.data_offset))?;

    let audio = match desc.codec {
        CodecTag::ADP4 => AudioStream::Adp4(try_decode_adp4(
            &mut stream,
            desc.data_len,
            desc.sample_rate,
            CodecFlags::pcm16(desc.channels == 2),
            None,
        )?),
        CodecTag::SDX2 => AudioStream::Sdx2(try_decode_sdx2(
            &mut stream,
            desc.data_len,
            desc.sample_rate,
            CodecFlags::pcm16(desc.channels == 2),
            None,
        )?),
        _ => {
            let flags = raw_flags(&desc)?;
            let data = read_payload(&mut stream, desc.data_len)?;
            AudioStream::Raw(RawStream::new(data, desc.sample_rate, flags))
        }
    };

    debug!(
        "AIFF: opened '{}' stream, {} channel(s), {} bits, {} Hz, {} data bytes",
        desc.codec, desc.channels, desc.bits_per_sample, desc.sample_rate, desc.data_len
    );
    Ok(audio)
}

/// Like [`try_decode_container`], but reports failures as a warning and `None`.
pub fn decode_container<R: Read + Seek>(stream: R) -> Option<AudioStream> {
    match try_decode_container(stream) {
        Ok(audio) => Some(audio),
        Err(err) => {
            warn!("AIFF decode failed: {}", err);
            None
        }
    }
}
