//! 3DO audio decoding
//!
//! The 3DO releases ship speech and music as AIFF-C files compressed with
//! one of two codecs. This module parses the container and decodes the
//! payload into 16-bit PCM.
//!
//! # Architecture
//!
//! - `aiff` walks the container and dispatches on its codec tag
//! - `adp4` and `sdx2` decode whole payloads against caller-owned state
//! - `stream` holds the decoded buffers behind the `PlaybackStream` trait
//! - `decoder` defines the error type and the `PlaybackStream` trait
//! - `formats` describes sample layouts with `CodecFlags`

pub mod adp4;
pub mod aiff;
pub mod decoder;
pub mod formats;
pub mod sdx2;
pub mod stream;
pub mod tables;

pub use adp4::{decode_adp4, decode_adp4_buffer, try_decode_adp4, Adp4State};
pub use aiff::{
    decode_container, parse_container, read_extended, try_decode_container, AudioStream, CodecTag,
    ContainerDescriptor, FormatVersion,
};
pub use decoder::{DecodeError, DecodeResult, PlaybackStream};
pub use formats::CodecFlags;
pub use sdx2::{decode_sdx2, decode_sdx2_buffer, try_decode_sdx2, Sdx2State};
pub use stream::{DecodedAudioBuffer, DecodedStream, RawStream};
