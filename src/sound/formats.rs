//! Sample format flags for the 3DO codecs
//!
//! Matches the audio flag byte handed to the 3DO stream constructors.

use bitflags::bitflags;

bitflags! {
    /// Describes the layout of PCM data requested from (or held by) a stream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CodecFlags: u8 {
        /// Samples are bias-128 unsigned rather than signed.
        const UNSIGNED      = 0x01;
        /// Samples are 16 bits wide (8 bits otherwise).
        const SIXTEEN_BIT   = 0x02;
        /// 16-bit samples are stored little-endian (big-endian otherwise).
        const LITTLE_ENDIAN = 0x04;
        /// Two interleaved channels.
        const STEREO        = 0x08;
    }
}

impl CodecFlags {
    /// Flags describing the output every 3DO codec produces: signed 16-bit
    /// big-endian, with `stereo` selecting the channel layout.
    pub fn pcm16(stereo: bool) -> Self {
        let mut flags = CodecFlags::SIXTEEN_BIT;
        flags.set(CodecFlags::STEREO, stereo);
        flags
    }

    pub fn is_stereo(&self) -> bool {
        self.contains(CodecFlags::STEREO)
    }

    pub fn is_16bit(&self) -> bool {
        self.contains(CodecFlags::SIXTEEN_BIT)
    }

    pub fn is_unsigned(&self) -> bool {
        self.contains(CodecFlags::UNSIGNED)
    }

    pub fn is_little_endian(&self) -> bool {
        self.contains(CodecFlags::LITTLE_ENDIAN)
    }

    /// Returns the number of channels
    pub fn channels(&self) -> u16 {
        if self.is_stereo() {
            2
        } else {
            1
        }
    }

    /// Returns the number of bytes per single-channel sample
    pub fn bytes_per_sample(&self) -> usize {
        if self.is_16bit() {
            2
        } else {
            1
        }
    }
}
