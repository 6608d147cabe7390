//! Sample format metadata
use std::fmt;
use std::str::FromStr;

/// Number of distinct sample formats
pub const SAMPLE_FORMAT_COUNT: usize = 13;

/// Raw sample encoding of an interleaved buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SampleFormat {
    /// Unsigned 8 bit, bias 0x80
    U8,
    /// 8 bit a-Law
    Alaw,
    /// 8 bit mu-Law
    Ulaw,
    /// Signed 16 bit, little endian
    S16Le,
    /// Signed 16 bit, big endian
    S16Be,
    /// 32 bit IEEE float, little endian, range -1.0 to 1.0
    Float32Le,
    /// 32 bit IEEE float, big endian, range -1.0 to 1.0
    Float32Be,
    /// Signed 32 bit, little endian
    S32Le,
    /// Signed 32 bit, big endian
    S32Be,
    /// Signed 24 bit packed in 3 bytes, little endian
    S24Le,
    /// Signed 24 bit packed in 3 bytes, big endian
    S24Be,
    /// Signed 24 bit in the low bits of a 32 bit word, little endian
    S24_32Le,
    /// Signed 24 bit in the low bits of a 32 bit word, big endian
    S24_32Be,
}

impl SampleFormat {
    /// All formats, ordered by index
    pub const ALL: [SampleFormat; SAMPLE_FORMAT_COUNT] = [
        SampleFormat::U8,
        SampleFormat::Alaw,
        SampleFormat::Ulaw,
        SampleFormat::S16Le,
        SampleFormat::S16Be,
        SampleFormat::Float32Le,
        SampleFormat::Float32Be,
        SampleFormat::S32Le,
        SampleFormat::S32Be,
        SampleFormat::S24Le,
        SampleFormat::S24Be,
        SampleFormat::S24_32Le,
        SampleFormat::S24_32Be,
    ];
}

#[cfg(target_endian = "little")]
impl SampleFormat {
    pub const S16NE: SampleFormat = SampleFormat::S16Le;
    pub const S16RE: SampleFormat = SampleFormat::S16Be;
    pub const FLOAT32NE: SampleFormat = SampleFormat::Float32Le;
    pub const FLOAT32RE: SampleFormat = SampleFormat::Float32Be;
    pub const S32NE: SampleFormat = SampleFormat::S32Le;
    pub const S32RE: SampleFormat = SampleFormat::S32Be;
    pub const S24NE: SampleFormat = SampleFormat::S24Le;
    pub const S24RE: SampleFormat = SampleFormat::S24Be;
    pub const S24_32NE: SampleFormat = SampleFormat::S24_32Le;
    pub const S24_32RE: SampleFormat = SampleFormat::S24_32Be;
}

#[cfg(target_endian = "big")]
impl SampleFormat {
    pub const S16NE: SampleFormat = SampleFormat::S16Be;
    pub const S16RE: SampleFormat = SampleFormat::S16Le;
    pub const FLOAT32NE: SampleFormat = SampleFormat::Float32Be;
    pub const FLOAT32RE: SampleFormat = SampleFormat::Float32Le;
    pub const S32NE: SampleFormat = SampleFormat::S32Be;
    pub const S32RE: SampleFormat = SampleFormat::S32Le;
    pub const S24NE: SampleFormat = SampleFormat::S24Be;
    pub const S24RE: SampleFormat = SampleFormat::S24Le;
    pub const S24_32NE: SampleFormat = SampleFormat::S24_32Be;
    pub const S24_32RE: SampleFormat = SampleFormat::S24_32Le;
}

impl SampleFormat {
    /// Format with the given dense index
    ///
    /// # Panics
    ///
    /// This function panics if the index is not below [`SAMPLE_FORMAT_COUNT`]
    #[track_caller]
    pub fn from_index(index: usize) -> Self {
        assert!(
            index < SAMPLE_FORMAT_COUNT,
            "IndexSizeError - Invalid sample format index {:?}",
            index
        );
        Self::ALL[index]
    }

    /// Dense index of this format, in `0..SAMPLE_FORMAT_COUNT`
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Number of bytes of a single sample
    pub fn sample_size(self) -> usize {
        match self {
            Self::U8 | Self::Alaw | Self::Ulaw => 1,
            Self::S16Le | Self::S16Be => 2,
            Self::S24Le | Self::S24Be => 3,
            Self::Float32Le
            | Self::Float32Be
            | Self::S32Le
            | Self::S32Be
            | Self::S24_32Le
            | Self::S24_32Be => 4,
        }
    }

    /// Byte pattern that encodes silence
    pub fn silence_byte(self) -> u8 {
        match self {
            Self::U8 => 0x80,
            Self::Alaw => 0xd5,
            Self::Ulaw => 0xff,
            _ => 0,
        }
    }

    /// Canonical short name, as accepted by [`FromStr`]
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::Alaw => "aLaw",
            Self::Ulaw => "uLaw",
            Self::S16Le => "s16le",
            Self::S16Be => "s16be",
            Self::Float32Le => "float32le",
            Self::Float32Be => "float32be",
            Self::S32Le => "s32le",
            Self::S32Be => "s32be",
            Self::S24Le => "s24le",
            Self::S24Be => "s24be",
            Self::S24_32Le => "s24-32le",
            Self::S24_32Be => "s24-32be",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32Le | Self::Float32Be)
    }

    /// True for the formats whose samples fit in 16 bits
    pub fn is_narrow(self) -> bool {
        matches!(
            self,
            Self::U8 | Self::Alaw | Self::Ulaw | Self::S16Le | Self::S16Be
        )
    }

    /// True for the formats stored in the native byte order, or without byte order
    pub fn is_native_endian(self) -> bool {
        !matches!(
            self,
            Self::S16RE | Self::FLOAT32RE | Self::S32RE | Self::S24RE | Self::S24_32RE
        )
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The given name does not denote a sample format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSampleFormat(pub String);

impl fmt::Display for InvalidSampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InvalidSampleFormat - unknown sample format {:?}", self.0)
    }
}

impl std::error::Error for InvalidSampleFormat {}

impl FromStr for SampleFormat {
    type Err = InvalidSampleFormat;

    /// Parses the canonical names plus the usual aliases (`s16`, `float32`, `ulaw`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.to_ascii_lowercase().as_str() {
            "u8" => Self::U8,
            "alaw" => Self::Alaw,
            "ulaw" | "mulaw" => Self::Ulaw,
            "s16le" => Self::S16Le,
            "s16be" => Self::S16Be,
            "s16" | "s16ne" => Self::S16NE,
            "s16re" => Self::S16RE,
            "float32le" | "f32le" => Self::Float32Le,
            "float32be" | "f32be" => Self::Float32Be,
            "float32" | "float32ne" | "f32" => Self::FLOAT32NE,
            "float32re" => Self::FLOAT32RE,
            "s32le" => Self::S32Le,
            "s32be" => Self::S32Be,
            "s32" | "s32ne" => Self::S32NE,
            "s32re" => Self::S32RE,
            "s24le" => Self::S24Le,
            "s24be" => Self::S24Be,
            "s24" | "s24ne" => Self::S24NE,
            "s24re" => Self::S24RE,
            "s24-32le" | "s24_32le" => Self::S24_32Le,
            "s24-32be" | "s24_32be" => Self::S24_32Be,
            "s24-32" | "s24-32ne" | "s24_32ne" => Self::S24_32NE,
            "s24-32re" | "s24_32re" => Self::S24_32RE,
            _ => return Err(InvalidSampleFormat(s.to_string())),
        };

        Ok(format)
    }
}

/// Format, rate and channel count of an interleaved buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    pub format: SampleFormat,
    pub rate: u32,
    pub channels: usize,
}

impl SampleSpec {
    /// # Panics
    ///
    /// This function panics if the channel count is zero or exceeds [`crate::MAX_CHANNELS`]
    #[track_caller]
    pub fn new(format: SampleFormat, rate: u32, channels: usize) -> Self {
        crate::assert_valid_number_of_channels(channels);
        Self {
            format,
            rate,
            channels,
        }
    }

    /// Number of bytes of one frame (one sample per channel)
    pub fn frame_size(&self) -> usize {
        self.format.sample_size() * self.channels
    }

    /// Number of bytes spanning the given duration in microseconds, whole frames only
    pub fn usec_to_bytes(&self, usec: u64) -> usize {
        let frames = usec * u64::from(self.rate) / 1_000_000;
        frames as usize * self.frame_size()
    }
}

/// Fill the buffer with the silence pattern of the given format
pub fn silence_memory(dst: &mut [u8], format: SampleFormat) {
    dst.fill(format.silence_byte());
}
