//! Codecs and the catalog that classifies them.
//!
//! The resolver never hardcodes codec facts; it asks a [`CodecCatalog`]
//! whether a codec is audio-only, which extension its output gets, and
//! which CRF range (if any) it accepts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format::ParseFormatError;

/// Encoding scheme for video and audio renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    H264,
    H265,
    Vp8,
    Vp9,
    Mp3,
    Aac,
    Wav,
    #[serde(rename = "prores")]
    ProRes,
    #[serde(rename = "h264-mkv")]
    H264Mkv,
    Gif,
}

impl Codec {
    /// Every codec, in the order they are offered to the user.
    pub const ALL: [Codec; 10] = [
        Codec::H264,
        Codec::H265,
        Codec::Vp8,
        Codec::Vp9,
        Codec::Mp3,
        Codec::Aac,
        Codec::Wav,
        Codec::ProRes,
        Codec::H264Mkv,
        Codec::Gif,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Codec::H264 => "h264",
            Codec::H265 => "h265",
            Codec::Vp8 => "vp8",
            Codec::Vp9 => "vp9",
            Codec::Mp3 => "mp3",
            Codec::Aac => "aac",
            Codec::Wav => "wav",
            Codec::ProRes => "prores",
            Codec::H264Mkv => "h264-mkv",
            Codec::Gif => "gif",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Codec {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Codec::ALL
            .into_iter()
            .find(|codec| codec.as_str() == wanted)
            .ok_or_else(|| ParseFormatError::UnknownCodec(s.to_string()))
    }
}

/// Inclusive CRF range accepted by a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrfBounds {
    pub min: u32,
    pub max: u32,
}

impl CrfBounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Clamp a CRF value into this range.
    pub fn clamp(&self, crf: u32) -> u32 {
        crf.clamp(self.min, self.max)
    }
}

/// Source of codec facts for the resolver.
pub trait CodecCatalog: Send + Sync {
    /// Codecs available for selection.
    fn list_codecs(&self) -> Vec<Codec>;

    /// Whether the codec produces audio-only output.
    fn is_audio_codec(&self, codec: Codec) -> bool;

    /// Extension of the final output file, without the leading dot.
    fn file_extension(&self, codec: Codec) -> &'static str;

    /// CRF range, or `None` if the codec takes no CRF.
    fn crf_bounds(&self, codec: Codec) -> Option<CrfBounds>;

    /// CRF used when the user has not chosen one.
    fn default_crf(&self, codec: Codec) -> Option<u32>;

    /// Codecs in the family matching `audio`, preserving catalog order.
    fn codecs_for(&self, audio: bool) -> Vec<Codec> {
        self.list_codecs()
            .into_iter()
            .filter(|codec| self.is_audio_codec(*codec) == audio)
            .collect()
    }
}

/// The built-in codec table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCodecCatalog;

impl CodecCatalog for DefaultCodecCatalog {
    fn list_codecs(&self) -> Vec<Codec> {
        Codec::ALL.to_vec()
    }

    fn is_audio_codec(&self, codec: Codec) -> bool {
        matches!(codec, Codec::Mp3 | Codec::Aac | Codec::Wav)
    }

    fn file_extension(&self, codec: Codec) -> &'static str {
        match codec {
            Codec::H264 | Codec::H265 => "mp4",
            Codec::Vp8 | Codec::Vp9 => "webm",
            Codec::Mp3 => "mp3",
            Codec::Aac => "aac",
            Codec::Wav => "wav",
            Codec::ProRes => "mov",
            Codec::H264Mkv => "mkv",
            Codec::Gif => "gif",
        }
    }

    fn crf_bounds(&self, codec: Codec) -> Option<CrfBounds> {
        match codec {
            Codec::H264 | Codec::H264Mkv => Some(CrfBounds::new(1, 51)),
            Codec::H265 => Some(CrfBounds::new(0, 51)),
            Codec::Vp8 => Some(CrfBounds::new(4, 63)),
            Codec::Vp9 => Some(CrfBounds::new(0, 63)),
            Codec::Mp3 | Codec::Aac | Codec::Wav | Codec::ProRes | Codec::Gif => None,
        }
    }

    fn default_crf(&self, codec: Codec) -> Option<u32> {
        match codec {
            Codec::H264 | Codec::H264Mkv => Some(18),
            Codec::H265 => Some(23),
            Codec::Vp8 => Some(9),
            Codec::Vp9 => Some(28),
            Codec::Mp3 | Codec::Aac | Codec::Wav | Codec::ProRes | Codec::Gif => None,
        }
    }
}
