//! Render modes and frame image formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What kind of output a render produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// A single frame written as an image.
    #[default]
    Still,
    /// A frame range encoded with a video codec.
    Video,
    /// A frame range encoded with an audio-only codec.
    Audio,
}

impl RenderMode {
    /// All modes in display order.
    pub const ALL: [RenderMode; 3] = [RenderMode::Still, RenderMode::Video, RenderMode::Audio];

    /// Whether this mode renders a frame range rather than one frame.
    pub fn is_sequence(self) -> bool {
        !matches!(self, RenderMode::Still)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::Still => "still",
            RenderMode::Video => "video",
            RenderMode::Audio => "audio",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "still" => Ok(RenderMode::Still),
            "video" => Ok(RenderMode::Video),
            "audio" => Ok(RenderMode::Audio),
            _ => Err(ParseFormatError::UnknownRenderMode(s.to_string())),
        }
    }
}

/// Image format used for stills and for intermediate video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    /// File extension written for stills in this format.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// Only JPEG output takes a quality setting.
    pub fn uses_quality(self) -> bool {
        matches!(self, ImageFormat::Jpeg)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            _ => Err(ParseFormatError::UnknownImageFormat(s.to_string())),
        }
    }
}

/// Errors produced when parsing mode, format or codec names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFormatError {
    #[error("Unknown render mode: {0}. Use: still, video, audio")]
    UnknownRenderMode(String),

    #[error("Unknown image format: {0}. Use: png, jpeg")]
    UnknownImageFormat(String),

    #[error("Unknown codec: {0}")]
    UnknownCodec(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_extensions() {
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpeg");
        assert!(ImageFormat::Jpeg.uses_quality());
        assert!(!ImageFormat::Png.uses_quality());
    }

    #[test]
    fn test_parse_accepts_jpg_alias() {
        assert_eq!("jpg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!(" PNG ".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert!("webp".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_render_mode_roundtrip_names() {
        for mode in RenderMode::ALL {
            assert_eq!(mode.as_str().parse::<RenderMode>().unwrap(), mode);
        }
        assert!(!RenderMode::Still.is_sequence());
        assert!(RenderMode::Audio.is_sequence());
    }

    #[test]
    fn test_serde_names_are_lowercase() {
        let json = serde_json::to_string(&ImageFormat::Jpeg).unwrap();
        assert_eq!(json, "\"jpeg\"");
        let mode: RenderMode = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(mode, RenderMode::Video);
    }
}
