//! Render job descriptors.
//!
//! A descriptor is the immutable record handed to the render queue. It is
//! produced by the resolver and never edited afterwards.

use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::format::ImageFormat;

/// Request to render a single frame to an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StillJob {
    pub composition_id: String,
    pub out_name: String,
    pub image_format: ImageFormat,
    /// JPEG quality; `None` for PNG.
    pub quality: Option<u8>,
    pub frame: u64,
    pub scale: f64,
    pub verbose: bool,
}

/// Request to render a frame range with a video or audio codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJob {
    pub composition_id: String,
    pub out_name: String,
    /// Format of the intermediate frames.
    pub image_format: ImageFormat,
    /// JPEG quality; `None` for PNG frames.
    pub quality: Option<u8>,
    pub scale: f64,
    pub verbose: bool,
    pub codec: Codec,
    pub concurrency: u32,
    /// `None` when the codec takes no CRF.
    pub crf: Option<u32>,
    pub start_frame: u64,
    pub end_frame: u64,
}

impl VideoJob {
    /// Number of frames in the inclusive range.
    pub fn frame_count(&self) -> u64 {
        self.end_frame.saturating_sub(self.start_frame) + 1
    }
}

/// Either kind of descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderJob {
    Still(StillJob),
    Video(VideoJob),
}

impl RenderJob {
    pub fn composition_id(&self) -> &str {
        match self {
            RenderJob::Still(job) => &job.composition_id,
            RenderJob::Video(job) => &job.composition_id,
        }
    }

    pub fn out_name(&self) -> &str {
        match self {
            RenderJob::Still(job) => &job.out_name,
            RenderJob::Video(job) => &job.out_name,
        }
    }
}

impl From<StillJob> for RenderJob {
    fn from(job: StillJob) -> Self {
        RenderJob::Still(job)
    }
}

impl From<VideoJob> for RenderJob {
    fn from(job: VideoJob) -> Self {
        RenderJob::Video(job)
    }
}
