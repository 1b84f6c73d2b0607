//! The render settings resolver.
//!
//! Holds the raw values a user has entered in the render dialog and derives
//! a consistent job descriptor from them on demand. Numeric fields accept
//! freeform text and keep their previous value on garbage; ranges are
//! clamped, never rejected. The only things that are rejected are
//! selections the UI should not have offered in the first place.

use std::sync::Arc;

use renderkit_common::config::RenderDefaults;
use renderkit_common::error::{RenderkitError, RenderkitResult};
use renderkit_model::codec::{Codec, CodecCatalog, CrfBounds};
use renderkit_model::composition::{CompositionRef, CompositionRegistry};
use renderkit_model::format::{ImageFormat, RenderMode};
use renderkit_model::job::{RenderJob, StillJob, VideoJob};

use crate::frames::FrameSelection;
use crate::input::NumericInput;
use crate::output_name::with_extension;
use crate::queue::RenderJobQueue;
use crate::submission::{DialogHost, SubmissionState, SubmissionTask, SubmissionTracker};

/// JPEG quality used when the caller does not provide one.
pub const DEFAULT_QUALITY: u8 = 80;

/// Initial values for a render dialog session.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverOptions {
    pub frame: f64,
    pub still_image_format: ImageFormat,
    pub video_image_format: ImageFormat,
    /// Defaults to [`DEFAULT_QUALITY`].
    pub quality: Option<u8>,
    pub scale: f64,
    pub verbose: bool,
    pub output_name: String,
    pub render_mode: RenderMode,
    /// Seeds the audio slot if it is an audio codec, the video slot otherwise.
    pub codec: Codec,
    pub concurrency: u32,
    pub min_concurrency: u32,
    pub max_concurrency: u32,
    /// Defaults to the codec's default CRF.
    pub crf: Option<u32>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        let max_concurrency = renderkit_common::config::available_cpus();
        Self {
            frame: 0.0,
            still_image_format: ImageFormat::Png,
            video_image_format: ImageFormat::Jpeg,
            quality: None,
            scale: 1.0,
            verbose: false,
            output_name: "out.mp4".to_string(),
            render_mode: RenderMode::Video,
            codec: Codec::H264,
            concurrency: max_concurrency,
            min_concurrency: 1,
            max_concurrency,
            crf: None,
        }
    }
}

impl ResolverOptions {
    /// Seed options from the configured render defaults.
    ///
    /// The output name is `<output_stem>.<ext>` for the initial mode.
    pub fn from_defaults(
        defaults: &RenderDefaults,
        render_mode: RenderMode,
        catalog: &dyn CodecCatalog,
    ) -> RenderkitResult<Self> {
        let codec: Codec = defaults
            .codec
            .parse()
            .map_err(|e| RenderkitError::config(format!("{e}")))?;
        let still_image_format: ImageFormat = defaults
            .still_image_format
            .parse()
            .map_err(|e| RenderkitError::config(format!("{e}")))?;
        let video_image_format: ImageFormat = defaults
            .video_image_format
            .parse()
            .map_err(|e| RenderkitError::config(format!("{e}")))?;

        let (video_codec, audio_codec) = seed_codec_slots(catalog, codec);
        let extension = match render_mode {
            RenderMode::Still => still_image_format.extension(),
            RenderMode::Video => catalog.file_extension(video_codec),
            RenderMode::Audio => catalog.file_extension(audio_codec),
        };

        Ok(Self {
            frame: 0.0,
            still_image_format,
            video_image_format,
            quality: Some(defaults.quality),
            scale: defaults.scale,
            verbose: false,
            output_name: with_extension(&defaults.output_stem, extension),
            render_mode,
            codec,
            concurrency: defaults.max_concurrency,
            min_concurrency: defaults.min_concurrency,
            max_concurrency: defaults.max_concurrency,
            crf: None,
        })
    }
}

/// Fill the video and audio codec slots from a single initial codec.
///
/// The other slot gets `h264`/`mp3` when the catalog offers it, otherwise the
/// catalog's first codec of that family.
fn seed_codec_slots(catalog: &dyn CodecCatalog, codec: Codec) -> (Codec, Codec) {
    let fallback = |audio: bool, preferred: Codec| {
        let offered = catalog.codecs_for(audio);
        if offered.contains(&preferred) {
            preferred
        } else {
            offered.first().copied().unwrap_or(codec)
        }
    };
    if catalog.is_audio_codec(codec) {
        (fallback(false, Codec::H264), codec)
    } else {
        (codec, fallback(true, Codec::Mp3))
    }
}

/// External collaborators of a render dialog session.
#[derive(Clone)]
pub struct RenderServices {
    pub catalog: Arc<dyn CodecCatalog>,
    pub queue: Arc<dyn RenderJobQueue>,
    pub host: Arc<dyn DialogHost>,
}

/// Per-mode output choices. Each mode keeps its own selection so that
/// switching back and forth never loses what the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputSlots {
    still_format: ImageFormat,
    video_frame_format: ImageFormat,
    video_codec: Codec,
    audio_codec: Codec,
}

/// What the current mode writes, derived from the mode and its slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveOutput {
    Still { format: ImageFormat },
    Sequence { codec: Codec, frame_format: ImageFormat },
}

/// Derives validated render descriptors from user input.
pub struct RenderConfigResolver {
    composition: CompositionRef,
    services: RenderServices,
    mode: RenderMode,
    slots: OutputSlots,
    frames: FrameSelection,
    quality: u8,
    scale: f64,
    verbose: bool,
    output_name: String,
    concurrency: u32,
    min_concurrency: u32,
    max_concurrency: u32,
    crf: Option<u32>,
    submission: SubmissionTracker,
}

impl std::fmt::Debug for RenderConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderConfigResolver")
            .field("composition", &self.composition)
            .field("mode", &self.mode)
            .field("slots", &self.slots)
            .field("frames", &self.frames)
            .field("output_name", &self.output_name)
            .field("concurrency", &self.concurrency)
            .field("submission", &self.submission.state())
            .finish_non_exhaustive()
    }
}

impl RenderConfigResolver {
    /// Open a session for the composition `id`.
    ///
    /// An unknown id is fatal: the dialog must not exist without a composition.
    pub fn open(
        registry: &dyn CompositionRegistry,
        id: &str,
        services: RenderServices,
        options: ResolverOptions,
    ) -> RenderkitResult<Self> {
        let composition = registry.lookup(id)?;
        Self::new(composition, services, options)
    }

    /// Open a session for an already resolved composition.
    pub fn new(
        composition: CompositionRef,
        services: RenderServices,
        options: ResolverOptions,
    ) -> RenderkitResult<Self> {
        if composition.duration_in_frames == 0 {
            return Err(RenderkitError::invalid_composition(format!(
                "{} has a duration of 0 frames",
                composition.id
            )));
        }
        if options.min_concurrency == 0 || options.min_concurrency > options.max_concurrency {
            return Err(RenderkitError::config(format!(
                "invalid concurrency bounds [{}, {}]",
                options.min_concurrency, options.max_concurrency
            )));
        }

        let catalog = &services.catalog;
        if !catalog.list_codecs().contains(&options.codec) {
            return Err(RenderkitError::config(format!(
                "codec {} is not offered by the codec catalog",
                options.codec
            )));
        }
        let (video_codec, audio_codec) = seed_codec_slots(&**catalog, options.codec);

        let mode = if composition.is_still_only() {
            RenderMode::Still
        } else {
            options.render_mode
        };

        tracing::debug!(
            composition = %composition.id,
            duration_in_frames = composition.duration_in_frames,
            mode = %mode,
            "Opened render settings"
        );

        Ok(Self {
            composition,
            mode,
            slots: OutputSlots {
                still_format: options.still_image_format,
                video_frame_format: options.video_image_format,
                video_codec,
                audio_codec,
            },
            frames: FrameSelection::new(if options.frame.is_finite() {
                options.frame
            } else {
                0.0
            }),
            quality: options.quality.unwrap_or(DEFAULT_QUALITY),
            scale: options.scale,
            verbose: options.verbose,
            output_name: options.output_name,
            concurrency: options
                .concurrency
                .clamp(options.min_concurrency, options.max_concurrency),
            min_concurrency: options.min_concurrency,
            max_concurrency: options.max_concurrency,
            crf: options.crf,
            submission: SubmissionTracker::new(),
            services,
        })
    }

    // ---- composition -------------------------------------------------

    pub fn composition(&self) -> &CompositionRef {
        &self.composition
    }

    /// Replace the composition metadata (for example after the scene was
    /// edited and its length changed). Frame inputs are re-derived from
    /// their raw values. A composition that shrank to one frame forces
    /// still mode.
    pub fn update_composition(&mut self, composition: CompositionRef) -> RenderkitResult<()> {
        if composition.id != self.composition.id {
            return Err(RenderkitError::invalid_selection(format!(
                "session is bound to {}, not {}",
                self.composition.id, composition.id
            )));
        }
        if composition.duration_in_frames == 0 {
            return Err(RenderkitError::invalid_composition(format!(
                "{} has a duration of 0 frames",
                composition.id
            )));
        }
        self.composition = composition;
        if self.composition.is_still_only() && self.mode != RenderMode::Still {
            tracing::debug!(composition = %self.composition.id, "Composition became still-only");
            self.mode = RenderMode::Still;
            self.sync_output_suffix();
        }
        Ok(())
    }

    // ---- mode, codec and format ------------------------------------

    pub fn render_mode(&self) -> RenderMode {
        self.mode
    }

    /// Modes the user may choose from.
    pub fn render_mode_options(&self) -> Vec<RenderMode> {
        if self.composition.is_still_only() {
            vec![RenderMode::Still]
        } else {
            RenderMode::ALL.to_vec()
        }
    }

    /// Switch the render mode and re-suffix the output name for it.
    pub fn set_render_mode(&mut self, mode: RenderMode) -> RenderkitResult<()> {
        if mode.is_sequence() && self.composition.is_still_only() {
            return Err(RenderkitError::invalid_selection(format!(
                "{} has a single frame and can only be rendered as a still",
                self.composition.id
            )));
        }
        if mode != self.mode {
            tracing::debug!(from = %self.mode, to = %mode, "Render mode changed");
        }
        self.mode = mode;
        self.sync_output_suffix();
        Ok(())
    }

    /// Codec used by the current mode; still mode reports the video slot.
    pub fn codec(&self) -> Codec {
        match self.mode {
            RenderMode::Audio => self.slots.audio_codec,
            RenderMode::Still | RenderMode::Video => self.slots.video_codec,
        }
    }

    /// Codecs selectable in the current mode. Empty in still mode.
    pub fn codec_options(&self) -> Vec<Codec> {
        match self.mode {
            RenderMode::Still => Vec::new(),
            RenderMode::Video => self.services.catalog.codecs_for(false),
            RenderMode::Audio => self.services.catalog.codecs_for(true),
        }
    }

    /// Pick a codec for the current mode.
    pub fn set_codec(&mut self, codec: Codec) -> RenderkitResult<()> {
        if !self.codec_options().contains(&codec) {
            return Err(RenderkitError::invalid_selection(format!(
                "codec {codec} is not available in {} mode",
                self.mode
            )));
        }
        if self.mode == RenderMode::Audio {
            self.slots.audio_codec = codec;
        } else {
            self.slots.video_codec = codec;
        }
        self.sync_output_suffix();
        Ok(())
    }

    pub fn still_format(&self) -> ImageFormat {
        self.slots.still_format
    }

    /// Pick the still image format. Only valid in still mode.
    pub fn set_still_format(&mut self, format: ImageFormat) -> RenderkitResult<()> {
        if self.mode != RenderMode::Still {
            return Err(RenderkitError::invalid_selection(format!(
                "still image format cannot be set in {} mode",
                self.mode
            )));
        }
        self.slots.still_format = format;
        self.sync_output_suffix();
        Ok(())
    }

    pub fn video_image_format(&self) -> ImageFormat {
        self.slots.video_frame_format
    }

    /// Pick the frame format for video renders. Only valid in video mode.
    pub fn set_video_image_format(&mut self, format: ImageFormat) -> RenderkitResult<()> {
        if self.mode != RenderMode::Video {
            return Err(RenderkitError::invalid_selection(format!(
                "video image format cannot be set in {} mode",
                self.mode
            )));
        }
        self.slots.video_frame_format = format;
        Ok(())
    }

    /// Image format that applies to the current mode.
    pub fn active_image_format(&self) -> ImageFormat {
        match self.active_output() {
            ActiveOutput::Still { format } => format,
            ActiveOutput::Sequence { frame_format, .. } => frame_format,
        }
    }

    /// Whether the quality control applies.
    pub fn shows_quality(&self) -> bool {
        self.active_image_format().uses_quality()
    }

    fn active_output(&self) -> ActiveOutput {
        match self.mode {
            RenderMode::Still => ActiveOutput::Still {
                format: self.slots.still_format,
            },
            RenderMode::Video | RenderMode::Audio => ActiveOutput::Sequence {
                codec: self.codec(),
                frame_format: self.slots.video_frame_format,
            },
        }
    }

    fn sync_output_suffix(&mut self) {
        let extension = match self.active_output() {
            ActiveOutput::Still { format } => format.extension(),
            ActiveOutput::Sequence { codec, .. } => self.services.catalog.file_extension(codec),
        };
        self.output_name = with_extension(&self.output_name, extension);
    }

    // ---- frames ------------------------------------------------------

    /// Still frame, clamped to the composition.
    pub fn frame(&self) -> u64 {
        self.frames.frame(self.composition.duration_in_frames)
    }

    pub fn start_frame(&self) -> u64 {
        self.frames.start_frame(self.composition.duration_in_frames)
    }

    pub fn end_frame(&self) -> u64 {
        self.frames.end_frame(self.composition.duration_in_frames)
    }

    pub fn set_frame<'a>(&mut self, raw: impl Into<NumericInput<'a>>) {
        if let Some(value) = raw.into().parse() {
            self.frames.unclamped_frame = value;
        }
    }

    pub fn set_start_frame<'a>(&mut self, raw: impl Into<NumericInput<'a>>) {
        if let Some(value) = raw.into().parse() {
            self.frames.start_raw = Some(value);
        }
    }

    pub fn set_end_frame<'a>(&mut self, raw: impl Into<NumericInput<'a>>) {
        if let Some(value) = raw.into().parse() {
            self.frames.end_raw = Some(value);
        }
    }

    // ---- concurrency, quality, scale, crf, name ------------------------

    pub fn concurrency(&self) -> u32 {
        self.concurrency
    }

    pub fn concurrency_bounds(&self) -> (u32, u32) {
        (self.min_concurrency, self.max_concurrency)
    }

    /// Set concurrency, truncated to an integer and clamped immediately.
    pub fn set_concurrency<'a>(&mut self, raw: impl Into<NumericInput<'a>>) {
        if let Some(value) = raw.into().parse() {
            let clamped = value.trunc().clamp(
                f64::from(self.min_concurrency),
                f64::from(self.max_concurrency),
            );
            self.concurrency = clamped as u32;
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn set_quality(&mut self, quality: u8) {
        self.quality = quality;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// CRF range of the current codec; `None` hides the CRF control.
    pub fn crf_bounds(&self) -> Option<CrfBounds> {
        match self.active_output() {
            ActiveOutput::Still { .. } => None,
            ActiveOutput::Sequence { codec, .. } => self.services.catalog.crf_bounds(codec),
        }
    }

    /// CRF for the current codec, clamped to its range.
    pub fn crf(&self) -> Option<u32> {
        match self.active_output() {
            ActiveOutput::Still { .. } => None,
            ActiveOutput::Sequence { codec, .. } => self.crf_for(codec),
        }
    }

    /// Store a CRF; it is clamped against whichever codec is active when read.
    pub fn set_crf(&mut self, crf: u32) {
        self.crf = Some(crf);
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Set the output name verbatim. It is re-suffixed on the next
    /// mode, codec or still-format change.
    pub fn set_output_name(&mut self, name: impl Into<String>) {
        self.output_name = name.into();
    }

    // ---- descriptors ---------------------------------------------------

    fn quality_for(&self, format: ImageFormat) -> Option<u8> {
        format.uses_quality().then_some(self.quality)
    }

    /// Descriptor for a still render of the current state.
    pub fn resolve_still_job(&self) -> StillJob {
        let image_format = self.slots.still_format;
        StillJob {
            composition_id: self.composition.id.clone(),
            out_name: self.output_name.clone(),
            image_format,
            quality: self.quality_for(image_format),
            frame: self.frame(),
            scale: self.scale,
            verbose: self.verbose,
        }
    }

    /// Descriptor for a video or audio render of the current state.
    pub fn resolve_video_job(&self) -> VideoJob {
        let codec = self.codec();
        let image_format = self.slots.video_frame_format;
        VideoJob {
            composition_id: self.composition.id.clone(),
            out_name: self.output_name.clone(),
            image_format,
            quality: self.quality_for(image_format),
            scale: self.scale,
            verbose: self.verbose,
            codec,
            concurrency: self.concurrency,
            crf: self.crf_for(codec),
            start_frame: self.start_frame(),
            end_frame: self.end_frame(),
        }
    }

    /// User CRF (or the codec default) clamped to the codec's range.
    fn crf_for(&self, codec: Codec) -> Option<u32> {
        let catalog = &self.services.catalog;
        let bounds = catalog.crf_bounds(codec)?;
        let crf = self
            .crf
            .or_else(|| catalog.default_crf(codec))
            .unwrap_or(bounds.min);
        Some(bounds.clamp(crf))
    }

    /// Descriptor matching the current mode.
    pub fn resolve_job(&self) -> RenderJob {
        match self.mode {
            RenderMode::Still => RenderJob::Still(self.resolve_still_job()),
            RenderMode::Video | RenderMode::Audio => RenderJob::Video(self.resolve_video_job()),
        }
    }

    // ---- submission ------------------------------------------------------

    pub fn submission_state(&self) -> SubmissionState {
        self.submission.state()
    }

    /// Whether the dialog is still open.
    pub fn is_alive(&self) -> bool {
        self.submission.is_alive()
    }

    /// Hand `job` to the render queue.
    ///
    /// Moves the state to `Loading` and returns the task that waits for the
    /// queue. A second submission while one is pending is refused.
    pub fn submit(&self, job: impl Into<RenderJob>) -> RenderkitResult<SubmissionTask> {
        let job = job.into();
        self.submission.begin()?;
        tracing::info!(
            composition = %self.composition.id,
            out_name = job.out_name(),
            "Submitting render job"
        );
        Ok(SubmissionTask::new(
            job,
            Arc::clone(&self.services.queue),
            Arc::clone(&self.services.host),
            self.submission.clone(),
        ))
    }

    /// Submit the still descriptor for the current state.
    pub fn submit_still(&self) -> RenderkitResult<SubmissionTask> {
        self.submit(self.resolve_still_job())
    }

    /// Submit the video/audio descriptor for the current state.
    pub fn submit_video(&self) -> RenderkitResult<SubmissionTask> {
        self.submit(self.resolve_video_job())
    }

    /// Close the session. Pending submission results are dropped from now on.
    pub fn teardown(&self) {
        if self.submission.teardown() {
            tracing::debug!(composition = %self.composition.id, "Render settings closed");
        }
    }
}

impl Drop for RenderConfigResolver {
    fn drop(&mut self) {
        self.teardown();
    }
}
