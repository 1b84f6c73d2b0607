//! Resolve render settings for a composition and queue the job.

use std::path::Path;
use std::sync::Arc;

use renderkit_common::config::AppConfig;
use renderkit_model::{
    Codec, CodecCatalog, DefaultCodecCatalog, ImageFormat, InMemoryRegistry, RenderJob, RenderMode,
};
use renderkit_resolver::{
    DialogHost, DirectoryJobQueue, RenderConfigResolver, RenderServices, ResolverOptions,
    SubmissionOutcome,
};

use crate::{CommonRenderArgs, RangeArgs};

/// Everything the user asked for on the command line, before resolution.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub id: String,
    pub mode: RenderMode,
    pub frame: Option<String>,
    pub image_format: Option<String>,
    pub codec: Option<String>,
    pub crf: Option<u32>,
    pub range: RangeArgs,
    pub common: CommonRenderArgs,
}

impl RenderRequest {
    pub fn still(
        id: String,
        frame: Option<String>,
        format: Option<String>,
        common: CommonRenderArgs,
    ) -> Self {
        Self {
            id,
            mode: RenderMode::Still,
            frame,
            image_format: format,
            codec: None,
            crf: None,
            range: RangeArgs::default(),
            common,
        }
    }

    pub fn video(
        id: String,
        codec: Option<String>,
        image_format: Option<String>,
        crf: Option<u32>,
        range: RangeArgs,
        common: CommonRenderArgs,
    ) -> Self {
        Self {
            id,
            mode: RenderMode::Video,
            frame: None,
            image_format,
            codec,
            crf,
            range,
            common,
        }
    }

    pub fn audio(
        id: String,
        codec: Option<String>,
        range: RangeArgs,
        common: CommonRenderArgs,
    ) -> Self {
        Self {
            id,
            mode: RenderMode::Audio,
            frame: None,
            image_format: None,
            codec,
            crf: None,
            range,
            common,
        }
    }
}

/// Dialog host for a terminal session: there is no panel to switch to, so
/// both callbacks just log.
struct ConsoleHost;

impl DialogHost for ConsoleHost {
    fn select_renders_panel(&self) {
        tracing::debug!("Render queued; see `renderkit jobs`");
    }

    fn close_dialog(&self) {
        tracing::debug!("Render session finished");
    }
}

pub async fn run(
    config: &AppConfig,
    compositions: &Path,
    request: RenderRequest,
) -> anyhow::Result<()> {
    let registry = InMemoryRegistry::load(compositions)
        .map_err(|e| anyhow::anyhow!("Failed to load compositions: {e}"))?;

    let catalog: Arc<dyn CodecCatalog> = Arc::new(DefaultCodecCatalog);
    let services = RenderServices {
        catalog: catalog.clone(),
        queue: Arc::new(DirectoryJobQueue::new(&config.jobs_dir)),
        host: Arc::new(ConsoleHost),
    };

    let options = ResolverOptions::from_defaults(&config.render, request.mode, &*catalog)?;

    let mut resolver = RenderConfigResolver::open(&registry, &request.id, services, options)?;
    if resolver.render_mode() != request.mode {
        anyhow::bail!(
            "Composition {} only supports {} renders",
            request.id,
            resolver.render_mode()
        );
    }

    apply(&mut resolver, &request)?;
    print_summary(&resolver);

    let job = resolver.resolve_job();
    let task = resolver.submit(job)?;
    match task.run().await {
        SubmissionOutcome::Accepted(receipt) => {
            println!("Queued job {} in {}", receipt.job_id, config.jobs_dir.display());
            Ok(())
        }
        SubmissionOutcome::Rejected => Err(anyhow::anyhow!("The render queue rejected the job")),
        SubmissionOutcome::Discarded => Err(anyhow::anyhow!(
            "Render session closed before the queue answered"
        )),
    }
}

fn apply(resolver: &mut RenderConfigResolver, request: &RenderRequest) -> anyhow::Result<()> {
    if let Some(codec) = &request.codec {
        let codec: Codec = codec.parse()?;
        resolver.set_codec(codec)?;
    }

    if let Some(format) = &request.image_format {
        let format: ImageFormat = format.parse()?;
        match request.mode {
            RenderMode::Still => resolver.set_still_format(format)?,
            RenderMode::Video => resolver.set_video_image_format(format)?,
            RenderMode::Audio => {}
        }
    }

    if let Some(frame) = &request.frame {
        resolver.set_frame(frame);
    }
    if let Some(start) = &request.range.start {
        resolver.set_start_frame(start);
    }
    if let Some(end) = &request.range.end {
        resolver.set_end_frame(end);
    }
    if let Some(concurrency) = &request.range.concurrency {
        resolver.set_concurrency(concurrency);
    }

    if let Some(crf) = request.crf {
        resolver.set_crf(crf);
    }
    if let Some(quality) = request.common.quality {
        resolver.set_quality(quality);
    }
    if let Some(scale) = request.common.scale {
        resolver.set_scale(scale);
    }
    resolver.set_verbose(request.common.render_verbose);

    // Last, so an explicit name wins over the suffix sync above.
    if let Some(output) = &request.common.output {
        resolver.set_output_name(output.clone());
    }

    Ok(())
}

fn print_summary(resolver: &RenderConfigResolver) {
    let composition = resolver.composition();
    println!(
        "Rendering {} ({} frames)",
        composition.id, composition.duration_in_frames
    );
    println!("  Mode: {}", resolver.render_mode());

    match resolver.resolve_job() {
        RenderJob::Still(job) => {
            println!("  Frame: {}", job.frame);
            println!("  Format: {}", job.image_format);
            if let Some(quality) = job.quality {
                println!("  Quality: {quality}");
            }
            println!("  Scale: {}", job.scale);
        }
        RenderJob::Video(job) => {
            println!("  Codec: {}", job.codec);
            println!(
                "  Frames: {}-{} ({} total)",
                job.start_frame,
                job.end_frame,
                job.frame_count()
            );
            println!("  Concurrency: {}", job.concurrency);
            if let Some(crf) = job.crf {
                println!("  CRF: {crf}");
            }
            if resolver.render_mode() == RenderMode::Video {
                println!("  Frame format: {}", job.image_format);
                println!("  Scale: {}", job.scale);
            }
        }
    }

    println!("  Output: {}", resolver.output_name());
}
