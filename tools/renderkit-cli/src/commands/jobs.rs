//! List queued render jobs.

use renderkit_common::config::AppConfig;
use renderkit_model::RenderJob;
use renderkit_resolver::DirectoryJobQueue;

pub fn run(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let queue = DirectoryJobQueue::new(&config.jobs_dir);
    let jobs = queue
        .list_queued()
        .map_err(|e| anyhow::anyhow!("Failed to read job queue: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    if jobs.is_empty() {
        println!("No queued jobs in {}", queue.queued_dir().display());
        return Ok(());
    }

    println!("Queued jobs ({}):", jobs.len());
    for queued in &jobs {
        let detail = match &queued.job {
            RenderJob::Still(job) => format!("still frame {} {}", job.frame, job.image_format),
            RenderJob::Video(job) => format!(
                "{} frames {}-{} x{}",
                job.codec, job.start_frame, job.end_frame, job.concurrency
            ),
        };
        println!(
            "  {}  {}  {} -> {}  ({detail})",
            queued.job_id,
            queued.created_at.format("%Y-%m-%d %H:%M:%S"),
            queued.job.composition_id(),
            queued.job.out_name(),
        );
    }

    Ok(())
}
