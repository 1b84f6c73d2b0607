//! Render job queue interface and a file-backed implementation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use renderkit_common::error::{RenderkitError, RenderkitResult};
use renderkit_model::job::{RenderJob, StillJob, VideoJob};

/// Acknowledgment returned by a queue that accepted a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReceipt {
    /// Queue-assigned job id.
    pub job_id: String,
}

/// Trait for render job queues (local worker, job directory, remote service).
#[async_trait::async_trait]
pub trait RenderJobQueue: Send + Sync {
    /// Queue a still render.
    async fn enqueue_still(&self, job: StillJob) -> RenderkitResult<JobReceipt>;

    /// Queue a video or audio render.
    async fn enqueue_video(&self, job: VideoJob) -> RenderkitResult<JobReceipt>;

    /// Queue either kind of job.
    async fn enqueue(&self, job: RenderJob) -> RenderkitResult<JobReceipt> {
        match job {
            RenderJob::Still(job) => self.enqueue_still(job).await,
            RenderJob::Video(job) => self.enqueue_video(job).await,
        }
    }
}

/// A job as written to the queue directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedJob {
    pub job_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub job: RenderJob,
}

/// Queue that stores each job as `queued/job_<id>.json` under a root directory.
///
/// A separate worker picks the files up; this type only writes and lists them.
#[derive(Debug)]
pub struct DirectoryJobQueue {
    root: PathBuf,
    counter: AtomicU64,
}

impl DirectoryJobQueue {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding jobs waiting for a worker.
    pub fn queued_dir(&self) -> PathBuf {
        self.root.join("queued")
    }

    /// Every job currently in the queued directory, oldest first.
    pub fn list_queued(&self) -> RenderkitResult<Vec<QueuedJob>> {
        let dir = self.queued_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut jobs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read job file: {}", path.display()))?;
            match serde_json::from_str::<QueuedJob>(&content) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable job file");
                }
            }
        }
        jobs.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        Ok(jobs)
    }

    fn next_job_id(&self, now: chrono::DateTime<chrono::Utc>) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}-{:09}-{seq:04}",
            now.format("%Y%m%dT%H%M%S"),
            now.timestamp_subsec_nanos()
        )
    }

    fn write_job(&self, job: RenderJob) -> RenderkitResult<JobReceipt> {
        let created_at = chrono::Utc::now();
        let job_id = self.next_job_id(created_at);
        self.write_job_with_id(job, created_at, job_id)
    }

    /// Write a job file. An existing file with the same id is an error.
    fn write_job_with_id(
        &self,
        job: RenderJob,
        created_at: chrono::DateTime<chrono::Utc>,
        job_id: String,
    ) -> RenderkitResult<JobReceipt> {
        let dir = self.queued_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create jobs dir: {}", dir.display()))?;

        let queued = QueuedJob {
            job_id: job_id.clone(),
            created_at,
            job,
        };

        let path = dir.join(format!("job_{job_id}.json"));
        let content = serde_json::to_string_pretty(&queued)?;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("failed to create job file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("failed to write job file: {}", path.display()))?;

        tracing::info!(
            job_id = %job_id,
            composition = queued.job.composition_id(),
            path = %path.display(),
            "Queued render job"
        );
        Ok(JobReceipt { job_id })
    }
}

#[async_trait::async_trait]
impl RenderJobQueue for DirectoryJobQueue {
    async fn enqueue_still(&self, job: StillJob) -> RenderkitResult<JobReceipt> {
        self.write_job(RenderJob::Still(job))
    }

    async fn enqueue_video(&self, job: VideoJob) -> RenderkitResult<JobReceipt> {
        if job.end_frame < job.start_frame {
            return Err(RenderkitError::queue(format!(
                "frame range {}..={} is empty",
                job.start_frame, job.end_frame
            )));
        }
        self.write_job(RenderJob::Video(job))
    }
}
