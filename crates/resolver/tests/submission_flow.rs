use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use renderkit_common::error::{RenderkitError, RenderkitResult};
use renderkit_model::{
    Codec, CompositionRef, DefaultCodecCatalog, ImageFormat, InMemoryRegistry, RenderJob,
    RenderMode, StillJob, VideoJob,
};
use renderkit_resolver::{
    DialogHost, DirectoryJobQueue, JobReceipt, RenderConfigResolver, RenderJobQueue,
    RenderServices, ResolverOptions, SubmissionOutcome, SubmissionState,
};
use tokio::sync::Notify;

/// Queue that holds every job until the test releases it.
struct GatedQueue {
    accept: bool,
    release: Notify,
    received: std::sync::Mutex<Vec<RenderJob>>,
}

impl GatedQueue {
    fn new(accept: bool) -> Arc<Self> {
        Arc::new(Self {
            accept,
            release: Notify::new(),
            received: std::sync::Mutex::new(Vec::new()),
        })
    }

    async fn answer(&self, job: RenderJob) -> RenderkitResult<JobReceipt> {
        self.received.lock().unwrap().push(job);
        self.release.notified().await;
        if self.accept {
            Ok(JobReceipt {
                job_id: "job-1".to_string(),
            })
        } else {
            Err(RenderkitError::queue("worker offline"))
        }
    }
}

#[async_trait::async_trait]
impl RenderJobQueue for GatedQueue {
    async fn enqueue_still(&self, job: StillJob) -> RenderkitResult<JobReceipt> {
        self.answer(RenderJob::Still(job)).await
    }

    async fn enqueue_video(&self, job: VideoJob) -> RenderkitResult<JobReceipt> {
        self.answer(RenderJob::Video(job)).await
    }
}

#[derive(Default)]
struct RecordingHost {
    panel_selected: AtomicUsize,
    closed: AtomicUsize,
}

impl DialogHost for RecordingHost {
    fn select_renders_panel(&self) {
        self.panel_selected.fetch_add(1, Ordering::SeqCst);
    }

    fn close_dialog(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn open(
    queue: Arc<dyn RenderJobQueue>,
    host: Arc<RecordingHost>,
    mode: RenderMode,
) -> RenderConfigResolver {
    let registry = InMemoryRegistry::new(vec![
        CompositionRef::new("intro", 120),
        CompositionRef::new("thumbnail", 1),
    ])
    .unwrap();
    let services = RenderServices {
        catalog: Arc::new(DefaultCodecCatalog),
        queue,
        host,
    };
    let options = ResolverOptions {
        render_mode: mode,
        output_name: "out.mp4".to_string(),
        min_concurrency: 1,
        max_concurrency: 4,
        concurrency: 2,
        ..ResolverOptions::default()
    };
    RenderConfigResolver::open(&registry, "intro", services, options).unwrap()
}

#[tokio::test]
async fn success_dismisses_dialog() {
    let queue = GatedQueue::new(true);
    let host = Arc::new(RecordingHost::default());
    let resolver = open(queue.clone(), host.clone(), RenderMode::Video);

    let task = resolver.submit_video().unwrap();
    assert_eq!(resolver.submission_state(), SubmissionState::Loading);

    let handle = tokio::spawn(task.run());
    queue.release.notify_one();
    let outcome = handle.await.unwrap();

    assert_eq!(
        outcome,
        SubmissionOutcome::Accepted(JobReceipt {
            job_id: "job-1".to_string()
        })
    );
    assert_eq!(resolver.submission_state(), SubmissionState::Success);
    assert_eq!(host.panel_selected.load(Ordering::SeqCst), 1);
    assert_eq!(host.closed.load(Ordering::SeqCst), 1);

    let received = queue.received.lock().unwrap();
    match &received[..] {
        [RenderJob::Video(job)] => {
            assert_eq!(job.codec, Codec::H264);
            assert_eq!((job.start_frame, job.end_frame), (0, 119));
            assert_eq!(job.concurrency, 2);
        }
        other => panic!("unexpected jobs: {other:?}"),
    }
}

#[tokio::test]
async fn failure_keeps_dialog_open_and_allows_retry() {
    let queue = GatedQueue::new(false);
    let host = Arc::new(RecordingHost::default());
    let resolver = open(queue.clone(), host.clone(), RenderMode::Still);

    let task = resolver.submit_still().unwrap();
    let handle = tokio::spawn(task.run());
    queue.release.notify_one();
    assert_eq!(handle.await.unwrap(), SubmissionOutcome::Rejected);

    assert_eq!(resolver.submission_state(), SubmissionState::Error);
    assert_eq!(host.closed.load(Ordering::SeqCst), 0);
    assert!(resolver.is_alive());

    // A fresh submit restarts at Loading.
    let retry = resolver.submit_still().unwrap();
    assert_eq!(resolver.submission_state(), SubmissionState::Loading);
    let handle = tokio::spawn(retry.run());
    queue.release.notify_one();
    assert_eq!(handle.await.unwrap(), SubmissionOutcome::Rejected);
    assert_eq!(queue.received.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn second_submit_while_loading_is_refused() {
    let queue = GatedQueue::new(true);
    let host = Arc::new(RecordingHost::default());
    let resolver = open(queue.clone(), host.clone(), RenderMode::Video);

    let task = resolver.submit_video().unwrap();
    assert!(matches!(
        resolver.submit_video(),
        Err(RenderkitError::SubmissionInFlight)
    ));

    let handle = tokio::spawn(task.run());
    queue.release.notify_one();
    handle.await.unwrap();
    assert_eq!(queue.received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn abandoned_submission_can_be_retried() {
    let queue = GatedQueue::new(true);
    let host = Arc::new(RecordingHost::default());
    let resolver = open(queue.clone(), host.clone(), RenderMode::Video);

    let task = resolver.submit_video().unwrap();
    drop(task);
    assert_eq!(resolver.submission_state(), SubmissionState::Error);
    assert_eq!(host.closed.load(Ordering::SeqCst), 0);

    let retry = resolver.submit_video().unwrap();
    let handle = tokio::spawn(retry.run());
    queue.release.notify_one();
    assert!(matches!(
        handle.await.unwrap(),
        SubmissionOutcome::Accepted(_)
    ));
    assert_eq!(resolver.submission_state(), SubmissionState::Success);
    assert_eq!(host.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancelled_submission_can_be_retried() {
    let queue = GatedQueue::new(true);
    let host = Arc::new(RecordingHost::default());
    let resolver = open(queue.clone(), host.clone(), RenderMode::Video);

    let handle = tokio::spawn(resolver.submit_video().unwrap().run());
    tokio::task::yield_now().await;
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    assert_eq!(resolver.submission_state(), SubmissionState::Error);
    assert!(resolver.submit_video().is_ok());
}

#[tokio::test]
async fn result_after_teardown_is_discarded() {
    let queue = GatedQueue::new(true);
    let host = Arc::new(RecordingHost::default());
    let resolver = open(queue.clone(), host.clone(), RenderMode::Video);

    let task = resolver.submit_video().unwrap();
    let handle = tokio::spawn(task.run());
    tokio::task::yield_now().await;

    resolver.teardown();
    queue.release.notify_one();
    assert_eq!(handle.await.unwrap(), SubmissionOutcome::Discarded);

    assert_eq!(resolver.submission_state(), SubmissionState::Loading);
    assert_eq!(host.panel_selected.load(Ordering::SeqCst), 0);
    assert_eq!(host.closed.load(Ordering::SeqCst), 0);
    assert!(matches!(
        resolver.submit_video(),
        Err(RenderkitError::DialogClosed)
    ));
}

#[tokio::test]
async fn dropping_the_resolver_discards_pending_result() {
    let queue = GatedQueue::new(true);
    let host = Arc::new(RecordingHost::default());
    let resolver = open(queue.clone(), host.clone(), RenderMode::Video);

    let task = resolver.submit_video().unwrap();
    drop(resolver);

    let handle = tokio::spawn(task.run());
    queue.release.notify_one();
    assert_eq!(handle.await.unwrap(), SubmissionOutcome::Discarded);
    assert_eq!(host.closed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn still_render_lands_in_job_directory() {
    let dir = std::env::temp_dir().join("renderkit_test_submission_flow_queue");
    let _ = std::fs::remove_dir_all(&dir);

    let queue = Arc::new(DirectoryJobQueue::new(&dir));
    let host = Arc::new(RecordingHost::default());
    let mut resolver = open(queue.clone(), host.clone(), RenderMode::Still);

    resolver.set_still_format(ImageFormat::Jpeg).unwrap();
    resolver.set_frame("300");
    resolver.set_quality(90);
    assert_eq!(resolver.output_name(), "out.jpeg");

    let outcome = resolver.submit_still().unwrap().run().await;
    assert!(matches!(outcome, SubmissionOutcome::Accepted(_)));
    assert_eq!(host.closed.load(Ordering::SeqCst), 1);

    let jobs = queue.list_queued().unwrap();
    assert_eq!(jobs.len(), 1);
    match &jobs[0].job {
        RenderJob::Still(job) => {
            assert_eq!(job.out_name, "out.jpeg");
            assert_eq!(job.frame, 119);
            assert_eq!(job.quality, Some(90));
        }
        other => panic!("expected a still job, got {other:?}"),
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn single_frame_composition_cannot_switch_to_video() {
    let registry = InMemoryRegistry::new(vec![CompositionRef::new("thumbnail", 1)]).unwrap();
    let services = RenderServices {
        catalog: Arc::new(DefaultCodecCatalog),
        queue: GatedQueue::new(true),
        host: Arc::new(RecordingHost::default()),
    };
    let mut resolver =
        RenderConfigResolver::open(&registry, "thumbnail", services, ResolverOptions::default())
            .unwrap();

    assert_eq!(resolver.render_mode_options(), vec![RenderMode::Still]);
    assert!(resolver.set_render_mode(RenderMode::Video).is_err());
    assert_eq!(resolver.render_mode(), RenderMode::Still);
}
