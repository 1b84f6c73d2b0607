//! Renderkit Resolver
//!
//! Turns the raw contents of a render dialog into a render job and hands it
//! to a render queue.
//!
//! # Flow
//!
//! ```text
//! CompositionRegistry ──lookup──┐
//!                               ▼
//! user input ──setters──▶ RenderConfigResolver ──resolve──▶ StillJob / VideoJob
//!                               │                                  │
//!                         CodecCatalog                          submit
//!                                                                  ▼
//!                                              SubmissionTask ──▶ RenderJobQueue
//!                                                     │
//!                                                     └─ success ─▶ DialogHost
//! ```
//!
//! The resolver is single-threaded state; the submission task is the only
//! piece that runs asynchronously and it stops touching shared state once
//! the resolver is torn down.

pub mod frames;
pub mod input;
pub mod output_name;
pub mod queue;
pub mod resolver;
pub mod submission;

pub use input::NumericInput;
pub use queue::{DirectoryJobQueue, JobReceipt, QueuedJob, RenderJobQueue};
pub use resolver::{RenderConfigResolver, RenderServices, ResolverOptions, DEFAULT_QUALITY};
pub use submission::{
    DialogHost, SubmissionOutcome, SubmissionState, SubmissionTask, SubmissionTracker,
};
