//! Renderkit Model
//!
//! Defines the data contracts shared by the render resolver and the job queue:
//! - **Compositions:** Named, timed scenes and the registry they are looked up in
//! - **Codecs:** Encoding schemes, their audio/video family, file extensions and CRF ranges
//! - **Formats:** Render modes and frame image formats
//! - **Jobs:** Immutable still/video render descriptors handed to the queue
//!
//! Descriptors serialize as camelCase JSON; that is the on-disk job format.

pub mod codec;
pub mod composition;
pub mod format;
pub mod job;

pub use codec::*;
pub use composition::*;
pub use format::*;
pub use job::*;
