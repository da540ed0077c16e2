//! Pipeline stage runners
//!
//! Each stage follows the same shape: `start` performs synchronous
//! precondition checks and the initial status transition, then spawns the
//! long-running work onto the runtime. Progress is only ever observable
//! through the job store.

pub mod download;
pub mod extraction;
pub mod library_match;

pub use download::DownloadStage;
pub use extraction::ExtractionStage;
pub use library_match::{Ack, LibraryMatchStage};
