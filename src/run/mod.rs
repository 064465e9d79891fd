//! One "download post" run and the state around it
//!
//! Everything a run touches is created inside
//! [`PostDownloader::download_post`] and dropped when it returns. The
//! [`RunRegistry`] of in-flight runs is the only state that outlives a run.

mod downloader;
mod log;
mod options;
mod post;
mod registry;

pub use downloader::{PostDownloader, RunError, RunSummary, SetupError};
pub use log::RunLog;
pub use options::RunOptions;
pub use post::Post;
pub use registry::{RunGuard, RunRegistry};
