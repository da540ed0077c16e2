//! External integrations: job store, discovery, downloads, extraction,
//! library catalog, and result persistence

pub mod discovery;
pub mod downloader;
pub mod extraction;
pub mod job_store;
pub mod library;
pub mod results;
