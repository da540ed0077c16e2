//! Syllabus Analyzer
//!
//! Web service that discovers syllabus PDFs on institutional pages, extracts
//! course metadata with an LLM, and cross-references reading materials
//! against the library catalog. Layered domain / application /
//! infrastructure / presentation architecture; all pipeline work runs as
//! background stages observed through the job store.

mod app;

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use app::{AppHandle, create_app};
pub use config::Config;
pub use logging::init_tracing;
