//! Request handlers, grouped by concern

pub mod jobs;
pub mod results;
