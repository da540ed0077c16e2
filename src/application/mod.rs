//! Use cases: stage runners, export, and the shared error taxonomy

pub mod errors;
pub mod export;
pub mod stages;

pub use errors::AppError;
