//! Core domain entities and value objects

pub mod job;
pub mod metadata;

pub use job::{Department, Job, JobPatch, JobStage, JobStatus, NewJob};
pub use metadata::{
    Availability, ExtractedMetadata, LibraryMatch, LibraryResource, MaterialType, MetadataField,
    ReadingMaterial, Requirement, SyllabusMetadata,
};
