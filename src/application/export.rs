//! Result export
//!
//! JSON export is the persisted document verbatim; CSV flattens each syllabus
//! to one row with reading-material and library-match summary columns.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Availability, ExtractedMetadata, Requirement};
use crate::infrastructure::results::ResultsRepository;

use super::errors::AppError;

/// Export format requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

/// A rendered export document ready to stream to the client
#[derive(Debug)]
pub struct ExportDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

pub struct ExportService {
    results: Arc<ResultsRepository>,
}

impl ExportService {
    pub fn new(results: Arc<ResultsRepository>) -> Self {
        Self { results }
    }

    /// Load the job's results, preferring the library-enriched document.
    pub async fn load(&self, job_id: Uuid) -> Result<Vec<ExtractedMetadata>, AppError> {
        Ok(self.results.load(job_id).await?)
    }

    pub async fn export(
        &self,
        job_id: Uuid,
        format: ExportFormat,
    ) -> Result<ExportDocument, AppError> {
        let entries = self.load(job_id).await?;
        match format {
            ExportFormat::Json => Ok(ExportDocument {
                bytes: serde_json::to_vec_pretty(&entries)?,
                content_type: "application/json",
                filename: format!("syllabus_results_{}.json", job_id),
            }),
            ExportFormat::Csv => Ok(ExportDocument {
                bytes: render_csv(&entries)?,
                content_type: "text/csv",
                filename: format!("syllabus_results_{}.csv", job_id),
            }),
        }
    }
}

const CSV_HEADERS: [&str; 15] = [
    "filename",
    "year",
    "semester",
    "class_name",
    "class_number",
    "instructor",
    "university",
    "main_topic",
    "reading_materials_count",
    "required_materials",
    "optional_materials",
    "reading_materials_list",
    "library_matches_count",
    "available_resources",
    "unavailable_resources",
];

fn render_csv(entries: &[ExtractedMetadata]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADERS)
        .map_err(csv_error)?;

    for entry in entries {
        let m = &entry.metadata;
        let materials = m.reading_materials.as_deref().unwrap_or(&[]);

        let required = materials
            .iter()
            .filter(|r| r.requirement == Requirement::Required)
            .count();
        let optional = materials.len().saturating_sub(required);
        let list = materials
            .iter()
            .map(|r| match &r.creator {
                Some(creator) => format!("{} ({})", r.title, creator),
                None => r.title.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");

        let match_count = entry.library_matches.len();
        let available = entry
            .library_matches
            .iter()
            .flat_map(|lm| &lm.matches)
            .filter(|r| r.availability == Availability::Available)
            .count();
        let unavailable = entry
            .library_matches
            .iter()
            .flat_map(|lm| &lm.matches)
            .filter(|r| r.availability != Availability::Available)
            .count();

        writer
            .write_record([
                entry.filename.as_str(),
                m.year.as_deref().unwrap_or(""),
                m.semester.as_deref().unwrap_or(""),
                m.class_name.as_deref().unwrap_or(""),
                m.class_number.as_deref().unwrap_or(""),
                m.instructor.as_deref().unwrap_or(""),
                m.university.as_deref().unwrap_or(""),
                m.main_topic.as_deref().unwrap_or(""),
                &materials.len().to_string(),
                &required.to_string(),
                &optional.to_string(),
                &list,
                &match_count.to_string(),
                &available.to_string(),
                &unavailable.to_string(),
            ])
            .map_err(csv_error)?;
    }

    writer.into_inner().map_err(csv_error)
}

fn csv_error(e: impl std::fmt::Display) -> AppError {
    AppError::InvalidRequest(format!("CSV rendering failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        LibraryMatch, LibraryResource, MaterialType, ReadingMaterial, SyllabusMetadata,
    };

    fn entry() -> ExtractedMetadata {
        ExtractedMetadata {
            filename: "phil101.pdf".to_string(),
            metadata: SyllabusMetadata {
                year: Some("2025".to_string()),
                class_name: Some("Introduction to Ethics".to_string()),
                instructor: Some("Dr. Reed".to_string()),
                reading_materials: Some(vec![
                    ReadingMaterial {
                        title: "Nicomachean Ethics".to_string(),
                        creator: Some("Aristotle".to_string()),
                        material_type: MaterialType::Book,
                        requirement: crate::domain::Requirement::Required,
                        url: None,
                    },
                    ReadingMaterial {
                        title: "Ethics Companion".to_string(),
                        creator: None,
                        material_type: MaterialType::Book,
                        requirement: crate::domain::Requirement::Optional,
                        url: None,
                    },
                ]),
                ..Default::default()
            },
            library_matches: vec![LibraryMatch {
                original_query: "Nicomachean Ethics".to_string(),
                match_score: 1.0,
                matches: vec![
                    LibraryResource {
                        title: "Nicomachean Ethics".to_string(),
                        creator: Some("Aristotle".to_string()),
                        availability: Availability::Available,
                        link: None,
                    },
                    LibraryResource {
                        title: "Nicomachean Ethics (reserve copy)".to_string(),
                        creator: None,
                        availability: Availability::CheckedOut,
                        link: None,
                    },
                ],
            }],
        }
    }

    #[test]
    fn csv_has_expected_headers_and_counts() {
        let bytes = render_csv(&[entry()]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert_eq!(header, CSV_HEADERS.join(","));

        let row = lines.next().unwrap();
        assert!(row.starts_with("phil101.pdf,2025,"));
        assert!(row.contains("Nicomachean Ethics (Aristotle); Ethics Companion"));
        // 2 materials, 1 required, 1 optional, 1 match group, 1 available, 1 not.
        assert!(row.ends_with(",2,1,1,Nicomachean Ethics (Aristotle); Ethics Companion,1,1,1"));
    }

    #[test]
    fn empty_results_render_headers_only() {
        let bytes = render_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.trim_end(), CSV_HEADERS.join(","));
    }
}
