//! Library catalog matching stage
//!
//! Cross-references extracted reading materials against the catalog. Entries
//! that are equipment or already carry a URL never hit the catalog; they get
//! a synthesized direct match. A second trigger while the stage is running is
//! acknowledged without starting duplicate work.

use std::sync::Arc;
use strsim::jaro_winkler;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::errors::AppError;
use crate::domain::{
    ExtractedMetadata, Job, JobPatch, JobStage, JobStatus, LibraryMatch, LibraryResource,
    MetadataField, ReadingMaterial,
};
use crate::infrastructure::job_store::{JobStore, JobStoreError};
use crate::infrastructure::library::LibraryCatalog;
use crate::infrastructure::results::ResultsRepository;

/// Outcome of a library-match trigger
#[derive(Debug)]
pub enum Ack {
    Started(Job),
    /// The stage was already in flight; no duplicate work was started.
    AlreadyRunning(Job),
}

pub struct LibraryMatchStage {
    store: Arc<dyn JobStore>,
    catalog: Arc<dyn LibraryCatalog>,
    results: Arc<ResultsRepository>,
}

impl LibraryMatchStage {
    pub fn new(
        store: Arc<dyn JobStore>,
        catalog: Arc<dyn LibraryCatalog>,
        results: Arc<ResultsRepository>,
    ) -> Self {
        Self {
            store,
            catalog,
            results,
        }
    }

    pub async fn start(self: &Arc<Self>, job_id: Uuid) -> Result<Ack, AppError> {
        let job = self.store.get(job_id).await?;
        let selected = job.selected_fields.as_deref().unwrap_or(&[]);
        if !selected.contains(&MetadataField::ReadingMaterials) {
            return Err(AppError::Precondition(
                "Reading materials were not selected during extraction".to_string(),
            ));
        }
        if !self.results.has_metadata(job_id).await {
            return Err(AppError::Precondition(
                "No extraction results found; run metadata extraction first".to_string(),
            ));
        }

        // Guarded entry under the store's write lock; of two concurrent
        // triggers exactly one transitions, the other sees the stage in
        // flight and is acknowledged without duplicate work.
        let transition = self
            .store
            .try_transition(
                job_id,
                JobStatus::Processing,
                JobPatch::new()
                    .stage(JobStage::LibraryMatch)
                    .progress(0)
                    .message("Starting library resource matching..."),
            )
            .await;
        let job = match transition {
            Ok(job) => job,
            Err(JobStoreError::InvalidTransition {
                from: JobStatus::Processing,
                ..
            }) => {
                let job = self.store.get(job_id).await?;
                if job.stage == JobStage::LibraryMatch {
                    return Ok(Ack::AlreadyRunning(job));
                }
                return Err(AppError::Precondition(
                    "Another processing stage is running for this job".to_string(),
                ));
            }
            Err(JobStoreError::InvalidTransition { from, .. }) => {
                return Err(AppError::Precondition(format!(
                    "Job is {} and cannot start library matching",
                    from
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let stage = Arc::clone(self);
        tokio::spawn(async move {
            stage.run(job_id).await;
        });
        Ok(Ack::Started(job))
    }

    async fn run(&self, job_id: Uuid) {
        if let Err(e) = self.execute(job_id).await {
            error!(job_id = %job_id, error = %e, "Library matching stage failed");
            let _ = self
                .store
                .update(
                    job_id,
                    JobPatch::new()
                        .status(JobStatus::Error)
                        .message(format!("Error: {}", e)),
                )
                .await;
        }
    }

    async fn execute(&self, job_id: Uuid) -> Result<(), AppError> {
        let mut entries: Vec<ExtractedMetadata> = self.results.load_metadata(job_id).await?;
        let total = entries.len();
        let mut attempted_queries = 0usize;
        let mut transport_failures = 0usize;

        for (i, entry) in entries.iter_mut().enumerate() {
            self.store
                .update(
                    job_id,
                    JobPatch::new()
                        .progress((i * 90 / total.max(1)) as u8)
                        .message(format!(
                            "Checking library resources for {} ({}/{})...",
                            entry.filename,
                            i + 1,
                            total
                        )),
                )
                .await?;

            let materials = entry
                .metadata
                .reading_materials
                .clone()
                .unwrap_or_default();

            let mut matches = Vec::with_capacity(materials.len());
            for material in &materials {
                if material.is_lookup_exempt() {
                    matches.push(LibraryMatch::synthesized(
                        material.title.clone(),
                        material.url.clone(),
                    ));
                    continue;
                }

                attempted_queries += 1;
                match self
                    .catalog
                    .search(&material.title, material.creator.as_deref())
                    .await
                {
                    Ok(resources) if !resources.is_empty() => {
                        matches.push(scored_match(material, resources));
                    }
                    Ok(_) => matches.push(LibraryMatch::not_found(material.title.clone())),
                    Err(e) => {
                        warn!(job_id = %job_id, title = %material.title, error = %e, "Catalog query failed");
                        if e.is_transport() {
                            transport_failures += 1;
                        }
                        matches.push(LibraryMatch::not_found(material.title.clone()));
                    }
                }
            }
            entry.library_matches = matches;
        }

        // Every single catalog query failing at the transport level means the
        // collaborator is down, not that the titles are obscure.
        if attempted_queries > 0 && transport_failures == attempted_queries {
            return Err(AppError::CollaboratorUnavailable(
                "Library catalog unreachable for all queries".to_string(),
            ));
        }

        self.store
            .update(
                job_id,
                JobPatch::new()
                    .progress(95)
                    .message("Saving library matching results..."),
            )
            .await?;

        let primo_file = self.results.save_primo(job_id, &entries).await?;

        let matched = entries
            .iter()
            .filter(|e| e.library_matches.iter().any(|m| !m.matches.is_empty()))
            .count();

        self.store
            .update(
                job_id,
                JobPatch::new()
                    .status(JobStatus::Completed)
                    .progress(100)
                    .primo_results_file(primo_file)
                    .message(format!(
                        "Library matching complete! Found matches for {}/{} syllabi",
                        matched, total
                    )),
            )
            .await?;

        info!(job_id = %job_id, matched, total, "Library matching stage finished");
        Ok(())
    }
}

/// Score a non-empty catalog result set against the original query title.
fn scored_match(material: &ReadingMaterial, resources: Vec<LibraryResource>) -> LibraryMatch {
    let query = material.title.to_lowercase();
    let score = resources
        .iter()
        .map(|r| jaro_winkler(&query, &r.title.to_lowercase()))
        .fold(0.0_f64, f64::max);

    LibraryMatch {
        original_query: material.title.clone(),
        match_score: score,
        matches: resources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, MaterialType, Requirement};

    fn material(title: &str) -> ReadingMaterial {
        ReadingMaterial {
            title: title.to_string(),
            creator: None,
            material_type: MaterialType::Book,
            requirement: Requirement::Required,
            url: None,
        }
    }

    fn resource(title: &str) -> LibraryResource {
        LibraryResource {
            title: title.to_string(),
            creator: None,
            availability: Availability::Available,
            link: None,
        }
    }

    #[test]
    fn exact_title_scores_one() {
        let m = scored_match(&material("Politics Among Nations"), vec![
            resource("Politics Among Nations"),
        ]);
        assert!((m.match_score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn best_of_several_resources_wins() {
        let m = scored_match(&material("World Politics"), vec![
            resource("Unrelated Title"),
            resource("World Politics"),
        ]);
        assert!((m.match_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(m.matches.len(), 2);
    }

    #[test]
    fn near_miss_scores_below_exact() {
        let m = scored_match(&material("Introduction to Ethics"), vec![resource(
            "Introduction to Ethics, 3rd Edition",
        )]);
        assert!(m.match_score > 0.8);
        assert!(m.match_score < 1.0);
    }
}
