//! Offline heuristic extractor
//!
//! Line-scanning fallback used when the LLM rejects a single document. It
//! only recovers the fields that syllabi state in near-universal patterns;
//! everything else stays `None`.

use async_trait::async_trait;

use crate::domain::SyllabusMetadata;

use super::{ExtractError, MetadataExtractor};

/// Pattern-based extractor that never calls the network
#[derive(Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataExtractor for HeuristicExtractor {
    async fn extract(&self, text: &str) -> Result<SyllabusMetadata, ExtractError> {
        Ok(scan(text))
    }
}

const SEMESTERS: [&str; 4] = ["Fall", "Spring", "Summer", "Winter"];

fn scan(text: &str) -> SyllabusMetadata {
    let mut metadata = SyllabusMetadata::default();

    // Only the first page or so carries header metadata.
    for line in text.lines().take(80) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if metadata.instructor.is_none() {
            metadata.instructor = labeled_value(line, &["Instructor:", "Professor:", "Taught by:"]);
        }
        if metadata.semester.is_none() || metadata.year.is_none() {
            if let Some((semester, year)) = semester_and_year(line) {
                metadata.semester.get_or_insert(semester);
                if let Some(year) = year {
                    metadata.year.get_or_insert(year);
                }
            }
        }
        if metadata.class_number.is_none() {
            metadata.class_number = course_code(line);
        }
    }

    metadata
}

/// Value after the first matching label prefix, if any.
fn labeled_value(line: &str, labels: &[&str]) -> Option<String> {
    for label in labels {
        if let Some(rest) = line.strip_prefix(label) {
            let value = rest.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// "Fall 2025" style mentions; the year may be absent.
fn semester_and_year(line: &str) -> Option<(String, Option<String>)> {
    let mut words = line.split_whitespace().peekable();
    while let Some(word) = words.next() {
        if SEMESTERS.contains(&word) {
            let year = words
                .peek()
                .filter(|w| w.len() == 4 && w.chars().all(|c| c.is_ascii_digit()))
                .map(|w| w.to_string());
            return Some((word.to_string(), year));
        }
    }
    None
}

/// "PHIL 101" / "POLS-2300" style course codes.
fn course_code(line: &str) -> Option<String> {
    for token in line.split_whitespace().collect::<Vec<_>>().windows(2) {
        let [dept, num] = token else { continue };
        // "PHIL 101:" in a title line still counts as a code.
        let num = num.trim_end_matches([':', '.', ',', ';']);
        if dept.len() >= 2
            && dept.len() <= 5
            && dept.chars().all(|c| c.is_ascii_uppercase())
            && num.len() >= 3
            && num.chars().all(|c| c.is_ascii_digit())
        {
            return Some(format!("{} {}", dept, num));
        }
    }
    for token in line.split_whitespace() {
        if let Some((dept, num)) = token.split_once('-') {
            let num = num.trim_end_matches([':', '.', ',', ';']);
            if dept.len() >= 2
                && dept.len() <= 5
                && dept.chars().all(|c| c.is_ascii_uppercase())
                && num.len() >= 3
                && num.chars().all(|c| c.is_ascii_digit())
            {
                return Some(format!("{} {}", dept, num));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_labeled_instructor() {
        let metadata = scan("PHIL 101: Introduction to Ethics\nInstructor: Dr. Maya Reed\n");
        assert_eq!(metadata.instructor.as_deref(), Some("Dr. Maya Reed"));
        assert_eq!(metadata.class_number.as_deref(), Some("PHIL 101"));
    }

    #[test]
    fn extracts_semester_and_year() {
        let metadata = scan("Syllabus\nFall 2025\n");
        assert_eq!(metadata.semester.as_deref(), Some("Fall"));
        assert_eq!(metadata.year.as_deref(), Some("2025"));
    }

    #[test]
    fn semester_without_year() {
        let metadata = scan("Offered every Spring semester");
        assert_eq!(metadata.semester.as_deref(), Some("Spring"));
        assert_eq!(metadata.year, None);
    }

    #[test]
    fn course_code_with_trailing_punctuation() {
        let metadata = scan("HIST 2100: The Modern World");
        assert_eq!(metadata.class_number.as_deref(), Some("HIST 2100"));
        let metadata = scan("Welcome to CS-230, Data Structures");
        assert_eq!(metadata.class_number.as_deref(), Some("CS 230"));
    }

    #[test]
    fn hyphenated_course_code() {
        let metadata = scan("POLS-2300 World Politics");
        assert_eq!(metadata.class_number.as_deref(), Some("POLS 2300"));
    }

    #[test]
    fn unrecognizable_text_yields_empty_record() {
        let metadata = scan("lorem ipsum dolor sit amet");
        assert_eq!(metadata, SyllabusMetadata::default());
    }
}
