//! Extracted syllabus metadata and library catalog match entities

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;
use utoipa::ToSchema;

/// Metadata fields a user can select for extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    Year,
    Semester,
    ClassName,
    ClassNumber,
    Instructor,
    University,
    MainTopic,
    ReadingMaterials,
}

impl MetadataField {
    /// Full field catalog, in the order presented to the user.
    pub const ALL: [MetadataField; 8] = [
        Self::Year,
        Self::Semester,
        Self::ClassName,
        Self::ClassNumber,
        Self::Instructor,
        Self::University,
        Self::MainTopic,
        Self::ReadingMaterials,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Semester => "semester",
            Self::ClassName => "class_name",
            Self::ClassNumber => "class_number",
            Self::Instructor => "instructor",
            Self::University => "university",
            Self::MainTopic => "main_topic",
            Self::ReadingMaterials => "reading_materials",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Semester => "Semester",
            Self::ClassName => "Class Name",
            Self::ClassNumber => "Class Number",
            Self::Instructor => "Instructor",
            Self::University => "University",
            Self::MainTopic => "Main Topic",
            Self::ReadingMaterials => "Reading Materials",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Year => "Academic year",
            Self::Semester => "Academic semester",
            Self::ClassName => "Course title",
            Self::ClassNumber => "Course code",
            Self::Instructor => "Course instructor",
            Self::University => "Institution name",
            Self::MainTopic => "Course subject/topic",
            Self::ReadingMaterials => "Required and suggested readings",
        }
    }
}

/// Type of a reading-material entry.
///
/// Extraction output is not fully trusted: unknown type strings fall back to
/// `Book` rather than failing the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    #[default]
    Book,
    JournalArticle,
    BookChapter,
    Website,
    Video,
    Software,
    Hardware,
    Equipment,
}

impl<'de> Deserialize<'de> for MaterialType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(match value.as_str() {
            "journal_article" => Self::JournalArticle,
            "book_chapter" => Self::BookChapter,
            "website" => Self::Website,
            "video" => Self::Video,
            "software" => Self::Software,
            "hardware" => Self::Hardware,
            "equipment" => Self::Equipment,
            _ => Self::Book,
        })
    }
}

/// How strongly a syllabus requires a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    Recommended,
    #[default]
    Optional,
    Equipment,
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(match value.as_str() {
            "required" => Self::Required,
            "recommended" => Self::Recommended,
            "equipment" => Self::Equipment,
            _ => Self::Optional,
        })
    }
}

/// Strings the upstream extraction historically used to mean "absent"
fn is_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("unknown") || v.eq_ignore_ascii_case("none")
}

fn de_opt_sentinel<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !is_sentinel(s)))
}

/// Accepts a URL string, the `"Unknown"` sentinel, or nothing; sentinel and
/// unparseable values both map to `None`.
fn de_opt_url<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|s| !is_sentinel(s))
        .and_then(|s| Url::parse(&s).ok()))
}

/// A single bibliographic or resource entry extracted from a syllabus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReadingMaterial {
    pub title: String,
    #[serde(default, deserialize_with = "de_opt_sentinel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(rename = "type", default)]
    pub material_type: MaterialType,
    #[serde(default)]
    pub requirement: Requirement,
    #[serde(default, deserialize_with = "de_opt_url")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub url: Option<Url>,
}

impl ReadingMaterial {
    /// Whether this entry is exempt from catalog lookup: equipment entries
    /// and entries that already carry a resolvable URL are synthesized into a
    /// direct match instead.
    pub fn is_lookup_exempt(&self) -> bool {
        self.requirement == Requirement::Equipment
            || self.material_type == MaterialType::Equipment
            || self.url.is_some()
    }
}

/// Metadata record for one syllabus, shaped by the user's field selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct SyllabusMetadata {
    #[serde(default, deserialize_with = "de_opt_sentinel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "de_opt_sentinel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(default, deserialize_with = "de_opt_sentinel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_sentinel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_number: Option<String>,
    #[serde(default, deserialize_with = "de_opt_sentinel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, deserialize_with = "de_opt_sentinel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(default, deserialize_with = "de_opt_sentinel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_topic: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_materials: Option<Vec<ReadingMaterial>>,
    /// Set when extraction for this file failed and no metadata is available.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

impl SyllabusMetadata {
    /// Restrict the record to the user's field selection; unselected fields
    /// are cleared so they never reach the wire or the export.
    pub fn retain_fields(&mut self, selected: &[MetadataField]) {
        if !selected.contains(&MetadataField::Year) {
            self.year = None;
        }
        if !selected.contains(&MetadataField::Semester) {
            self.semester = None;
        }
        if !selected.contains(&MetadataField::ClassName) {
            self.class_name = None;
        }
        if !selected.contains(&MetadataField::ClassNumber) {
            self.class_number = None;
        }
        if !selected.contains(&MetadataField::Instructor) {
            self.instructor = None;
        }
        if !selected.contains(&MetadataField::University) {
            self.university = None;
        }
        if !selected.contains(&MetadataField::MainTopic) {
            self.main_topic = None;
        }
        if !selected.contains(&MetadataField::ReadingMaterials) {
            self.reading_materials = None;
        }
    }

    /// Marker record for a file whose extraction failed entirely.
    pub fn error_marker(note: impl Into<String>) -> Self {
        Self {
            extraction_error: Some(note.into()),
            ..Self::default()
        }
    }
}

/// Availability of a catalog resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    CheckedOut,
    #[default]
    Unavailable,
}

impl<'de> Deserialize<'de> for Availability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(match value.as_str() {
            "available" => Self::Available,
            "checked_out" => Self::CheckedOut,
            _ => Self::Unavailable,
        })
    }
}

/// One resource returned by the library catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LibraryResource {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub availability: Availability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub link: Option<Url>,
}

/// Catalog lookup outcome for one reading-material entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LibraryMatch {
    /// The title string that was searched.
    pub original_query: String,
    /// 0.0 (no match) to 1.0 (exact or synthesized match).
    pub match_score: f64,
    pub matches: Vec<LibraryResource>,
}

impl LibraryMatch {
    /// Match synthesized without a catalog lookup, for entries that already
    /// carry a URL or are equipment.
    pub fn synthesized(query: impl Into<String>, link: Option<Url>) -> Self {
        let query = query.into();
        Self {
            original_query: query.clone(),
            match_score: 1.0,
            matches: vec![LibraryResource {
                title: query,
                creator: None,
                availability: Availability::Available,
                link,
            }],
        }
    }

    /// Empty result for a query the catalog could not satisfy.
    pub fn not_found(query: impl Into<String>) -> Self {
        Self {
            original_query: query.into(),
            match_score: 0.0,
            matches: Vec::new(),
        }
    }
}

/// Per-file extraction result, enriched in place by the library-match stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExtractedMetadata {
    /// Unique within a job.
    pub filename: String,
    pub metadata: SyllabusMetadata,
    #[serde(default)]
    pub library_matches: Vec<LibraryMatch>,
}
