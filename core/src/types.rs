//! Domain DTOs for the English Assistant API.
//!
//! # Design
//! These types mirror the service's JSON schema but are defined
//! independently of the mock-server crate; integration tests catch schema
//! drift. Response types default every optional field so a sparser server
//! payload still decodes. Timestamps stay as the ISO-8601 strings the server
//! sends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::Filters;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyRequest {
    pub query: String,
    pub source_language: String,
    pub target_language: String,
}

impl VocabularyRequest {
    /// Spanish to English, the service default.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            source_language: "es".to_string(),
            target_language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyResponse {
    pub query: String,
    pub result: String,
    pub explanation: Option<String>,
    pub examples: Vec<String>,
    pub tags: Vec<String>,
    pub timestamp: Option<String>,
    pub translations: BTreeMap<String, String>,
    pub language_detected: String,
    pub phonetic: Option<String>,
    pub word_type: Option<String>,
    pub difficulty_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Correction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionLevel {
    Basic,
    #[default]
    Comprehensive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub text: String,
    pub correction_level: CorrectionLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionDetail {
    pub original: String,
    pub corrected: String,
    pub error_type: String,
    pub rule_explanation: String,
    pub position: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionResponse {
    pub query: String,
    pub result: String,
    pub explanation: Option<String>,
    pub examples: Vec<String>,
    pub tags: Vec<String>,
    pub timestamp: Option<String>,
    pub original_text: String,
    pub corrected_text: String,
    pub corrections: Vec<CorrectionDetail>,
    pub grammar_rules: Vec<String>,
    pub correction_count: u32,
    pub confidence_score: Option<f64>,
}

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Explanation,
    Comparison,
    Usage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarRequest {
    pub question: String,
    pub question_type: QuestionType,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarResponse {
    pub query: String,
    pub result: String,
    pub explanation: Option<String>,
    pub examples: Vec<String>,
    pub tags: Vec<String>,
    pub timestamp: Option<String>,
    pub rule_category: String,
    pub related_concepts: Vec<String>,
    pub difficulty_level: String,
    pub common_mistakes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Phrasal verbs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStatus {
    #[default]
    Pending,
    InProgress,
    Learned,
}

impl LearningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningStatus::Pending => "pending",
            LearningStatus::InProgress => "in_progress",
            LearningStatus::Learned => "learned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhrasalVerbProgress {
    pub attempts: u32,
    pub correct_answers: u32,
    pub last_practiced: Option<String>,
    pub mastery_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhrasalVerb {
    pub id: u32,
    pub verb: String,
    pub definition: String,
    #[serde(default)]
    pub examples: Vec<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub status: LearningStatus,
    #[serde(default)]
    pub progress: PhrasalVerbProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body of a progress update. `progress` is omitted when `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhrasalVerbUpdate {
    pub status: LearningStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<PhrasalVerbProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhrasalVerbFilters {
    pub difficulty: Option<Difficulty>,
    pub status: Option<LearningStatus>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<&PhrasalVerbFilters> for Filters {
    fn from(f: &PhrasalVerbFilters) -> Self {
        Filters::new()
            .set("difficulty", f.difficulty.map(|d| d.as_str()))
            .set("status", f.status.map(|s| s.as_str()))
            .set("search", f.search.clone())
            .set("limit", f.limit)
            .set("offset", f.offset)
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySection {
    Vocabulary,
    Correction,
    Grammar,
    PhrasalVerbs,
}

impl HistorySection {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistorySection::Vocabulary => "vocabulary",
            HistorySection::Correction => "correction",
            HistorySection::Grammar => "grammar",
            HistorySection::PhrasalVerbs => "phrasal_verbs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u32,
    pub section: HistorySection,
    pub query: String,
    pub result: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryFilters {
    pub section: Option<HistorySection>,
    pub search: Option<String>,
    pub tags: Vec<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<&HistoryFilters> for Filters {
    fn from(f: &HistoryFilters) -> Self {
        Filters::new()
            .set("section", f.section.map(|s| s.as_str()))
            .set("search", f.search.clone())
            .set("tags", f.tags.clone())
            .set("date_from", f.date_from.clone())
            .set("date_to", f.date_to.clone())
            .set("limit", f.limit)
            .set("offset", f.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub total_count: u32,
    pub has_more: bool,
    #[serde(default)]
    pub filters_applied: Value,
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
