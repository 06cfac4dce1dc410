use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

mod seed;

const SECTIONS: &[&str] = &["vocabulary", "correction", "grammar", "phrasal_verbs"];
const STATUSES: &[&str] = &["pending", "in_progress", "learned"];
const DIFFICULTIES: &[&str] = &["beginner", "intermediate", "advanced"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub last_practiced: Option<String>,
    #[serde(default)]
    pub mastery_level: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhrasalVerb {
    pub id: u32,
    pub verb: String,
    pub definition: String,
    pub examples: Vec<String>,
    pub difficulty: String,
    pub status: String,
    pub progress: Progress,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u32,
    pub section: String,
    pub query: String,
    pub result: String,
    pub explanation: String,
    pub examples: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct VocabularyRequest {
    pub query: String,
    #[serde(default = "default_source")]
    pub source_language: String,
    #[serde(default = "default_target")]
    pub target_language: String,
}

fn default_source() -> String {
    "es".to_string()
}

fn default_target() -> String {
    "en".to_string()
}

#[derive(Deserialize)]
pub struct CorrectionRequest {
    pub text: String,
    #[serde(default = "default_level")]
    pub correction_level: String,
}

fn default_level() -> String {
    "comprehensive".to_string()
}

#[derive(Deserialize)]
pub struct GrammarRequest {
    pub question: String,
    #[serde(default = "default_question_type")]
    pub question_type: String,
}

fn default_question_type() -> String {
    "explanation".to_string()
}

#[derive(Deserialize)]
pub struct ProgressUpdate {
    pub status: String,
    pub progress: Option<Progress>,
}

#[derive(Deserialize)]
pub struct VerbQuery {
    pub difficulty: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct ClearQuery {
    pub section: Option<String>,
    #[serde(default)]
    pub confirm: bool,
}

/// In-memory backing store plus a counter of every request served.
pub struct MockState {
    phrasal_verbs: RwLock<BTreeMap<u32, PhrasalVerb>>,
    history: RwLock<Vec<HistoryEntry>>,
    next_history_id: AtomicU32,
    hits: AtomicUsize,
}

impl MockState {
    pub fn new() -> Self {
        let stamp = timestamp();
        let verbs = seed::phrasal_verbs(&stamp)
            .into_iter()
            .map(|verb| (verb.id, verb))
            .collect();
        Self {
            phrasal_verbs: RwLock::new(verbs),
            history: RwLock::new(Vec::new()),
            next_history_id: AtomicU32::new(1),
            hits: AtomicUsize::new(0),
        }
    }

    /// Number of requests that reached the router.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    async fn record(&self, section: &str, query: &str, result: &str, tags: &[&str]) {
        let stamp = timestamp();
        let entry = HistoryEntry {
            id: self.next_history_id.fetch_add(1, Ordering::SeqCst),
            section: section.to_string(),
            query: query.to_string(),
            result: result.to_string(),
            explanation: String::new(),
            examples: Vec::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: stamp.clone(),
            updated_at: stamp,
        };
        self.history.write().await.push(entry);
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new()
    }
}

pub type Db = Arc<MockState>;

/// Error body in the service's `{error, message, details, request_id}` shape.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error: "validation_error",
            message: message.into(),
        }
    }

    fn not_found(resource: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: "not_found",
            message: format!("{resource} not found"),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "bad_request",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "message": self.message,
            "details": null,
            "request_id": Uuid::new_v4(),
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    app_with_state(Arc::new(MockState::new()))
}

pub fn app_with_state(db: Db) -> Router {
    let api = Router::new()
        .route("/", get(api_root))
        .route("/vocabulary", post(explain_vocabulary))
        .route("/vocabulary/languages", get(supported_languages))
        .route("/correction", post(correct_text))
        .route("/correction/correction-levels", get(correction_levels))
        .route("/grammar", post(explain_grammar))
        .route("/grammar/topics", get(grammar_topics))
        .route("/grammar/word-comparisons", get(word_comparisons))
        .route("/grammar/question-types", get(question_types))
        .route("/phrasal-verbs", get(list_phrasal_verbs))
        .route("/phrasal-verbs/{id}", get(get_phrasal_verb))
        .route("/phrasal-verbs/{id}/progress", put(update_progress))
        .route("/phrasal-verbs/search/{query}", get(search_phrasal_verbs))
        .route("/phrasal-verbs/stats/progress", get(progress_stats))
        .route("/phrasal-verbs/recommendations/practice", get(recommended_verbs))
        .route("/history", get(list_history).delete(clear_history))
        .route("/history/{id}", get(get_history_entry).delete(delete_history_entry))
        .route("/history/stats/summary", get(history_stats));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(db.clone(), count_requests))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(db)).await
}

async fn count_requests(State(db): State<Db>, request: Request, next: Next) -> Response {
    db.hits.fetch_add(1, Ordering::SeqCst);
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    tracing::info!(%method, %path, status = response.status().as_u16(), "handled request");
    response
}

fn timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    secs.to_string()
}

fn check_limit(limit: Option<usize>, default: usize, max: usize) -> Result<usize, ApiError> {
    match limit.unwrap_or(default) {
        n if (1..=max).contains(&n) => Ok(n),
        n => Err(ApiError::validation(format!("limit must be between 1 and {max}, got {n}"))),
    }
}

fn check_choice(field: &str, value: &str, allowed: &[&str]) -> Result<(), ApiError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "{field} must be one of: {}",
            allowed.join(", ")
        )))
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "English Assistant API"}))
}

async fn api_root() -> Json<Value> {
    Json(json!({
        "message": "English Assistant API",
        "version": "1.0.0",
        "endpoints": ["/api/vocabulary", "/api/correction", "/api/grammar", "/api/phrasal-verbs", "/api/history"],
    }))
}

// --- vocabulary ---

async fn explain_vocabulary(
    State(db): State<Db>,
    Json(input): Json<VocabularyRequest>,
) -> Result<Json<Value>, ApiError> {
    let query = input.query.trim();
    if query.is_empty() {
        return Err(ApiError::validation("Query cannot be empty"));
    }
    if query.chars().count() > 500 {
        return Err(ApiError::validation("Query too long (maximum 500 characters)"));
    }

    let needle = query.to_lowercase();
    let hit = seed::DICTIONARY.iter().find(|(es, en, _)| {
        (input.source_language == "es" && *es == needle) || (input.source_language == "en" && *en == needle)
    });
    let (result, word_type) = match hit {
        Some((_, en, kind)) if input.source_language == "es" => (en.to_string(), Some(*kind)),
        Some((es, _, kind)) => (es.to_string(), Some(*kind)),
        None => (query.to_string(), None),
    };

    db.record("vocabulary", query, &result, &["vocabulary", "translation"]).await;

    Ok(Json(json!({
        "query": query,
        "result": result,
        "explanation": format!("'{query}' translates to '{result}'."),
        "examples": [],
        "tags": ["vocabulary", "translation"],
        "timestamp": timestamp(),
        "translations": { input.target_language.clone(): result },
        "language_detected": input.source_language,
        "phonetic": null,
        "word_type": word_type,
        "difficulty_level": "beginner",
    })))
}

async fn supported_languages() -> Json<Value> {
    Json(json!({
        "supported_languages": ["es", "en"],
        "language_codes": {"es": "Spanish", "en": "English"},
    }))
}

// --- correction ---

async fn correct_text(
    State(db): State<Db>,
    Json(input): Json<CorrectionRequest>,
) -> Result<Json<Value>, ApiError> {
    let text = input.text.trim();
    if text.is_empty() {
        return Err(ApiError::validation("Text cannot be empty"));
    }
    if text.chars().count() > 5000 {
        return Err(ApiError::validation("Text too long (maximum 5000 characters)"));
    }
    check_choice("correction_level", &input.correction_level, &["basic", "comprehensive"])?;

    let mut corrected = text.to_string();
    let mut corrections = Vec::new();
    let mut rules = Vec::new();
    for (wrong, right, error_type, rule) in seed::CORRECTION_RULES {
        if input.correction_level == "basic" && *error_type != "spelling" && *error_type != "grammar" {
            continue;
        }
        if let Some(start) = corrected.find(wrong) {
            corrections.push(json!({
                "original": wrong.trim(),
                "corrected": right.trim(),
                "error_type": error_type,
                "rule_explanation": rule,
                "position": {"start": start, "end": start + wrong.trim().len()},
            }));
            rules.push(*rule);
            corrected = corrected.replacen(wrong, right, 1);
        }
    }

    db.record("correction", text, &corrected, &["correction", "grammar"]).await;

    Ok(Json(json!({
        "query": text,
        "result": corrected,
        "explanation": "Text has been corrected for grammar and style.",
        "examples": [],
        "tags": ["correction", "grammar"],
        "timestamp": timestamp(),
        "original_text": text,
        "corrected_text": corrected,
        "correction_count": corrections.len(),
        "corrections": corrections,
        "grammar_rules": rules,
        "confidence_score": 0.9,
    })))
}

async fn correction_levels() -> Json<Value> {
    Json(json!({
        "correction_levels": {
            "basic": {
                "description": "Basic grammar and spelling corrections",
                "features": ["spelling", "basic_grammar", "punctuation"],
            },
            "comprehensive": {
                "description": "Comprehensive grammar, style, and clarity improvements",
                "features": ["spelling", "grammar", "style", "clarity", "word_choice"],
            },
        },
        "default": "comprehensive",
    }))
}

// --- grammar ---

async fn explain_grammar(
    State(db): State<Db>,
    Json(input): Json<GrammarRequest>,
) -> Result<Json<Value>, ApiError> {
    let question = input.question.trim();
    if question.is_empty() {
        return Err(ApiError::validation("Question cannot be empty"));
    }
    if question.chars().count() > 1000 {
        return Err(ApiError::validation("Question too long (maximum 1000 characters)"));
    }
    check_choice("question_type", &input.question_type, &["explanation", "comparison", "usage"])?;

    let lower = question.to_lowercase();
    let compared = seed::WORD_COMPARISONS
        .iter()
        .find(|(a, b)| lower.contains(a) && lower.contains(b));
    let (category, result) = match compared {
        Some((a, b)) => ("word_comparison", format!("'{a}' and '{b}' are often confused.")),
        None => match seed::GRAMMAR_TOPICS.iter().find(|t| lower.contains(&t.replace('_', " "))) {
            Some(topic) => (*topic, format!("Explanation of {}.", topic.replace('_', " "))),
            None => ("general", "General grammar explanation.".to_string()),
        },
    };

    db.record("grammar", question, &result, &["grammar", category]).await;

    Ok(Json(json!({
        "query": question,
        "result": result,
        "explanation": result,
        "examples": [],
        "tags": ["grammar", "explanation"],
        "timestamp": timestamp(),
        "rule_category": category,
        "related_concepts": [],
        "difficulty_level": "intermediate",
        "common_mistakes": [],
    })))
}

async fn grammar_topics() -> Json<Value> {
    Json(json!({
        "grammar_topics": seed::GRAMMAR_TOPICS,
        "total_topics": seed::GRAMMAR_TOPICS.len(),
        "description": "Available grammar topics for explanations",
    }))
}

async fn word_comparisons() -> Json<Value> {
    let comparisons: Vec<Value> = seed::WORD_COMPARISONS
        .iter()
        .map(|(a, b)| json!({"word1": a, "word2": b, "comparison": format!("{a} vs {b}")}))
        .collect();
    Json(json!({
        "total_comparisons": comparisons.len(),
        "word_comparisons": comparisons,
        "description": "Available word pairs for comparison",
    }))
}

async fn question_types() -> Json<Value> {
    Json(json!({
        "question_types": {
            "explanation": {"description": "General grammar rule explanations"},
            "comparison": {"description": "Compare similar words or concepts"},
            "usage": {"description": "How to use specific grammar elements"},
        },
        "default": "explanation",
    }))
}

// --- phrasal verbs ---

fn matches_search(verb: &PhrasalVerb, term: &str) -> bool {
    let term = term.to_lowercase();
    verb.verb.to_lowercase().contains(&term)
        || verb.definition.to_lowercase().contains(&term)
        || verb.examples.iter().any(|e| e.to_lowercase().contains(&term))
}

async fn list_phrasal_verbs(
    State(db): State<Db>,
    Query(q): Query<VerbQuery>,
) -> Result<Json<Vec<PhrasalVerb>>, ApiError> {
    if let Some(d) = &q.difficulty {
        check_choice("difficulty", d, DIFFICULTIES)?;
    }
    if let Some(s) = &q.status {
        check_choice("status", s, STATUSES)?;
    }
    let limit = check_limit(q.limit, 50, 200)?;

    let verbs = db.phrasal_verbs.read().await;
    let selected = verbs
        .values()
        .filter(|v| q.difficulty.as_ref().is_none_or(|d| &v.difficulty == d))
        .filter(|v| q.status.as_ref().is_none_or(|s| &v.status == s))
        .filter(|v| q.search.as_deref().is_none_or(|s| matches_search(v, s)))
        .skip(q.offset.unwrap_or(0))
        .take(limit)
        .cloned()
        .collect();
    Ok(Json(selected))
}

async fn get_phrasal_verb(
    State(db): State<Db>,
    Path(id): Path<u32>,
) -> Result<Json<PhrasalVerb>, ApiError> {
    let verbs = db.phrasal_verbs.read().await;
    verbs
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Phrasal verb"))
}

async fn update_progress(
    State(db): State<Db>,
    Path(id): Path<u32>,
    Json(input): Json<ProgressUpdate>,
) -> Result<Json<PhrasalVerb>, ApiError> {
    check_choice("status", &input.status, STATUSES)?;
    let mut verbs = db.phrasal_verbs.write().await;
    let verb = verbs
        .get_mut(&id)
        .ok_or_else(|| ApiError::not_found("Phrasal verb"))?;
    verb.status = input.status;
    if let Some(progress) = input.progress {
        verb.progress = progress;
    }
    verb.updated_at = timestamp();
    Ok(Json(verb.clone()))
}

async fn search_phrasal_verbs(
    State(db): State<Db>,
    Path(query): Path<String>,
) -> Result<Json<Vec<PhrasalVerb>>, ApiError> {
    if query.trim().chars().count() < 2 {
        return Err(ApiError::validation("Search query must be at least 2 characters"));
    }
    let verbs = db.phrasal_verbs.read().await;
    Ok(Json(
        verbs
            .values()
            .filter(|v| matches_search(v, query.trim()))
            .cloned()
            .collect(),
    ))
}

async fn progress_stats(State(db): State<Db>) -> Json<Value> {
    let verbs = db.phrasal_verbs.read().await;
    let mut by_status: BTreeMap<&str, usize> = STATUSES.iter().map(|s| (*s, 0)).collect();
    let mut by_difficulty: BTreeMap<&str, usize> = DIFFICULTIES.iter().map(|d| (*d, 0)).collect();
    for verb in verbs.values() {
        if let Some(n) = by_status.get_mut(verb.status.as_str()) {
            *n += 1;
        }
        if let Some(n) = by_difficulty.get_mut(verb.difficulty.as_str()) {
            *n += 1;
        }
    }
    let learned = by_status.get("learned").copied().unwrap_or(0);
    let total = verbs.len();
    Json(json!({
        "total_verbs": total,
        "by_status": by_status,
        "by_difficulty": by_difficulty,
        "completion_rate": if total == 0 { 0.0 } else { learned as f64 / total as f64 },
    }))
}

async fn recommended_verbs(
    State(db): State<Db>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<PhrasalVerb>>, ApiError> {
    let limit = check_limit(q.limit, 5, 20)?;
    let verbs = db.phrasal_verbs.read().await;
    let mut candidates: Vec<PhrasalVerb> = verbs
        .values()
        .filter(|v| v.status != "learned")
        .cloned()
        .collect();
    let rank = |d: &str| DIFFICULTIES.iter().position(|x| *x == d).unwrap_or(DIFFICULTIES.len());
    candidates.sort_by(|a, b| {
        a.progress
            .mastery_level
            .total_cmp(&b.progress.mastery_level)
            .then_with(|| rank(&a.difficulty).cmp(&rank(&b.difficulty)))
    });
    candidates.truncate(limit);
    Ok(Json(candidates))
}

// --- history ---

async fn list_history(
    State(db): State<Db>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let mut section = None;
    let mut search = None;
    let mut tags = Vec::new();
    let mut limit = None;
    let mut offset = 0usize;
    for (key, value) in &params {
        match key.as_str() {
            "section" => section = Some(value.as_str()),
            "search" => search = Some(value.to_lowercase()),
            "tags" => tags.push(value.as_str()),
            "limit" => limit = Some(value.parse().map_err(|_| ApiError::validation("limit must be a number"))?),
            "offset" => offset = value.parse().map_err(|_| ApiError::validation("offset must be a number"))?,
            _ => {}
        }
    }
    if let Some(s) = section {
        check_choice("section", s, SECTIONS)?;
    }
    let limit = check_limit(limit, 50, 200)?;

    let history = db.history.read().await;
    let mut matching: Vec<&HistoryEntry> = history
        .iter()
        .filter(|e| section.is_none_or(|s| e.section == s))
        .filter(|e| {
            search.as_deref().is_none_or(|s| {
                e.query.to_lowercase().contains(s)
                    || e.result.to_lowercase().contains(s)
                    || e.explanation.to_lowercase().contains(s)
            })
        })
        .filter(|e| tags.is_empty() || tags.iter().any(|t| e.tags.iter().any(|et| et == t)))
        .collect();
    matching.sort_by(|a, b| b.id.cmp(&a.id));

    let total = matching.len();
    let end = offset + limit;
    let entries: Vec<&HistoryEntry> = matching.into_iter().skip(offset).take(limit).collect();
    Ok(Json(json!({
        "entries": entries,
        "total_count": total,
        "has_more": end < total,
        "filters_applied": {
            "section": section,
            "search": search,
            "tags": tags,
            "limit": limit,
            "offset": offset,
        },
    })))
}

async fn get_history_entry(
    State(db): State<Db>,
    Path(id): Path<u32>,
) -> Result<Json<HistoryEntry>, ApiError> {
    let history = db.history.read().await;
    history
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("History entry"))
}

async fn delete_history_entry(
    State(db): State<Db>,
    Path(id): Path<u32>,
) -> Result<Json<Value>, ApiError> {
    let mut history = db.history.write().await;
    let index = history
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| ApiError::not_found("History entry"))?;
    history.remove(index);
    Ok(Json(success(format!("History entry {id} deleted successfully"))))
}

async fn clear_history(
    State(db): State<Db>,
    Query(q): Query<ClearQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut history = db.history.write().await;
    let before = history.len();
    match (q.section, q.confirm) {
        (Some(section), _) => {
            check_choice("section", &section, SECTIONS)?;
            history.retain(|e| e.section != section);
            let removed = before - history.len();
            Ok(Json(success(format!("Cleared {removed} entries from {section} section"))))
        }
        (None, true) => {
            history.clear();
            Ok(Json(success(format!("Cleared all {before} history entries"))))
        }
        (None, false) => Err(ApiError::bad_request(
            "Must specify section or set confirm=true to clear all history",
        )),
    }
}

async fn history_stats(State(db): State<Db>) -> Json<Value> {
    let history = db.history.read().await;
    let mut by_section: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_tag: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in history.iter() {
        *by_section.entry(entry.section.as_str()).or_default() += 1;
        for tag in &entry.tags {
            *by_tag.entry(tag.as_str()).or_default() += 1;
        }
    }
    Json(json!({
        "total_entries": history.len(),
        "section_counts": by_section,
        "tag_counts": by_tag,
    }))
}

fn success(message: String) -> Value {
    json!({
        "success": true,
        "message": message,
        "data": null,
        "timestamp": timestamp(),
    })
}
