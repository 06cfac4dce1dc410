//! Typed wrappers, one per remote operation.
//!
//! Each wrapper only shapes the path, method and body and delegates to
//! `ApiClient`; cache and in-flight handling stay in the client. Errors are
//! passed through unchanged. Wrappers that change server state drop the
//! cached listings of the section they touched.

use serde::Serialize;
use serde_json::Value;

use crate::client::{ApiClient, ClientResult};
use crate::endpoint::{self, Endpoint};
use crate::error::ClientError;
use crate::query::Filters;
use crate::types::{
    CorrectionRequest, CorrectionResponse, GrammarRequest, GrammarResponse, HealthStatus,
    HistoryEntry, HistoryFilters, HistoryPage, HistorySection, PhrasalVerb, PhrasalVerbFilters,
    PhrasalVerbUpdate, SuccessResponse, VocabularyRequest, VocabularyResponse,
};

fn to_body<T: Serialize>(value: &T) -> ClientResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ClientError::network("Request body could not be serialized", e.to_string()))
}

impl ApiClient {
    async fn get_endpoint<T: serde::de::DeserializeOwned>(&self, endpoint: &Endpoint) -> ClientResult<T> {
        self.send_endpoint(endpoint, endpoint.path, None).await
    }

    // -----------------------------------------------------------------------
    // Vocabulary
    // -----------------------------------------------------------------------

    pub async fn explain_vocabulary(&self, request: &VocabularyRequest) -> ClientResult<VocabularyResponse> {
        let e = &endpoint::EXPLAIN_VOCABULARY;
        let response = self.send_endpoint(e, e.path, Some(to_body(request)?)).await?;
        self.clear_cache(Some(endpoint::HISTORY));
        Ok(response)
    }

    pub async fn supported_languages(&self) -> ClientResult<Value> {
        self.get_endpoint(&endpoint::SUPPORTED_LANGUAGES).await
    }

    // -----------------------------------------------------------------------
    // Correction
    // -----------------------------------------------------------------------

    pub async fn correct_text(&self, request: &CorrectionRequest) -> ClientResult<CorrectionResponse> {
        let e = &endpoint::CORRECT_TEXT;
        let response = self.send_endpoint(e, e.path, Some(to_body(request)?)).await?;
        self.clear_cache(Some(endpoint::HISTORY));
        Ok(response)
    }

    pub async fn correction_levels(&self) -> ClientResult<Value> {
        self.get_endpoint(&endpoint::CORRECTION_LEVELS).await
    }

    // -----------------------------------------------------------------------
    // Grammar
    // -----------------------------------------------------------------------

    pub async fn explain_grammar(&self, request: &GrammarRequest) -> ClientResult<GrammarResponse> {
        let e = &endpoint::EXPLAIN_GRAMMAR;
        let response = self.send_endpoint(e, e.path, Some(to_body(request)?)).await?;
        self.clear_cache(Some(endpoint::HISTORY));
        Ok(response)
    }

    pub async fn grammar_topics(&self) -> ClientResult<Value> {
        self.get_endpoint(&endpoint::GRAMMAR_TOPICS).await
    }

    pub async fn word_comparisons(&self) -> ClientResult<Value> {
        self.get_endpoint(&endpoint::WORD_COMPARISONS).await
    }

    pub async fn question_types(&self) -> ClientResult<Value> {
        self.get_endpoint(&endpoint::QUESTION_TYPES).await
    }

    // -----------------------------------------------------------------------
    // Phrasal verbs
    // -----------------------------------------------------------------------

    pub async fn phrasal_verbs(&self, filters: &PhrasalVerbFilters) -> ClientResult<Vec<PhrasalVerb>> {
        let e = &endpoint::LIST_PHRASAL_VERBS;
        let path = Filters::from(filters).apply_to(e.path);
        self.send_endpoint(e, &path, None).await
    }

    pub async fn phrasal_verb(&self, id: u32) -> ClientResult<PhrasalVerb> {
        let e = &endpoint::GET_PHRASAL_VERB;
        self.send_endpoint(e, &e.bind("id", &id.to_string()), None).await
    }

    pub async fn search_phrasal_verbs(&self, query: &str) -> ClientResult<Vec<PhrasalVerb>> {
        let e = &endpoint::SEARCH_PHRASAL_VERBS;
        self.send_endpoint(e, &e.bind("query", query.trim()), None).await
    }

    pub async fn update_phrasal_verb_progress(
        &self,
        id: u32,
        update: &PhrasalVerbUpdate,
    ) -> ClientResult<PhrasalVerb> {
        let e = &endpoint::UPDATE_PHRASAL_VERB_PROGRESS;
        let verb = self
            .send_endpoint(e, &e.bind("id", &id.to_string()), Some(to_body(update)?))
            .await?;
        self.clear_cache(Some(endpoint::PHRASAL_VERBS));
        Ok(verb)
    }

    pub async fn phrasal_verb_stats(&self) -> ClientResult<Value> {
        self.get_endpoint(&endpoint::PHRASAL_VERB_STATS).await
    }

    pub async fn recommended_phrasal_verbs(&self, limit: u32) -> ClientResult<Vec<PhrasalVerb>> {
        let e = &endpoint::RECOMMENDED_PHRASAL_VERBS;
        let path = Filters::new().set("limit", limit).apply_to(e.path);
        self.send_endpoint(e, &path, None).await
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    pub async fn history(&self, filters: &HistoryFilters) -> ClientResult<HistoryPage> {
        let e = &endpoint::LIST_HISTORY;
        let path = Filters::from(filters).apply_to(e.path);
        self.send_endpoint(e, &path, None).await
    }

    pub async fn history_entry(&self, id: u32) -> ClientResult<HistoryEntry> {
        let e = &endpoint::GET_HISTORY_ENTRY;
        self.send_endpoint(e, &e.bind("id", &id.to_string()), None).await
    }

    pub async fn delete_history_entry(&self, id: u32) -> ClientResult<SuccessResponse> {
        let e = &endpoint::DELETE_HISTORY_ENTRY;
        let response = self
            .send_endpoint(e, &e.bind("id", &id.to_string()), None)
            .await?;
        self.clear_cache(Some(endpoint::HISTORY));
        Ok(response)
    }

    /// Clears one section, or everything when `confirm` is set. The server
    /// rejects a call with neither.
    pub async fn clear_history(
        &self,
        section: Option<HistorySection>,
        confirm: bool,
    ) -> ClientResult<SuccessResponse> {
        let e = &endpoint::CLEAR_HISTORY;
        let path = Filters::new()
            .set("section", section.map(|s| s.as_str()))
            .set("confirm", confirm.then_some(true))
            .apply_to(e.path);
        let response = self.send_endpoint(e, &path, None).await?;
        self.clear_cache(Some(endpoint::HISTORY));
        Ok(response)
    }

    pub async fn history_stats(&self) -> ClientResult<Value> {
        self.get_endpoint(&endpoint::HISTORY_STATS).await
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    /// GET against `health_url`, which is not under `base_url`.
    pub async fn health_check(&self) -> ClientResult<HealthStatus> {
        let url = self.config().health_url.clone();
        self.get_absolute(&url).await
    }
}
