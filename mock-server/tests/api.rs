use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, HistoryEntry, MockState, PhrasalVerb};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn delete(uri: &str) -> Request<String> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- health ---

#[tokio::test]
async fn health_reports_healthy() {
    let resp = app().oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "English Assistant API");
}

// --- vocabulary ---

#[tokio::test]
async fn vocabulary_translates_known_word() {
    let resp = app()
        .oneshot(json_request("POST", "/api/vocabulary", r#"{"query":"casa"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["query"], "casa");
    assert_eq!(body["result"], "house");
    assert_eq!(body["word_type"], "noun");
    assert_eq!(body["translations"]["en"], "house");
}

#[tokio::test]
async fn vocabulary_empty_query_returns_422_with_error_body() {
    let resp = app()
        .oneshot(json_request("POST", "/api/vocabulary", r#"{"query":"   "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "Query cannot be empty");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn vocabulary_malformed_json_returns_4xx() {
    let resp = app()
        .oneshot(json_request("POST", "/api/vocabulary", r#"{"not_query":1}"#))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

// --- correction ---

#[tokio::test]
async fn correction_fixes_known_mistakes() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/correction",
            r#"{"text":"I are happy to recieve it"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["corrected_text"], "I am happy to receive it");
    assert_eq!(body["correction_count"], 2);
    assert_eq!(body["corrections"][0]["original"], "I are");
}

#[tokio::test]
async fn correction_rejects_unknown_level() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/correction",
            r#"{"text":"hello","correction_level":"extreme"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- grammar ---

#[tokio::test]
async fn grammar_detects_word_comparison() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/grammar",
            r#"{"question":"When do I use affect or effect?","question_type":"comparison"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["rule_category"], "word_comparison");
}

#[tokio::test]
async fn grammar_reference_lists() {
    let app = app();

    let topics: Value = body_json(app.clone().oneshot(get("/api/grammar/topics")).await.unwrap()).await;
    assert_eq!(topics["total_topics"], 6);

    let pairs: Value =
        body_json(app.clone().oneshot(get("/api/grammar/word-comparisons")).await.unwrap()).await;
    assert_eq!(pairs["word_comparisons"][0]["word1"], "affect");

    let kinds: Value = body_json(app.oneshot(get("/api/grammar/question-types")).await.unwrap()).await;
    assert_eq!(kinds["default"], "explanation");
}

// --- phrasal verbs ---

#[tokio::test]
async fn list_phrasal_verbs_filters_by_difficulty() {
    let resp = app()
        .oneshot(get("/api/phrasal-verbs?difficulty=advanced"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let verbs: Vec<PhrasalVerb> = body_json(resp).await;
    assert_eq!(verbs.len(), 1);
    assert_eq!(verbs[0].verb, "bring about");
}

#[tokio::test]
async fn list_phrasal_verbs_rejects_bad_limit() {
    let resp = app()
        .oneshot(get("/api/phrasal-verbs?limit=0"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_phrasal_verb_not_found() {
    let resp = app().oneshot(get("/api/phrasal-verbs/999")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Phrasal verb not found");
}

#[tokio::test]
async fn get_phrasal_verb_bad_id_returns_400() {
    let resp = app().oneshot(get("/api/phrasal-verbs/abc")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_requires_two_characters() {
    let app = app();

    let short = app.clone().oneshot(get("/api/phrasal-verbs/search/g")).await.unwrap();
    assert_eq!(short.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app.oneshot(get("/api/phrasal-verbs/search/look")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let verbs: Vec<PhrasalVerb> = body_json(resp).await;
    assert_eq!(verbs.len(), 2);
}

#[tokio::test]
async fn update_progress_then_stats_and_recommendations() {
    let app = app();

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/phrasal-verbs/1/progress",
            r#"{"status":"learned","progress":{"attempts":3,"correct_answers":3,"mastery_level":1.0}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let verb: PhrasalVerb = body_json(resp).await;
    assert_eq!(verb.status, "learned");
    assert_eq!(verb.progress.attempts, 3);

    let stats: Value =
        body_json(app.clone().oneshot(get("/api/phrasal-verbs/stats/progress")).await.unwrap()).await;
    assert_eq!(stats["total_verbs"], 6);
    assert_eq!(stats["by_status"]["learned"], 1);

    let recommended: Vec<PhrasalVerb> = body_json(
        app.oneshot(get("/api/phrasal-verbs/recommendations/practice?limit=10"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(recommended.len(), 5);
    assert!(recommended.iter().all(|v| v.id != 1));
}

#[tokio::test]
async fn update_progress_unknown_verb() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/api/phrasal-verbs/42/progress",
            r#"{"status":"learned"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- history ---

#[tokio::test]
async fn clear_history_without_confirm_returns_400() {
    let resp = app().oneshot(delete("/api/history")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(
        body["message"],
        "Must specify section or set confirm=true to clear all history"
    );
}

#[tokio::test]
async fn get_history_entry_not_found() {
    let resp = app().oneshot(get("/api/history/1")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(!body_bytes(resp).await.is_empty());
}

// --- full history lifecycle ---

#[tokio::test]
async fn history_lifecycle() {
    let state = Arc::new(MockState::new());
    let app = app_with_state(state.clone());

    for body in [r#"{"query":"casa"}"#, r#"{"query":"perro"}"#] {
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/api/vocabulary", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/grammar", r#"{"question":"articles please"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // newest first
    let page: Value = body_json(app.clone().oneshot(get("/api/history")).await.unwrap()).await;
    assert_eq!(page["total_count"], 3);
    assert_eq!(page["has_more"], false);
    let entries: Vec<HistoryEntry> = serde_json::from_value(page["entries"].clone()).unwrap();
    assert_eq!(entries[0].section, "grammar");
    assert_eq!(entries[2].query, "casa");

    // section filter and paging
    let page: Value = body_json(
        app.clone()
            .oneshot(get("/api/history?section=vocabulary&limit=1"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(page["total_count"], 2);
    assert_eq!(page["has_more"], true);
    assert_eq!(page["filters_applied"]["section"], "vocabulary");

    // repeated tags
    let page: Value = body_json(
        app.clone()
            .oneshot(get("/api/history?tags=translation&tags=nothing"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(page["total_count"], 2);

    let stats: Value = body_json(app.clone().oneshot(get("/api/history/stats/summary")).await.unwrap()).await;
    assert_eq!(stats["total_entries"], 3);
    assert_eq!(stats["section_counts"]["vocabulary"], 2);

    // delete one, then clear a section
    let resp = app.clone().oneshot(delete("/api/history/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.clone().oneshot(delete("/api/history/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .clone()
        .oneshot(delete("/api/history?section=grammar"))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Cleared 1 entries from grammar section");

    let resp = app.clone().oneshot(delete("/api/history?confirm=true")).await.unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Cleared all 1 history entries");

    // every request above went through the counter
    assert_eq!(state.hits(), 11);
}
