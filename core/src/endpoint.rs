//! Static table of API endpoints, relative to `ClientConfig::base_url`.

use crate::http::HttpMethod;

/// One logical operation on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub method: HttpMethod,
    /// Path template; placeholders look like `{id}`.
    pub path: &'static str,
    pub requires_body: bool,
}

impl Endpoint {
    const fn new(method: HttpMethod, path: &'static str, requires_body: bool) -> Self {
        Self {
            method,
            path,
            requires_body,
        }
    }

    /// Substitutes `{name}` with the percent-encoded `value`.
    pub fn bind(&self, name: &str, value: &str) -> String {
        let placeholder = format!("{{{name}}}");
        self.path
            .replace(&placeholder, &urlencoding::encode(value))
    }
}

pub const VOCABULARY: &str = "/vocabulary";
pub const CORRECTION: &str = "/correction";
pub const GRAMMAR: &str = "/grammar";
pub const PHRASAL_VERBS: &str = "/phrasal-verbs";
pub const HISTORY: &str = "/history";

pub const EXPLAIN_VOCABULARY: Endpoint = Endpoint::new(HttpMethod::Post, "/vocabulary", true);
pub const SUPPORTED_LANGUAGES: Endpoint =
    Endpoint::new(HttpMethod::Get, "/vocabulary/languages", false);

pub const CORRECT_TEXT: Endpoint = Endpoint::new(HttpMethod::Post, "/correction", true);
pub const CORRECTION_LEVELS: Endpoint =
    Endpoint::new(HttpMethod::Get, "/correction/correction-levels", false);

pub const EXPLAIN_GRAMMAR: Endpoint = Endpoint::new(HttpMethod::Post, "/grammar", true);
pub const GRAMMAR_TOPICS: Endpoint = Endpoint::new(HttpMethod::Get, "/grammar/topics", false);
pub const WORD_COMPARISONS: Endpoint =
    Endpoint::new(HttpMethod::Get, "/grammar/word-comparisons", false);
pub const QUESTION_TYPES: Endpoint =
    Endpoint::new(HttpMethod::Get, "/grammar/question-types", false);

pub const LIST_PHRASAL_VERBS: Endpoint = Endpoint::new(HttpMethod::Get, "/phrasal-verbs", false);
pub const GET_PHRASAL_VERB: Endpoint = Endpoint::new(HttpMethod::Get, "/phrasal-verbs/{id}", false);
pub const SEARCH_PHRASAL_VERBS: Endpoint =
    Endpoint::new(HttpMethod::Get, "/phrasal-verbs/search/{query}", false);
pub const UPDATE_PHRASAL_VERB_PROGRESS: Endpoint =
    Endpoint::new(HttpMethod::Put, "/phrasal-verbs/{id}/progress", true);
pub const PHRASAL_VERB_STATS: Endpoint =
    Endpoint::new(HttpMethod::Get, "/phrasal-verbs/stats/progress", false);
pub const RECOMMENDED_PHRASAL_VERBS: Endpoint =
    Endpoint::new(HttpMethod::Get, "/phrasal-verbs/recommendations/practice", false);

pub const LIST_HISTORY: Endpoint = Endpoint::new(HttpMethod::Get, "/history", false);
pub const GET_HISTORY_ENTRY: Endpoint = Endpoint::new(HttpMethod::Get, "/history/{id}", false);
pub const DELETE_HISTORY_ENTRY: Endpoint =
    Endpoint::new(HttpMethod::Delete, "/history/{id}", false);
pub const CLEAR_HISTORY: Endpoint = Endpoint::new(HttpMethod::Delete, "/history", false);
pub const HISTORY_STATS: Endpoint = Endpoint::new(HttpMethod::Get, "/history/stats/summary", false);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_replaces_placeholder() {
        assert_eq!(GET_PHRASAL_VERB.bind("id", "7"), "/phrasal-verbs/7");
        assert_eq!(
            UPDATE_PHRASAL_VERB_PROGRESS.bind("id", "12"),
            "/phrasal-verbs/12/progress"
        );
    }

    #[test]
    fn bind_percent_encodes_value() {
        assert_eq!(
            SEARCH_PHRASAL_VERBS.bind("query", "give up/in"),
            "/phrasal-verbs/search/give%20up%2Fin"
        );
    }

    #[test]
    fn section_roots_prefix_their_endpoints() {
        assert!(LIST_HISTORY.path.starts_with(HISTORY));
        assert!(LIST_PHRASAL_VERBS.path.starts_with(PHRASAL_VERBS));
        assert!(EXPLAIN_VOCABULARY.path.starts_with(VOCABULARY));
        assert!(CORRECT_TEXT.path.starts_with(CORRECTION));
        assert!(EXPLAIN_GRAMMAR.path.starts_with(GRAMMAR));
    }
}
