//! Filter maps rendered as query strings.

use url::form_urlencoded;

/// A single filter value. `Null` and empty text are never sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Null,
    Text(String),
    /// Rendered as the same key repeated once per non-empty item.
    List(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::List(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

/// Insertion-ordered filter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    entries: Vec<(String, FilterValue)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`. Re-setting a key keeps its original position.
    pub fn set(mut self, key: &str, value: impl Into<FilterValue>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.to_query_string().is_empty()
    }

    /// `key=value` pairs joined by `&`, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            match value {
                FilterValue::Null => {}
                FilterValue::Text(text) if text.is_empty() => {}
                FilterValue::Text(text) => {
                    serializer.append_pair(key, text);
                }
                FilterValue::List(items) => {
                    for item in items.iter().filter(|item| !item.is_empty()) {
                        serializer.append_pair(key, item);
                    }
                }
            }
        }
        serializer.finish()
    }

    /// `path` with `?query` appended when any filter is non-empty.
    pub fn apply_to(&self, path: &str) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        }
    }
}
