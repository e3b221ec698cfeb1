//! Request parameter collection
//!
//! Merges query-string pairs and a JSON body into one case-insensitive
//! parameter map. Pagination and targeting controls are pulled out into
//! [`RequestControls`] so they never reach the filter classifier.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde_json::Value;

use crate::core::constants::{
    MAX_QUERY_LIMIT, PARAM_CONSISTENT_READ, PARAM_INDEX_NAME, PARAM_LIMIT, PARAM_NEXT_TOKEN,
    PARAM_TABLE_NAME,
};

/// One collected parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Name as first supplied (used as the store attribute name)
    pub name: String,
    /// Trimmed, non-blank value
    pub value: String,
}

/// Case-insensitive parameter map that remembers insertion order
///
/// Names are folded with Unicode lowercasing, so `Ä` and `ä` are the same parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParameters {
    entries: Vec<Parameter>,
    /// folded name -> position in `entries`
    positions: HashMap<String, usize>,
}

impl RawParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter. Blank values are ignored.
    ///
    /// Replacing keeps the first spelling of the name and its position.
    pub fn insert(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match self.positions.entry(fold_name(name)) {
            Entry::Occupied(slot) => self.entries[*slot.get()].value = value.to_string(),
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push(Parameter {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.positions
            .get(&fold_name(name))
            .map(|&i| self.entries[i].value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

impl<'a> FromIterator<(&'a str, &'a str)> for RawParameters {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Top-level controls that steer execution rather than filtering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestControls {
    pub next_token: Option<String>,
    /// Positive, capped at [`MAX_QUERY_LIMIT`]
    pub limit: Option<u32>,
    pub consistent_read: bool,
    pub table_name: Option<String>,
    pub index_name: Option<String>,
}

impl RequestControls {
    /// Try to consume a parameter as a control. Returns false if `name` is not a control.
    fn absorb(&mut self, name: &str, value: &Value) -> bool {
        let text = match value {
            Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()),
            _ => None,
        };

        if name.eq_ignore_ascii_case(PARAM_NEXT_TOKEN) {
            if let Some(t) = text {
                self.next_token = Some(t.to_string());
            }
        } else if name.eq_ignore_ascii_case(PARAM_LIMIT) {
            if let Some(limit) = parse_limit(value) {
                self.limit = Some(limit);
            }
        } else if name.eq_ignore_ascii_case(PARAM_CONSISTENT_READ) {
            self.consistent_read = true;
        } else if name.eq_ignore_ascii_case(PARAM_TABLE_NAME) {
            if let Some(t) = text {
                self.table_name = Some(t.to_string());
            }
        } else if name.eq_ignore_ascii_case(PARAM_INDEX_NAME) {
            if let Some(t) = text {
                self.index_name = Some(t.to_string());
            }
        } else {
            return false;
        }
        true
    }
}

/// Parse a page limit. Invalid or non-positive values are ignored.
fn parse_limit(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (n > 0).then(|| n.min(MAX_QUERY_LIMIT as i64) as u32)
}

/// Everything extracted from one request
#[derive(Debug, Clone, Default)]
pub struct CollectedRequest {
    pub params: RawParameters,
    pub controls: RequestControls,
}

/// Merge query-string pairs and an optional JSON body.
///
/// The body wins on conflicts. A malformed body is ignored.
pub fn collect_parameters(query: &[(String, String)], body: Option<&str>) -> CollectedRequest {
    let mut collected = CollectedRequest::default();

    for (name, value) in query {
        let value = Value::String(value.clone());
        if !collected.controls.absorb(name, &value) {
            collected.params.insert(name, value.as_str().unwrap_or_default());
        }
    }

    let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
        return collected;
    };

    match serde_json::from_str::<serde_json::Map<String, Value>>(body) {
        Ok(fields) => {
            for (name, value) in &fields {
                if collected.controls.absorb(name, value) {
                    continue;
                }
                // Only string fields are filters; nested objects, arrays, numbers are skipped
                if let Value::String(s) = value {
                    collected.params.insert(name, s);
                }
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed request body");
        }
    }

    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_trims_and_drops_blank_values() {
        let collected = collect_parameters(&qs(&[("userId", "  u1 "), ("role", "   ")]), None);
        assert_eq!(collected.params.get("userId"), Some("u1"));
        assert_eq!(collected.params.get("role"), None);
        assert_eq!(collected.params.len(), 1);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let collected = collect_parameters(&qs(&[("UserId", "u1")]), None);
        assert_eq!(collected.params.get("userid"), Some("u1"));
        assert_eq!(collected.params.get("USERID"), Some("u1"));
    }

    #[test]
    fn test_body_overrides_query_string() {
        let collected = collect_parameters(
            &qs(&[("userId", "from-qs"), ("role", "admin")]),
            Some(r#"{"USERID": "from-body"}"#),
        );
        assert_eq!(collected.params.get("userId"), Some("from-body"));
        assert_eq!(collected.params.get("role"), Some("admin"));

        // Spelling and position of the first occurrence are kept
        let first = collected.params.iter().next().unwrap();
        assert_eq!(first.name, "userId");
    }

    #[test]
    fn test_malformed_body_keeps_query_string() {
        let collected = collect_parameters(&qs(&[("userId", "u1")]), Some("{not json"));
        assert_eq!(collected.params.get("userId"), Some("u1"));
        assert_eq!(collected.params.len(), 1);
    }

    #[test]
    fn test_non_object_body_is_ignored() {
        let collected = collect_parameters(&[], Some(r#"["userId", "u1"]"#));
        assert!(collected.params.is_empty());
    }

    #[test]
    fn test_non_string_body_fields_are_ignored() {
        let collected = collect_parameters(
            &[],
            Some(r#"{"userId": "u1", "count": 3, "nested": {"a": "b"}, "flag": true}"#),
        );
        assert_eq!(collected.params.len(), 1);
        assert_eq!(collected.params.get("userId"), Some("u1"));
    }

    #[test]
    fn test_controls_are_not_parameters() {
        let collected = collect_parameters(
            &qs(&[
                ("nextToken", "abc"),
                ("limit", "25"),
                ("consistentRead", ""),
                ("tableName", "audit"),
                ("indexName", "role-index"),
                ("role", "admin"),
            ]),
            None,
        );
        assert_eq!(collected.params.len(), 1);
        assert_eq!(
            collected.controls,
            RequestControls {
                next_token: Some("abc".to_string()),
                limit: Some(25),
                consistent_read: true,
                table_name: Some("audit".to_string()),
                index_name: Some("role-index".to_string()),
            }
        );
    }

    #[test]
    fn test_limit_is_capped_and_validated() {
        let collected = collect_parameters(&qs(&[("limit", "50000")]), None);
        assert_eq!(collected.controls.limit, Some(MAX_QUERY_LIMIT));

        let collected = collect_parameters(&qs(&[("limit", "0")]), None);
        assert_eq!(collected.controls.limit, None);

        let collected = collect_parameters(&qs(&[("limit", "-4")]), None);
        assert_eq!(collected.controls.limit, None);

        let collected = collect_parameters(&qs(&[("limit", "ten")]), None);
        assert_eq!(collected.controls.limit, None);
    }

    #[test]
    fn test_body_controls() {
        let collected = collect_parameters(
            &qs(&[("nextToken", "from-qs"), ("limit", "5")]),
            Some(r#"{"nextToken": "from-body", "limit": 7, "tableName": 3}"#),
        );
        assert_eq!(collected.controls.next_token.as_deref(), Some("from-body"));
        assert_eq!(collected.controls.limit, Some(7));
        assert_eq!(collected.controls.table_name, None);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let collected = collect_parameters(
            &qs(&[("b", "1"), ("a", "2")]),
            Some(r#"{"c": "3", "a": "4"}"#),
        );
        let names: Vec<&str> = collected.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(collected.params.get("a"), Some("4"));
    }

    #[test]
    fn test_non_ascii_names_fold() {
        let collected = collect_parameters(&qs(&[("Ärger", "a")]), Some(r#"{"äRGER": "b"}"#));
        assert_eq!(collected.params.len(), 1);
        assert_eq!(collected.params.get("ÄRGER"), Some("b"));
        assert_eq!(collected.params.iter().next().unwrap().name, "Ärger");
    }

    #[test]
    fn test_large_body_collects_every_key() {
        let fields: serde_json::Map<String, Value> = (0..50_000)
            .map(|i| (format!("k{}", i), Value::String("v".to_string())))
            .collect();
        let body = Value::Object(fields).to_string();

        let collected = collect_parameters(&qs(&[("K0", "from-qs")]), Some(&body));

        assert_eq!(collected.params.len(), 50_000);
        assert_eq!(collected.params.get("k0"), Some("v"));
        assert_eq!(collected.params.get("K49999"), Some("v"));
        assert_eq!(collected.params.iter().next().unwrap().name, "K0");
        assert_eq!(collected.params.iter().last().unwrap().name, "k49999");
    }
}
