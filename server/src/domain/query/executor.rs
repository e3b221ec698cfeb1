//! Page executor
//!
//! Runs a compiled query against the store, following continuation keys
//! according to a [`DrainPolicy`], and decodes the returned items.

use serde::Serialize;
use serde_json::{Map, Value};

use super::compile::CompiledQuery;
use super::cursor::{decode_cursor, encode_cursor};
use super::decode::decode_item;
use super::error::QueryError;
use super::value::Item;
use crate::data::{AuditStore, StoreRequest};

/// How many store pages one request may consume
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Exactly one store call
    #[default]
    SinglePage,
    /// Follow continuation keys until exhausted or the caller's limit is reached
    DrainAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Query,
    Scan,
}

/// Table and operation a compiled query runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub table_name: String,
    pub operation: StoreOperation,
}

impl QueryTarget {
    pub fn query(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            operation: StoreOperation::Query,
        }
    }

    pub fn scan(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            operation: StoreOperation::Scan,
        }
    }
}

/// Decoded items plus the cursor for the next call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultPage {
    pub items: Vec<Map<String, Value>>,
    #[serde(rename = "nextToken", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Execute a compiled query.
///
/// The inbound cursor is decoded before any store call, so a corrupt token
/// never reaches the store. Any store failure aborts the whole request.
pub async fn execute(
    store: &dyn AuditStore,
    target: &QueryTarget,
    compiled: &CompiledQuery,
    cursor: Option<&str>,
    policy: DrainPolicy,
) -> Result<ResultPage, QueryError> {
    let start_key = match cursor {
        Some(token) => decode_cursor(token)?,
        None => None,
    };

    if target.operation == StoreOperation::Query && compiled.key_condition.is_none() {
        return Err(QueryError::MissingSelector);
    }

    let mut request = store_request(target, compiled, start_key);
    let mut items: Vec<Item> = Vec::new();
    let mut page_number = 0usize;

    let last_key = loop {
        page_number += 1;
        let page = match target.operation {
            StoreOperation::Query => store.query(&request).await?,
            StoreOperation::Scan => store.scan(&request).await?,
        };
        tracing::trace!(
            page = page_number,
            items = page.items.len(),
            more = page.last_evaluated_key.is_some(),
            "Fetched store page"
        );
        items.extend(page.items);

        let Some(key) = page.last_evaluated_key else {
            break None;
        };
        let reached_limit = compiled.limit.is_some_and(|l| items.len() >= l as usize);
        if policy == DrainPolicy::SinglePage || reached_limit {
            break Some(key);
        }
        request.exclusive_start_key = Some(key);
    };

    tracing::debug!(
        table = %target.table_name,
        operation = ?target.operation,
        pages = page_number,
        items = items.len(),
        "Query executed"
    );

    // An unencodable key is a server error, never an exhausted result
    let next_cursor = match &last_key {
        Some(key) => encode_cursor(key)?,
        None => None,
    };

    Ok(ResultPage {
        items: items.iter().map(decode_item).collect(),
        next_cursor,
    })
}

fn store_request(
    target: &QueryTarget,
    compiled: &CompiledQuery,
    start_key: Option<Item>,
) -> StoreRequest {
    StoreRequest {
        table_name: target.table_name.clone(),
        index_name: compiled.index_name.clone(),
        key_condition: compiled.key_condition.clone(),
        filter: compiled.filter_expression.clone(),
        projection: compiled.projection_expression.clone(),
        name_aliases: compiled.name_aliases.clone(),
        value_aliases: compiled.value_aliases.clone(),
        exclusive_start_key: start_key,
        limit: compiled.limit,
        consistent_read: compiled.consistent_read,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::data::StoreError;
    use crate::data::StorePage;
    use crate::data::store::scripted::{Operation, ScriptedStore};
    use crate::domain::query::value::AttrValue;

    fn item(id: &str) -> Item {
        BTreeMap::from([("auditId".to_string(), AttrValue::string(id))])
    }

    fn page(ids: &[&str], last: Option<&str>) -> StorePage {
        StorePage {
            items: ids.iter().map(|id| item(id)).collect(),
            last_evaluated_key: last.map(item),
        }
    }

    fn compiled_query() -> CompiledQuery {
        CompiledQuery {
            key_condition: Some("#attr0 = :val0".to_string()),
            name_aliases: BTreeMap::from([("#attr0".to_string(), "userId".to_string())]),
            value_aliases: BTreeMap::from([(":val0".to_string(), AttrValue::string("u1"))]),
            index_name: Some("userId-index".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_page_returns_continuation() {
        let store = ScriptedStore::new().with_page(page(&["a1", "a2"], Some("a2")));

        let result = execute(
            &store,
            &QueryTarget::query("audit"),
            &compiled_query(),
            None,
            DrainPolicy::SinglePage,
        )
        .await
        .unwrap();

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0]["auditId"], json!("a1"));
        assert_eq!(result.next_cursor, encode_cursor(&item("a2")).unwrap());

        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Operation::Query);
        assert_eq!(calls[0].1.table_name, "audit");
        assert_eq!(calls[0].1.index_name.as_deref(), Some("userId-index"));
        assert_eq!(calls[0].1.exclusive_start_key, None);
    }

    #[tokio::test]
    async fn test_exhausted_has_no_cursor() {
        let store = ScriptedStore::new().with_page(page(&["a1"], None));

        let result = execute(
            &store,
            &QueryTarget::query("audit"),
            &compiled_query(),
            None,
            DrainPolicy::SinglePage,
        )
        .await
        .unwrap();

        assert_eq!(result.next_cursor, None);
        let body = serde_json::to_value(&result).unwrap();
        assert!(body.get("nextToken").is_none());
    }

    #[tokio::test]
    async fn test_inbound_cursor_is_forwarded_verbatim() {
        let key = BTreeMap::from([
            ("userId".to_string(), AttrValue::string("u1")),
            ("auditId".to_string(), AttrValue::string("a9")),
        ]);
        let token = encode_cursor(&key).unwrap().unwrap();
        let store = ScriptedStore::new().with_page(page(&[], None));

        execute(
            &store,
            &QueryTarget::query("audit"),
            &compiled_query(),
            Some(&token),
            DrainPolicy::SinglePage,
        )
        .await
        .unwrap();

        assert_eq!(store.calls()[0].1.exclusive_start_key, Some(key));
    }

    #[tokio::test]
    async fn test_corrupt_cursor_skips_store() {
        let store = ScriptedStore::new();

        let err = execute(
            &store,
            &QueryTarget::query("audit"),
            &compiled_query(),
            Some("!!!"),
            DrainPolicy::SinglePage,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, QueryError::CorruptCursor));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drain_all_follows_keys() {
        let store = ScriptedStore::new()
            .with_page(page(&["a1", "a2"], Some("a2")))
            .with_page(page(&["a3"], Some("a3")))
            .with_page(page(&["a4"], None));

        let result = execute(
            &store,
            &QueryTarget::query("audit"),
            &compiled_query(),
            None,
            DrainPolicy::DrainAll,
        )
        .await
        .unwrap();

        assert_eq!(result.items.len(), 4);
        assert_eq!(result.next_cursor, None);

        let starts: Vec<_> = store
            .calls()
            .into_iter()
            .map(|(_, r)| r.exclusive_start_key)
            .collect();
        assert_eq!(starts, vec![None, Some(item("a2")), Some(item("a3"))]);
    }

    #[tokio::test]
    async fn test_drain_all_stops_at_limit() {
        let store = ScriptedStore::new()
            .with_page(page(&["a1", "a2"], Some("a2")))
            .with_page(page(&["a3", "a4"], Some("a4")))
            .with_page(page(&["a5"], None));

        let mut compiled = compiled_query();
        compiled.limit = Some(3);

        let result = execute(
            &store,
            &QueryTarget::query("audit"),
            &compiled,
            None,
            DrainPolicy::DrainAll,
        )
        .await
        .unwrap();

        // In-flight page is kept whole
        assert_eq!(result.items.len(), 4);
        assert_eq!(result.next_cursor, encode_cursor(&item("a4")).unwrap());
        assert_eq!(store.calls().len(), 2);
        assert!(store.calls().iter().all(|(_, r)| r.limit == Some(3)));
    }

    #[tokio::test]
    async fn test_scan_target() {
        let store = ScriptedStore::new().with_page(page(&["a1"], None));
        let compiled = CompiledQuery::default();

        execute(
            &store,
            &QueryTarget::scan("other_table"),
            &compiled,
            None,
            DrainPolicy::SinglePage,
        )
        .await
        .unwrap();

        let calls = store.calls();
        assert_eq!(calls[0].0, Operation::Scan);
        assert_eq!(calls[0].1.table_name, "other_table");
        assert_eq!(calls[0].1.key_condition, None);
    }

    #[tokio::test]
    async fn test_query_without_key_condition() {
        let store = ScriptedStore::new();
        let err = execute(
            &store,
            &QueryTarget::query("audit"),
            &CompiledQuery::default(),
            None,
            DrainPolicy::SinglePage,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, QueryError::MissingSelector));
    }

    #[tokio::test]
    async fn test_store_failure_discards_partial_results() {
        let store = ScriptedStore::new()
            .with_page(page(&["a1"], Some("a1")))
            .with_error(StoreError::backend("query", "throttled"));

        let err = execute(
            &store,
            &QueryTarget::query("audit"),
            &compiled_query(),
            None,
            DrainPolicy::DrainAll,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, QueryError::Store(StoreError::Backend { .. })));
    }
}
