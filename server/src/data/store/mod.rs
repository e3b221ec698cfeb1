//! Audit store capability
//!
//! The query pipeline talks to the store through [`AuditStore`] only. The
//! production implementation is [`DynamoStore`]; tests use a scripted
//! in-memory store.

mod dynamodb;
#[cfg(test)]
pub mod scripted;

pub use dynamodb::DynamoStore;

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::error::StoreError;
use crate::domain::query::{AttrValue, Item};

/// One fully parameterized store call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreRequest {
    pub table_name: String,
    pub index_name: Option<String>,
    /// Required for queries, absent for scans
    pub key_condition: Option<String>,
    pub filter: Option<String>,
    pub projection: Option<String>,
    pub name_aliases: BTreeMap<String, String>,
    pub value_aliases: BTreeMap<String, AttrValue>,
    /// Continuation key from the previous page
    pub exclusive_start_key: Option<Item>,
    pub limit: Option<u32>,
    pub consistent_read: bool,
}

/// One page of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorePage {
    pub items: Vec<Item>,
    /// Present when the store has more data
    pub last_evaluated_key: Option<Item>,
}

#[async_trait]
pub trait AuditStore: Send + Sync + std::fmt::Debug {
    /// Indexed query (requires `key_condition`)
    async fn query(&self, request: &StoreRequest) -> Result<StorePage, StoreError>;

    /// Full table or index scan
    async fn scan(&self, request: &StoreRequest) -> Result<StorePage, StoreError>;

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}
