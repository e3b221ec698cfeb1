//! In-memory store that replays scripted pages and records every request

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AuditStore, StorePage, StoreRequest};
use crate::data::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Scan,
}

#[derive(Debug, Default)]
pub struct ScriptedStore {
    responses: Mutex<VecDeque<Result<StorePage, StoreError>>>,
    calls: Mutex<Vec<(Operation, StoreRequest)>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page; pages are returned in order, then empty pages
    pub fn with_page(self, page: StorePage) -> Self {
        self.responses.lock().unwrap().push_back(Ok(page));
        self
    }

    pub fn with_error(self, error: StoreError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<(Operation, StoreRequest)> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, operation: Operation, request: &StoreRequest) -> Result<StorePage, StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((operation, request.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StorePage::default()))
    }
}

#[async_trait]
impl AuditStore for ScriptedStore {
    async fn query(&self, request: &StoreRequest) -> Result<StorePage, StoreError> {
        self.respond(Operation::Query, request)
    }

    async fn scan(&self, request: &StoreRequest) -> Result<StorePage, StoreError> {
        self.respond(Operation::Scan, request)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
