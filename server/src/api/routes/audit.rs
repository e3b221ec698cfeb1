//! Audit table query endpoints
//!
//! | Route          | Operation | Date range                    | Pages              |
//! |----------------|-----------|-------------------------------|--------------------|
//! | `/query`       | Query     | configured range mode         | one                |
//! | `/query/all`   | Query     | configured range mode         | all (or `limit`)   |
//! | `/scan`        | Scan      | `BETWEEN` in the filter       | one                |

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::extractors::QueryRequest;
use crate::api::types::ApiError;
use crate::core::config::AuditConfig;
use crate::data::AuditStore;
use crate::domain::query::{
    CollectedRequest, DrainPolicy, QueryTarget, ResultPage, classify, classify_for_query,
    compile_query, compile_scan, execute,
};

/// Shared state for audit endpoints
#[derive(Clone)]
pub struct AuditApiState {
    pub store: Arc<dyn AuditStore>,
    pub table: Arc<str>,
    pub audit: Arc<AuditConfig>,
}

/// Build audit API routes
pub fn routes(store: Arc<dyn AuditStore>, table: &str, audit: AuditConfig) -> Router<()> {
    let state = AuditApiState {
        store,
        table: Arc::from(table),
        audit: Arc::new(audit),
    };

    Router::new()
        .route("/query", get(query).post(query))
        .route("/query/all", get(query_all).post(query_all))
        .route("/scan", get(scan).post(scan))
        .with_state(state)
}

/// One page of an indexed query
pub async fn query(
    State(state): State<AuditApiState>,
    QueryRequest(request): QueryRequest,
) -> Result<Json<ResultPage>, ApiError> {
    run_query(&state, request, DrainPolicy::SinglePage)
        .await
        .map(Json)
}

/// Indexed query drained across pages
pub async fn query_all(
    State(state): State<AuditApiState>,
    QueryRequest(request): QueryRequest,
) -> Result<Json<ResultPage>, ApiError> {
    run_query(&state, request, DrainPolicy::DrainAll)
        .await
        .map(Json)
}

/// One page of a filtered scan over the audit table
pub async fn scan(
    State(state): State<AuditApiState>,
    QueryRequest(request): QueryRequest,
) -> Result<Json<ResultPage>, ApiError> {
    // Index fields are ordinary filters in a scan
    let classification = classify(&request.params, &[]);
    let compiled = compile_scan(&classification, &state.audit.scan_options())
        .with_controls(&request.controls);

    let page = execute(
        state.store.as_ref(),
        &QueryTarget::scan(state.table.as_ref()),
        &compiled,
        request.controls.next_token.as_deref(),
        DrainPolicy::SinglePage,
    )
    .await?;

    Ok(Json(page))
}

async fn run_query(
    state: &AuditApiState,
    request: CollectedRequest,
    policy: DrainPolicy,
) -> Result<ResultPage, ApiError> {
    let classification = classify_for_query(&request.params, &state.audit.index_fields)?;
    let compiled = compile_query(&classification, &state.audit.query_options())?
        .with_controls(&request.controls);

    tracing::debug!(
        index = ?compiled.index_name,
        filters = classification.filters.len(),
        ranged = classification.range.is_some(),
        ?policy,
        "Audit query"
    );

    let page = execute(
        state.store.as_ref(),
        &QueryTarget::query(state.table.as_ref()),
        &compiled,
        request.controls.next_token.as_deref(),
        policy,
    )
    .await?;

    Ok(page)
}
