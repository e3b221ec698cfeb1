//! Scan any table by name with ad-hoc equality filters

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::extractors::QueryRequest;
use crate::api::types::ApiError;
use crate::data::AuditStore;
use crate::domain::query::{
    CompileOptions, DrainPolicy, QueryError, QueryTarget, ResultPage, classify_equality_only,
    compile_scan, execute,
};

#[derive(Clone)]
pub struct TablesApiState {
    pub store: Arc<dyn AuditStore>,
}

/// Build table scan routes
pub fn routes(store: Arc<dyn AuditStore>) -> Router<()> {
    Router::new()
        .route("/scan", get(scan_table).post(scan_table))
        .with_state(TablesApiState { store })
}

/// One page of a scan over `tableName` (optionally `indexName`)
pub async fn scan_table(
    State(state): State<TablesApiState>,
    QueryRequest(request): QueryRequest,
) -> Result<Json<ResultPage>, ApiError> {
    let controls = &request.controls;
    let table_name = controls
        .table_name
        .as_deref()
        .ok_or(QueryError::MissingTableName)?;

    let classification = classify_equality_only(&request.params);
    let mut compiled =
        compile_scan(&classification, &CompileOptions::default()).with_controls(controls);
    compiled.index_name = controls.index_name.clone();

    tracing::debug!(
        table = table_name,
        index = ?compiled.index_name,
        filters = classification.filters.len(),
        "Table scan"
    );

    let page = execute(
        state.store.as_ref(),
        &QueryTarget::scan(table_name),
        &compiled,
        controls.next_token.as_deref(),
        DrainPolicy::SinglePage,
    )
    .await?;

    Ok(Json(page))
}
