//! Request extractors for the query routes
//!
//! Query endpoints accept parameters from the query string, the JSON body,
//! or both. [`QueryRequest`] gathers both sources into one
//! [`CollectedRequest`].

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::query::{CollectedRequest, collect_parameters};

/// Parameters of one query request
#[derive(Debug)]
pub struct QueryRequest(pub CollectedRequest);

impl<S> FromRequest<S> for QueryRequest
where
    S: Send + Sync,
{
    type Rejection = RequestRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        // Vec keeps query-string order, which decides the index selector
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(&mut parts, state)
            .await
            .map_err(RequestRejection::Query)?;

        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(RequestRejection::Body)?;

        // A body that is not UTF-8 is treated like malformed JSON
        let body = std::str::from_utf8(&bytes).ok();
        if body.is_none() {
            tracing::debug!(len = bytes.len(), "Ignoring non-UTF-8 request body");
        }

        Ok(Self(collect_parameters(&pairs, body)))
    }
}

/// Rejection with a `{ "error": message }` body
#[derive(Debug)]
pub enum RequestRejection {
    /// Query string could not be decoded
    Query(QueryRejection),
    /// Body could not be read (too large, connection error)
    Body(BytesRejection),
}

impl IntoResponse for RequestRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Query(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            Self::Body(rejection) => (rejection.status(), rejection.body_text()),
        };
        (
            status,
            axum::Json(serde_json::json!({ "error": message })),
        )
            .into_response()
    }
}
