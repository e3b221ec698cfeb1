use thiserror::Error;

use crate::data::StoreError;

/// Errors raised while turning a request into a store query and running it
#[derive(Error, Debug)]
pub enum QueryError {
    /// None of the recognized index fields was supplied
    #[error("Must include one of: {}", .fields.join(", "))]
    Underspecified { fields: Vec<String> },

    /// An indexed query was compiled without an index selector
    #[error("Query has no index selector")]
    MissingSelector,

    /// The pagination token could not be decoded
    #[error("Invalid nextToken")]
    CorruptCursor,

    /// The dynamic table scan was called without a table name
    #[error("TableName is required")]
    MissingTableName,

    /// A continuation key could not be turned into a nextToken
    #[error("Failed to encode nextToken: {0}")]
    CursorEncoding(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    pub fn underspecified(fields: &[String]) -> Self {
        Self::Underspecified {
            fields: fields.to_vec(),
        }
    }

    /// Whether the caller (not the service) is at fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::CursorEncoding(_))
    }
}
