//! Data storage layer
//!
//! - `store` - Audit store capability and the DynamoDB implementation
//! - `error` - Store error type

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{AuditStore, DynamoStore, StorePage, StoreRequest};
