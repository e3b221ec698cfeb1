//! Domain logic for audit queries
//!
//! - `query` - Parameter collection, classification, expression compilation and paged execution

pub mod query;

pub use query::{DrainPolicy, QueryError, RangeBoundMode, ResultPage};
