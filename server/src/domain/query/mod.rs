//! Filter-to-query compiler
//!
//! Request parameters flow through the pipeline in this order:
//! - `params` - collect and normalize query-string and body parameters
//! - `classify` - pick the index selector, date range and equality filters
//! - `compile` - build aliased key-condition, filter and projection expressions
//! - `executor` - run against the store with cursor pagination
//! - `decode` - turn store values into plain JSON
//!
//! `cursor` encodes and decodes pagination tokens; `value` is the store's
//! typed value representation.

pub mod classify;
pub mod compile;
pub mod cursor;
pub mod decode;
pub mod error;
pub mod executor;
pub mod params;
pub mod value;

pub use classify::{
    Classification, EqualityFilter, IndexSelector, RangeBound, classify, classify_equality_only,
    classify_for_query,
};
pub use compile::{CompileOptions, CompiledQuery, RangeBoundMode, compile_query, compile_scan};
pub use cursor::{decode_cursor, encode_cursor};
pub use decode::{decode_item, decode_value};
pub use error::QueryError;
pub use executor::{DrainPolicy, QueryTarget, ResultPage, StoreOperation, execute};
pub use params::{CollectedRequest, RawParameters, RequestControls, collect_parameters};
pub use value::{AttrValue, Item};
