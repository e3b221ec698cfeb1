//! Expression compiler
//!
//! Builds key-condition, filter and projection expressions from a
//! classification. User input never appears in an expression string: every
//! attribute name goes through a `#attr<i>` alias and every literal through a
//! `:val<i>` placeholder.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::classify::{Classification, EqualityFilter, RangeBound};
use super::error::QueryError;
use super::params::RequestControls;
use super::value::AttrValue;

/// Where an indexed query puts its date range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBoundMode {
    /// `AND #ts BETWEEN :a AND :b` in the key condition. The range attribute
    /// must be the sort key of every queried index.
    KeyCondition,
    /// `#ts >= :a AND #ts <= :b` in the filter expression. Works on any attribute.
    #[default]
    #[serde(rename = "filter", alias = "filter_clause")]
    FilterClause,
}

impl fmt::Display for RangeBoundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBoundMode::KeyCondition => write!(f, "key_condition"),
            RangeBoundMode::FilterClause => write!(f, "filter"),
        }
    }
}

/// Static inputs of one query type
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Attribute the date range applies to
    pub range_attribute: String,
    pub range_mode: RangeBoundMode,
    /// Attributes to return, in order. Empty returns whole items.
    pub projection: Vec<String>,
}

/// A fully parameterized store request, minus the table and cursor
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub key_condition: Option<String>,
    pub filter_expression: Option<String>,
    pub projection_expression: Option<String>,
    /// alias -> attribute name
    pub name_aliases: BTreeMap<String, String>,
    /// placeholder -> literal
    pub value_aliases: BTreeMap<String, AttrValue>,
    pub index_name: Option<String>,
    pub consistent_read: bool,
    pub limit: Option<u32>,
}

impl CompiledQuery {
    /// Carry page size and read consistency over from the request
    pub fn with_controls(mut self, controls: &RequestControls) -> Self {
        self.limit = controls.limit;
        self.consistent_read = controls.consistent_read;
        self
    }
}

/// Allocates name aliases and value placeholders
#[derive(Debug, Default)]
struct ExpressionBuilder {
    names: BTreeMap<String, String>,
    aliases_by_name: HashMap<String, String>,
    values: BTreeMap<String, AttrValue>,
}

impl ExpressionBuilder {
    /// One alias per distinct attribute name
    fn name(&mut self, real: &str) -> String {
        if let Some(alias) = self.aliases_by_name.get(real) {
            return alias.clone();
        }
        let alias = format!("#attr{}", self.aliases_by_name.len());
        self.aliases_by_name
            .insert(real.to_string(), alias.clone());
        self.names.insert(alias.clone(), real.to_string());
        alias
    }

    /// One placeholder per literal occurrence, even for equal literals
    fn value(&mut self, literal: &str) -> String {
        let placeholder = format!(":val{}", self.values.len());
        self.values
            .insert(placeholder.clone(), AttrValue::string(literal));
        placeholder
    }

    fn equality(&mut self, filter: &EqualityFilter) -> String {
        let name = self.name(&filter.name);
        let value = self.value(&filter.value);
        format!("{} = {}", name, value)
    }

    fn between(&mut self, attribute: &str, range: &RangeBound) -> String {
        let name = self.name(attribute);
        let start = self.value(&range.start);
        let end = self.value(&range.end);
        format!("{} BETWEEN {} AND {}", name, start, end)
    }

    fn two_sided(&mut self, attribute: &str, range: &RangeBound) -> String {
        let name = self.name(attribute);
        let start = self.value(&range.start);
        let end = self.value(&range.end);
        format!("{} >= {} AND {} <= {}", name, start, name, end)
    }

    fn projection(&mut self, attributes: &[String]) -> Option<String> {
        if attributes.is_empty() {
            return None;
        }
        let aliases: Vec<String> = attributes.iter().map(|a| self.name(a)).collect();
        Some(aliases.join(", "))
    }

    fn finish(
        self,
        key_condition: Option<String>,
        clauses: Vec<String>,
        projection: Option<String>,
        index_name: Option<String>,
    ) -> CompiledQuery {
        CompiledQuery {
            key_condition,
            filter_expression: (!clauses.is_empty()).then(|| clauses.join(" AND ")),
            projection_expression: projection,
            name_aliases: self.names,
            value_aliases: self.values,
            index_name,
            consistent_read: false,
            limit: None,
        }
    }
}

/// Compile an indexed query. Requires an index selector.
pub fn compile_query(
    classification: &Classification,
    options: &CompileOptions,
) -> Result<CompiledQuery, QueryError> {
    let selector = classification
        .selector
        .as_ref()
        .ok_or(QueryError::MissingSelector)?;

    let mut builder = ExpressionBuilder::default();

    let index_alias = builder.name(&selector.field_name);
    let index_value = builder.value(&selector.value);
    let mut key_condition = format!("{} = {}", index_alias, index_value);

    let mut clauses = Vec::new();
    for filter in &classification.filters {
        clauses.push(builder.equality(filter));
    }

    if let Some(range) = &classification.range {
        match options.range_mode {
            RangeBoundMode::KeyCondition => {
                key_condition.push_str(" AND ");
                key_condition.push_str(&builder.between(&options.range_attribute, range));
            }
            RangeBoundMode::FilterClause => {
                clauses.push(builder.two_sided(&options.range_attribute, range));
            }
        }
    }

    let projection = builder.projection(&options.projection);
    Ok(builder.finish(
        Some(key_condition),
        clauses,
        projection,
        Some(selector.index_name.clone()),
    ))
}

/// Compile a scan. Every parameter is a filter; the range is always a filter.
pub fn compile_scan(classification: &Classification, options: &CompileOptions) -> CompiledQuery {
    let mut builder = ExpressionBuilder::default();

    let mut clauses = Vec::new();
    if let Some(selector) = &classification.selector {
        clauses.push(builder.equality(&EqualityFilter {
            name: selector.field_name.clone(),
            value: selector.value.clone(),
        }));
    }
    for filter in &classification.filters {
        clauses.push(builder.equality(filter));
    }
    if let Some(range) = &classification.range
        && !options.range_attribute.is_empty()
    {
        clauses.push(builder.between(&options.range_attribute, range));
    }

    let projection = builder.projection(&options.projection);
    builder.finish(None, clauses, projection, None)
}
