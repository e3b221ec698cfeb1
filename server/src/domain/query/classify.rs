//! Filter classification
//!
//! Splits collected parameters into an index selector, an optional date range
//! and residual equality filters.

use serde::Serialize;

use super::error::QueryError;
use super::params::RawParameters;
use crate::core::constants::{INDEX_NAME_SUFFIX, PARAM_END_DATE, PARAM_START_DATE};
use crate::utils::time::parse_flexible_timestamp;

/// Partition selector for an indexed query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSelector {
    /// Configured spelling of the index field
    pub field_name: String,
    /// `<field_name>-index`
    pub index_name: String,
    pub value: String,
}

impl IndexSelector {
    pub fn new(field_name: &str, value: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            index_name: format!("{}{}", field_name, INDEX_NAME_SUFFIX),
            value: value.to_string(),
        }
    }
}

/// Inclusive date range over the configured timestamp attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeBound {
    pub start: String,
    pub end: String,
}

/// Residual `name = value` filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EqualityFilter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub selector: Option<IndexSelector>,
    pub range: Option<RangeBound>,
    pub filters: Vec<EqualityFilter>,
}

/// Classify parameters. Never fails; the selector is optional.
///
/// The first parameter (in insertion order) naming one of `index_fields`
/// becomes the selector; any later index field is an ordinary filter.
pub fn classify(params: &RawParameters, index_fields: &[String]) -> Classification {
    let mut result = Classification::default();

    for param in params.iter() {
        if param.name.eq_ignore_ascii_case(PARAM_START_DATE)
            || param.name.eq_ignore_ascii_case(PARAM_END_DATE)
        {
            continue;
        }

        if result.selector.is_none()
            && let Some(field) = index_fields
                .iter()
                .find(|f| f.eq_ignore_ascii_case(&param.name))
        {
            result.selector = Some(IndexSelector::new(field, &param.value));
            continue;
        }

        result.filters.push(EqualityFilter {
            name: param.name.clone(),
            value: param.value.clone(),
        });
    }

    result.range = range_bound(params);
    result
}

/// Classify parameters for an indexed query, which needs a selector.
pub fn classify_for_query(
    params: &RawParameters,
    index_fields: &[String],
) -> Result<Classification, QueryError> {
    let classification = classify(params, index_fields);
    if classification.selector.is_none() {
        return Err(QueryError::underspecified(index_fields));
    }
    Ok(classification)
}

/// Classify for the dynamic table scan: every parameter, date bounds and
/// index fields included, is an equality filter.
pub fn classify_equality_only(params: &RawParameters) -> Classification {
    Classification {
        selector: None,
        range: None,
        filters: params
            .iter()
            .map(|p| EqualityFilter {
                name: p.name.clone(),
                value: p.value.clone(),
            })
            .collect(),
    }
}

/// Both bounds must be present and parse as timestamps; otherwise both are dropped.
fn range_bound(params: &RawParameters) -> Option<RangeBound> {
    let start = params.get(PARAM_START_DATE);
    let end = params.get(PARAM_END_DATE);

    match (start, end) {
        (Some(start), Some(end)) => {
            if parse_flexible_timestamp(start).is_some() && parse_flexible_timestamp(end).is_some()
            {
                Some(RangeBound {
                    start: start.to_string(),
                    end: end.to_string(),
                })
            } else {
                tracing::debug!(start, end, "Dropping malformed date range");
                None
            }
        }
        (None, None) => None,
        _ => {
            tracing::debug!("Dropping date range with a single bound");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_fields() -> Vec<String> {
        vec![
            "userId".to_string(),
            "applicationId".to_string(),
            "resourceId".to_string(),
        ]
    }

    fn params(pairs: &[(&str, &str)]) -> RawParameters {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_selects_index_field() {
        let c = classify_for_query(&params(&[("userId", "u1")]), &index_fields()).unwrap();
        assert_eq!(
            c.selector,
            Some(IndexSelector {
                field_name: "userId".to_string(),
                index_name: "userId-index".to_string(),
                value: "u1".to_string(),
            })
        );
        assert!(c.filters.is_empty());
        assert!(c.range.is_none());
    }

    #[test]
    fn test_selector_uses_configured_spelling() {
        let c = classify_for_query(&params(&[("USERID", "u1")]), &index_fields()).unwrap();
        let selector = c.selector.unwrap();
        assert_eq!(selector.field_name, "userId");
        assert_eq!(selector.index_name, "userId-index");
    }

    #[test]
    fn test_first_index_field_wins() {
        let c = classify_for_query(
            &params(&[("role", "admin"), ("resourceId", "r1"), ("userId", "u1")]),
            &index_fields(),
        )
        .unwrap();
        assert_eq!(c.selector.unwrap().field_name, "resourceId");
        assert_eq!(
            c.filters,
            vec![
                EqualityFilter {
                    name: "role".to_string(),
                    value: "admin".to_string()
                },
                EqualityFilter {
                    name: "userId".to_string(),
                    value: "u1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_missing_selector_is_underspecified() {
        let err = classify_for_query(&params(&[("role", "admin")]), &index_fields()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Must include one of: userId, applicationId, resourceId"
        );
    }

    #[test]
    fn test_blank_index_field_is_underspecified() {
        let err = classify_for_query(&params(&[("userId", "   ")]), &index_fields()).unwrap_err();
        assert!(matches!(err, QueryError::Underspecified { .. }));
    }

    #[test]
    fn test_range_requires_both_bounds() {
        let c = classify(
            &params(&[
                ("userId", "u1"),
                ("startDate", "2024-01-01T00:00:00Z"),
                ("endDate", "2024-01-02T00:00:00Z"),
            ]),
            &index_fields(),
        );
        assert_eq!(
            c.range,
            Some(RangeBound {
                start: "2024-01-01T00:00:00Z".to_string(),
                end: "2024-01-02T00:00:00Z".to_string(),
            })
        );
        assert!(c.filters.is_empty());

        let c = classify(
            &params(&[("userId", "u1"), ("startDate", "2024-01-01")]),
            &index_fields(),
        );
        assert!(c.range.is_none());
        assert!(c.filters.is_empty());
    }

    #[test]
    fn test_malformed_bound_drops_both() {
        let c = classify(
            &params(&[
                ("userId", "u1"),
                ("startDate", "yesterday"),
                ("endDate", "2024-01-02"),
            ]),
            &index_fields(),
        );
        assert!(c.range.is_none());
        assert!(c.filters.is_empty());
    }

    #[test]
    fn test_range_recognized_anywhere() {
        let c = classify(
            &params(&[
                ("ENDDATE", "2024-01-02"),
                ("role", "admin"),
                ("startdate", "2024-01-01"),
                ("applicationId", "app"),
            ]),
            &index_fields(),
        );
        assert!(c.range.is_some());
        assert_eq!(c.selector.unwrap().field_name, "applicationId");
        assert_eq!(c.filters.len(), 1);
    }

    #[test]
    fn test_equality_only_keeps_date_params() {
        let c = classify_equality_only(&params(&[
            ("userId", "u1"),
            ("startDate", "2024-01-01"),
            ("endDate", "2024-01-02"),
        ]));
        assert!(c.selector.is_none());
        assert!(c.range.is_none());
        let names: Vec<&str> = c.filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["userId", "startDate", "endDate"]);
    }

    #[test]
    fn test_without_index_fields_everything_filters() {
        let c = classify(&params(&[("userId", "u1"), ("role", "admin")]), &[]);
        assert!(c.selector.is_none());
        assert_eq!(c.filters.len(), 2);
    }
}
