use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::query::QueryError as SdkQueryError;
use aws_sdk_dynamodb::operation::scan::ScanError as SdkScanError;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;

use super::{AuditStore, StorePage, StoreRequest};
use crate::data::error::StoreError;
use crate::domain::query::{AttrValue, Item};

/// DynamoDB rejects a query on a missing index with a validation error
/// rather than ResourceNotFound
const MISSING_INDEX_MESSAGE: &str = "does not have the specified index";

#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    pub async fn new(region: Option<String>, endpoint: Option<String>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(aws_sdk_dynamodb::config::Region::new(region));
        }
        let config = config_loader.load().await;

        // Custom endpoint for DynamoDB Local / LocalStack
        let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config);
        if let Some(endpoint_url) = &endpoint {
            dynamo_config = dynamo_config.endpoint_url(endpoint_url);
        }
        let client = Client::from_conf(dynamo_config.build());

        tracing::debug!(endpoint = ?endpoint, "DynamoDB store initialized");
        Self { client }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditStore for DynamoStore {
    async fn query(&self, request: &StoreRequest) -> Result<StorePage, StoreError> {
        let result = self
            .client
            .query()
            .table_name(&request.table_name)
            .set_index_name(request.index_name.clone())
            .set_key_condition_expression(request.key_condition.clone())
            .set_filter_expression(request.filter.clone())
            .set_projection_expression(request.projection.clone())
            .set_expression_attribute_names(names_to_sdk(request))
            .set_expression_attribute_values(values_to_sdk(request))
            .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(item_to_sdk))
            .set_limit(request.limit.map(|l| l as i32))
            .set_consistent_read(request.consistent_read.then_some(true))
            .send()
            .await;

        let output = result.map_err(|e| {
            map_sdk_error("query", request, e, SdkQueryError::is_resource_not_found_exception)
        })?;
        Ok(page_from_sdk(output.items(), output.last_evaluated_key()))
    }

    async fn scan(&self, request: &StoreRequest) -> Result<StorePage, StoreError> {
        let result = self
            .client
            .scan()
            .table_name(&request.table_name)
            .set_index_name(request.index_name.clone())
            .set_filter_expression(request.filter.clone())
            .set_projection_expression(request.projection.clone())
            .set_expression_attribute_names(names_to_sdk(request))
            .set_expression_attribute_values(values_to_sdk(request))
            .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(item_to_sdk))
            .set_limit(request.limit.map(|l| l as i32))
            .set_consistent_read(request.consistent_read.then_some(true))
            .send()
            .await;

        let output = result.map_err(|e| {
            map_sdk_error("scan", request, e, SdkScanError::is_resource_not_found_exception)
        })?;
        Ok(page_from_sdk(output.items(), output.last_evaluated_key()))
    }

    fn name(&self) -> &'static str {
        "dynamodb"
    }
}

/// Missing tables and indexes become `NotFound`; everything else is a backend error
fn map_sdk_error<E, R>(
    operation: &'static str,
    request: &StoreRequest,
    err: SdkError<E, R>,
    is_resource_not_found: fn(&E) -> bool,
) -> StoreError
where
    E: ProvideErrorMetadata,
    SdkError<E, R>: std::fmt::Display,
{
    let is_absent = err.as_service_error().is_some_and(|e| {
        is_resource_not_found(e) || e.message().is_some_and(|m| m.contains(MISSING_INDEX_MESSAGE))
    });
    if is_absent {
        return StoreError::NotFound(target_name(request));
    }
    StoreError::backend(operation, err.to_string())
}

fn target_name(request: &StoreRequest) -> String {
    match &request.index_name {
        Some(index) => format!("{}/{}", request.table_name, index),
        None => request.table_name.clone(),
    }
}

// DynamoDB rejects empty attribute maps, so absent is sent instead
fn names_to_sdk(request: &StoreRequest) -> Option<HashMap<String, String>> {
    (!request.name_aliases.is_empty()).then(|| {
        request
            .name_aliases
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    })
}

fn values_to_sdk(request: &StoreRequest) -> Option<HashMap<String, AttributeValue>> {
    (!request.value_aliases.is_empty()).then(|| {
        request
            .value_aliases
            .iter()
            .map(|(k, v)| (k.clone(), to_sdk(v)))
            .collect()
    })
}

fn page_from_sdk(
    items: &[HashMap<String, AttributeValue>],
    last_evaluated_key: Option<&HashMap<String, AttributeValue>>,
) -> StorePage {
    StorePage {
        items: items.iter().map(item_from_sdk).collect(),
        last_evaluated_key: last_evaluated_key
            .map(item_from_sdk)
            .filter(|key| !key.is_empty()),
    }
}

fn item_to_sdk(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter().map(|(k, v)| (k.clone(), to_sdk(v))).collect()
}

fn item_from_sdk(item: &HashMap<String, AttributeValue>) -> Item {
    item.iter().map(|(k, v)| (k.clone(), from_sdk(v))).collect()
}

fn to_sdk(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::S(s) => AttributeValue::S(s.clone()),
        AttrValue::N(n) => AttributeValue::N(n.clone()),
        AttrValue::B(b) => AttributeValue::B(Blob::new(b.clone())),
        AttrValue::Bool(b) => AttributeValue::Bool(*b),
        AttrValue::M(m) => {
            AttributeValue::M(m.iter().map(|(k, v)| (k.clone(), to_sdk(v))).collect())
        }
        AttrValue::L(l) => AttributeValue::L(l.iter().map(to_sdk).collect()),
        AttrValue::Ss(v) => AttributeValue::Ss(v.clone()),
        AttrValue::Ns(v) => AttributeValue::Ns(v.clone()),
        AttrValue::Bs(v) => AttributeValue::Bs(v.iter().map(|b| Blob::new(b.clone())).collect()),
        AttrValue::Null(b) => AttributeValue::Null(*b),
        // Unrecognized values have no wire form; send the raw text
        AttrValue::Other(raw) => AttributeValue::S(raw.clone()),
    }
}

fn from_sdk(value: &AttributeValue) -> AttrValue {
    match value {
        AttributeValue::S(s) => AttrValue::S(s.clone()),
        AttributeValue::N(n) => AttrValue::N(n.clone()),
        AttributeValue::B(b) => AttrValue::B(b.as_ref().to_vec()),
        AttributeValue::Bool(b) => AttrValue::Bool(*b),
        AttributeValue::M(m) => {
            AttrValue::M(m.iter().map(|(k, v)| (k.clone(), from_sdk(v))).collect())
        }
        AttributeValue::L(l) => AttrValue::L(l.iter().map(from_sdk).collect()),
        AttributeValue::Ss(v) => AttrValue::Ss(v.clone()),
        AttributeValue::Ns(v) => AttrValue::Ns(v.clone()),
        AttributeValue::Bs(v) => AttrValue::Bs(v.iter().map(|b| b.as_ref().to_vec()).collect()),
        AttributeValue::Null(b) => AttrValue::Null(*b),
        other => AttrValue::Other(format!("{:?}", other)),
    }
}
