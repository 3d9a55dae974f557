//! Per-request behavior of the physical operations
//!
//! [`Operation`] ties each SDK input builder to its [`Method`], its client
//! call, and the table name rewriting and capacity extraction of its output.
//! The retry engine is generic over it.

use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemOutput;
use aws_sdk_dynamodb::operation::batch_get_item::builders::BatchGetItemInputBuilder;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemOutput;
use aws_sdk_dynamodb::operation::batch_write_item::builders::BatchWriteItemInputBuilder;
use aws_sdk_dynamodb::operation::create_table::CreateTableOutput;
use aws_sdk_dynamodb::operation::create_table::builders::CreateTableInputBuilder;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemOutput;
use aws_sdk_dynamodb::operation::delete_item::builders::DeleteItemInputBuilder;
use aws_sdk_dynamodb::operation::delete_table::DeleteTableOutput;
use aws_sdk_dynamodb::operation::delete_table::builders::DeleteTableInputBuilder;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableOutput;
use aws_sdk_dynamodb::operation::describe_table::builders::DescribeTableInputBuilder;
use aws_sdk_dynamodb::operation::get_item::GetItemOutput;
use aws_sdk_dynamodb::operation::get_item::builders::GetItemInputBuilder;
use aws_sdk_dynamodb::operation::put_item::PutItemOutput;
use aws_sdk_dynamodb::operation::put_item::builders::PutItemInputBuilder;
use aws_sdk_dynamodb::operation::query::QueryOutput;
use aws_sdk_dynamodb::operation::query::builders::QueryInputBuilder;
use aws_sdk_dynamodb::operation::scan::ScanOutput;
use aws_sdk_dynamodb::operation::scan::builders::ScanInputBuilder;
use aws_sdk_dynamodb::operation::update_item::UpdateItemOutput;
use aws_sdk_dynamodb::operation::update_item::builders::UpdateItemInputBuilder;
use aws_sdk_dynamodb::operation::update_table::UpdateTableOutput;
use aws_sdk_dynamodb::operation::update_table::builders::UpdateTableInputBuilder;
use aws_sdk_dynamodb::types::{ConsumedCapacity, WriteRequest};
use std::collections::HashMap;
use std::future::Future;

use crate::client::DynamoDbApi;
use crate::error::ServiceError;
use crate::events::Method;
use crate::prefix::TableNamePrefix;
use crate::Error;

pub(crate) trait Operation: Clone + Send + Sync + Sized {
    type Output: Send;

    const METHOD: Method;

    /// Table the request targets; the lowest name for multi-table requests
    fn target_table(&self) -> Option<String>;

    fn add_table_prefix(self, prefix: &TableNamePrefix) -> Self;

    fn remove_table_prefix(output: Self::Output, prefix: &TableNamePrefix) -> Self::Output;

    fn send<C: DynamoDbApi>(
        self,
        client: &C,
    ) -> impl Future<Output = Result<Self::Output, ServiceError>> + Send;

    fn capacity_of(output: &Self::Output) -> Vec<ConsumedCapacity>;

    /// The follow-up request when a successful response left part of the work undone
    fn unprocessed(&self, _output: &Self::Output) -> Option<Self> {
        None
    }

    /// Result once retries are exhausted
    fn exhausted(self, last_error: Option<ServiceError>) -> Result<Self::Output, Error> {
        Err(last_error.map_or(Error::ProvisionedThroughputExceeded, Error::Service))
    }
}

macro_rules! impl_table_operation {
    ($builder:ty => $output:ty, $method:ident, $call:ident, consumed_capacity) => {
        impl Operation for $builder {
            type Output = $output;

            const METHOD: Method = Method::$method;

            fn target_table(&self) -> Option<String> {
                self.get_table_name().clone()
            }

            fn add_table_prefix(self, prefix: &TableNamePrefix) -> Self {
                let table_name = self.get_table_name().as_deref().map(|name| prefix.add(name));
                self.set_table_name(table_name)
            }

            fn remove_table_prefix(mut output: Self::Output, prefix: &TableNamePrefix) -> Self::Output {
                output.consumed_capacity = output
                    .consumed_capacity
                    .map(|capacity| prefix.remove_from_capacity(capacity));
                output
            }

            fn send<C: DynamoDbApi>(
                self,
                client: &C,
            ) -> impl Future<Output = Result<Self::Output, ServiceError>> + Send {
                client.$call(self)
            }

            fn capacity_of(output: &Self::Output) -> Vec<ConsumedCapacity> {
                output.consumed_capacity.iter().cloned().collect()
            }
        }
    };
    ($builder:ty => $output:ty, $method:ident, $call:ident) => {
        impl Operation for $builder {
            type Output = $output;

            const METHOD: Method = Method::$method;

            fn target_table(&self) -> Option<String> {
                self.get_table_name().clone()
            }

            fn add_table_prefix(self, prefix: &TableNamePrefix) -> Self {
                let table_name = self.get_table_name().as_deref().map(|name| prefix.add(name));
                self.set_table_name(table_name)
            }

            fn remove_table_prefix(output: Self::Output, _prefix: &TableNamePrefix) -> Self::Output {
                output
            }

            fn send<C: DynamoDbApi>(
                self,
                client: &C,
            ) -> impl Future<Output = Result<Self::Output, ServiceError>> + Send {
                client.$call(self)
            }

            fn capacity_of(_output: &Self::Output) -> Vec<ConsumedCapacity> {
                Vec::new()
            }
        }
    };
}

impl_table_operation!(GetItemInputBuilder => GetItemOutput, GetItem, get_item, consumed_capacity);
impl_table_operation!(PutItemInputBuilder => PutItemOutput, PutItem, put_item, consumed_capacity);
impl_table_operation!(UpdateItemInputBuilder => UpdateItemOutput, UpdateItem, update_item, consumed_capacity);
impl_table_operation!(DeleteItemInputBuilder => DeleteItemOutput, DeleteItem, delete_item, consumed_capacity);
impl_table_operation!(QueryInputBuilder => QueryOutput, Query, query, consumed_capacity);
impl_table_operation!(ScanInputBuilder => ScanOutput, Scan, scan, consumed_capacity);
impl_table_operation!(CreateTableInputBuilder => CreateTableOutput, CreateTable, create_table);
impl_table_operation!(DescribeTableInputBuilder => DescribeTableOutput, DescribeTable, describe_table);
impl_table_operation!(UpdateTableInputBuilder => UpdateTableOutput, UpdateTable, update_table);
impl_table_operation!(DeleteTableInputBuilder => DeleteTableOutput, DeleteTable, delete_table);

fn first_table_name<V>(request_items: &Option<HashMap<String, V>>) -> Option<String> {
    request_items.as_ref()?.keys().min().cloned()
}

fn remove_prefix_from_capacities(
    capacities: Option<Vec<ConsumedCapacity>>,
    prefix: &TableNamePrefix,
) -> Option<Vec<ConsumedCapacity>> {
    capacities.map(|capacities| {
        capacities
            .into_iter()
            .map(|capacity| prefix.remove_from_capacity(capacity))
            .collect()
    })
}

impl Operation for BatchGetItemInputBuilder {
    type Output = BatchGetItemOutput;

    const METHOD: Method = Method::BatchGetItem;

    fn target_table(&self) -> Option<String> {
        first_table_name(self.get_request_items())
    }

    fn add_table_prefix(self, prefix: &TableNamePrefix) -> Self {
        let request_items = self.get_request_items().clone().map(|items| prefix.add_to_keys(items));
        self.set_request_items(request_items)
    }

    fn remove_table_prefix(mut output: Self::Output, prefix: &TableNamePrefix) -> Self::Output {
        output.responses = output.responses.map(|items| prefix.remove_from_keys(items));
        output.unprocessed_keys = output.unprocessed_keys.map(|keys| prefix.remove_from_keys(keys));
        output.consumed_capacity = remove_prefix_from_capacities(output.consumed_capacity, prefix);
        output
    }

    fn send<C: DynamoDbApi>(
        self,
        client: &C,
    ) -> impl Future<Output = Result<Self::Output, ServiceError>> + Send {
        client.batch_get_item(self)
    }

    fn capacity_of(output: &Self::Output) -> Vec<ConsumedCapacity> {
        output.consumed_capacity.clone().unwrap_or_default()
    }
}

/// Write requests left unprocessed, without the empty per-table entries
pub(crate) fn non_empty_unprocessed(
    unprocessed_items: Option<&HashMap<String, Vec<WriteRequest>>>,
) -> Option<HashMap<String, Vec<WriteRequest>>> {
    let items: HashMap<String, Vec<WriteRequest>> = unprocessed_items?
        .iter()
        .filter(|(_, requests)| !requests.is_empty())
        .map(|(table_name, requests)| (table_name.clone(), requests.clone()))
        .collect();

    if items.is_empty() { None } else { Some(items) }
}

impl Operation for BatchWriteItemInputBuilder {
    type Output = BatchWriteItemOutput;

    const METHOD: Method = Method::BatchWriteItem;

    fn target_table(&self) -> Option<String> {
        first_table_name(self.get_request_items())
    }

    fn add_table_prefix(self, prefix: &TableNamePrefix) -> Self {
        let request_items = self.get_request_items().clone().map(|items| prefix.add_to_keys(items));
        self.set_request_items(request_items)
    }

    fn remove_table_prefix(mut output: Self::Output, prefix: &TableNamePrefix) -> Self::Output {
        output.unprocessed_items = output.unprocessed_items.map(|items| prefix.remove_from_keys(items));
        output.item_collection_metrics = output
            .item_collection_metrics
            .map(|metrics| prefix.remove_from_keys(metrics));
        output.consumed_capacity = remove_prefix_from_capacities(output.consumed_capacity, prefix);
        output
    }

    fn send<C: DynamoDbApi>(
        self,
        client: &C,
    ) -> impl Future<Output = Result<Self::Output, ServiceError>> + Send {
        client.batch_write_item(self)
    }

    fn capacity_of(output: &Self::Output) -> Vec<ConsumedCapacity> {
        output.consumed_capacity.clone().unwrap_or_default()
    }

    fn unprocessed(&self, output: &Self::Output) -> Option<Self> {
        let unprocessed = non_empty_unprocessed(output.unprocessed_items.as_ref())?;
        Some(self.clone().set_request_items(Some(unprocessed)))
    }

    /// Exhaustion is not an error: the requests of the last attempt are
    /// handed back as unprocessed.
    fn exhausted(self, _last_error: Option<ServiceError>) -> Result<Self::Output, Error> {
        Ok(BatchWriteItemOutput::builder()
            .set_unprocessed_items(self.get_request_items().clone())
            .build())
    }
}
