//! Test helpers and fixtures for wrapper integration tests
//!
//! This module provides a scripted in-memory storage client, fixtures and
//! helper functions used across all integration tests.
#![allow(dead_code)]

pub mod fixtures;

pub use dynamo_wrapper::{DynamoDbWrapper, Error, WrapperEvent, WrapperOptions};
pub use fixtures::*;

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
use aws_sdk_dynamodb::types::{
    AttributeValue, Capacity, ConsumedCapacity, ReturnConsumedCapacity,
};
use dynamo_wrapper::{DynamoDbApi, Item, ServiceError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

/// Scripted response of one physical call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Throttled, HTTP 400
    ProvisionedThroughputExceeded,
    /// Batch write applied the first request only
    SomeUnprocessedItems,
    /// Rejected, HTTP 400
    ValidationException,
    /// Server failure, HTTP 500
    InternalServerError,
}

/// One physical call seen by the mock
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub table_name: Option<String>,
    /// Number of write requests for batch writes
    pub request_count: usize,
    /// Continuation key sent by queries and scans
    pub exclusive_start_key: Option<Item>,
}

/// In-memory storage client with scripted failures
///
/// Calls are numbered from 1 across every method; `outcomes` maps a call
/// number to the response it gets. Unlisted calls succeed.
#[derive(Debug, Default)]
pub struct MockDynamoDb {
    calls: AtomicUsize,
    outcomes: HashMap<usize, Outcome>,
    recorded: Mutex<Vec<RecordedCall>>,
}

impl MockDynamoDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = (usize, Outcome)>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Every physical call so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.recorded.lock().unwrap().clone()
    }

    /// Number of physical calls of `method`
    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|call| call.method == method).count()
    }

    fn call(
        &self,
        method: &'static str,
        table_name: Option<String>,
        request_count: usize,
    ) -> Result<Option<Outcome>, ServiceError> {
        self.record(RecordedCall {
            method,
            table_name,
            request_count,
            exclusive_start_key: None,
        })
    }

    fn record(&self, call: RecordedCall) -> Result<Option<Outcome>, ServiceError> {
        let number = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.recorded.lock().unwrap().push(call);

        let outcome = self.outcomes.get(&number).copied();
        match outcome {
            Some(Outcome::ProvisionedThroughputExceeded) => Err(ServiceError::new(
                "ProvisionedThroughputExceededException",
                "throughput exceeded",
                Some(400),
            )),
            Some(Outcome::ValidationException) => Err(ServiceError::new(
                "ValidationException",
                "invalid request",
                Some(400),
            )),
            Some(Outcome::InternalServerError) => Err(ServiceError::new(
                "InternalServerError",
                "internal failure",
                Some(500),
            )),
            other => Ok(other),
        }
    }
}

/// Capacity record the mock reports for `units` applied requests
fn write_capacity(
    table_name: &str,
    units: usize,
    mode: Option<&ReturnConsumedCapacity>,
) -> Option<ConsumedCapacity> {
    let units = units as f64;
    match mode {
        Some(ReturnConsumedCapacity::Indexes) => Some(
            ConsumedCapacity::builder()
                .table_name(table_name)
                .capacity_units(6.0 * units)
                .table(Capacity::builder().capacity_units(units).build())
                .local_secondary_indexes(
                    "MyLocalIndex",
                    Capacity::builder().capacity_units(3.0 * units).build(),
                )
                .global_secondary_indexes(
                    "MyGlobalIndex",
                    Capacity::builder().capacity_units(2.0 * units).build(),
                )
                .build(),
        ),
        Some(ReturnConsumedCapacity::Total) => Some(
            ConsumedCapacity::builder()
                .table_name(table_name)
                .capacity_units(6.0 * units)
                .build(),
        ),
        _ => None,
    }
}

fn read_capacity(table_name: &str, mode: Option<&ReturnConsumedCapacity>) -> Option<ConsumedCapacity> {
    match mode {
        Some(ReturnConsumedCapacity::Indexes) => Some(
            ConsumedCapacity::builder()
                .table_name(table_name)
                .capacity_units(7.0)
                .table(Capacity::builder().capacity_units(2.0).build())
                .local_secondary_indexes("MyLocalIndex", Capacity::builder().capacity_units(4.0).build())
                .global_secondary_indexes("MyGlobalIndex", Capacity::builder().capacity_units(1.0).build())
                .build(),
        ),
        Some(ReturnConsumedCapacity::Total) => Some(
            ConsumedCapacity::builder()
                .table_name(table_name)
                .capacity_units(7.0)
                .build(),
        ),
        _ => None,
    }
}

/// Number of pages every query and scan of the mock spans
pub const PAGE_COUNT: u32 = 3;

/// Continuation key returned after page `page`
pub fn page_key(page: u32) -> Item {
    Item::from([("Page".to_string(), AttributeValue::N(page.to_string()))])
}

/// Item `index` of page `page`, keyed `page * 10 + index`
pub fn page_item(page: u32, index: u32) -> Item {
    Item::from([(
        "MyPartitionKey".to_string(),
        AttributeValue::N((page * 10 + index).to_string()),
    )])
}

/// The page following `exclusive_start_key`, with `limit` items and a
/// continuation key unless it is the last one
fn page(exclusive_start_key: Option<&Item>, limit: Option<i32>) -> (Vec<Item>, Option<Item>) {
    let page = exclusive_start_key
        .and_then(|key| key.get("Page"))
        .and_then(|value| value.as_n().ok())
        .and_then(|n| n.parse::<u32>().ok())
        .map_or(1, |previous| previous + 1);

    let limit = limit.unwrap_or(0).max(0) as u32;
    let items = (0..limit).map(|index| page_item(page, index)).collect();
    let last_evaluated_key = (page < PAGE_COUNT).then(|| page_key(page));
    (items, last_evaluated_key)
}

impl DynamoDbApi for MockDynamoDb {
    async fn get_item(&self, input: GetItemInputBuilder) -> Result<GetItemOutput, ServiceError> {
        self.call("GetItem", input.get_table_name().clone(), 0)?;
        Ok(GetItemOutput::builder().build())
    }

    async fn put_item(&self, input: PutItemInputBuilder) -> Result<PutItemOutput, ServiceError> {
        let table_name = input.get_table_name().clone().unwrap_or_default();
        self.call("PutItem", Some(table_name.clone()), 0)?;

        Ok(PutItemOutput::builder()
            .consumed_capacity(
                ConsumedCapacity::builder()
                    .table_name(table_name)
                    .capacity_units(1.0)
                    .build(),
            )
            .build())
    }

    async fn update_item(
        &self,
        input: UpdateItemInputBuilder,
    ) -> Result<UpdateItemOutput, ServiceError> {
        self.call("UpdateItem", input.get_table_name().clone(), 0)?;
        Ok(UpdateItemOutput::builder().build())
    }

    async fn delete_item(
        &self,
        input: DeleteItemInputBuilder,
    ) -> Result<DeleteItemOutput, ServiceError> {
        self.call("DeleteItem", input.get_table_name().clone(), 0)?;
        Ok(DeleteItemOutput::builder().build())
    }

    async fn batch_get_item(
        &self,
        input: BatchGetItemInputBuilder,
    ) -> Result<BatchGetItemOutput, ServiceError> {
        let table_name = input
            .get_request_items()
            .as_ref()
            .and_then(|items| items.keys().min().cloned());
        self.call("BatchGetItem", table_name, 0)?;
        Ok(BatchGetItemOutput::builder().build())
    }

    async fn batch_write_item(
        &self,
        input: BatchWriteItemInputBuilder,
    ) -> Result<BatchWriteItemOutput, ServiceError> {
        let mut request_items = input.get_request_items().clone().unwrap_or_default();
        let table_name = request_items.keys().min().cloned().unwrap_or_default();
        let request_count = request_items.get(&table_name).map_or(0, Vec::len);

        let outcome = self.call("BatchWriteItem", Some(table_name.clone()), request_count)?;

        let mut output = BatchWriteItemOutput::builder();
        let applied = if outcome == Some(Outcome::SomeUnprocessedItems) {
            if let Some(requests) = request_items.get_mut(&table_name) {
                requests.remove(0);
            }
            output = output.set_unprocessed_items(Some(request_items));
            1
        } else {
            request_count
        };

        if let Some(capacity) = write_capacity(
            &table_name,
            applied,
            input.get_return_consumed_capacity().as_ref(),
        ) {
            output = output.consumed_capacity(capacity);
        }

        Ok(output.build())
    }

    async fn query(&self, input: QueryInputBuilder) -> Result<QueryOutput, ServiceError> {
        let table_name = input.get_table_name().clone().unwrap_or_default();
        self.record(RecordedCall {
            method: "Query",
            table_name: Some(table_name.clone()),
            request_count: 0,
            exclusive_start_key: input.get_exclusive_start_key().clone(),
        })?;
        let (items, last_evaluated_key) =
            page(input.get_exclusive_start_key().as_ref(), *input.get_limit());

        Ok(QueryOutput::builder()
            .count(items.len() as i32)
            .scanned_count(items.len() as i32)
            .set_items(Some(items))
            .set_last_evaluated_key(last_evaluated_key)
            .set_consumed_capacity(read_capacity(
                &table_name,
                input.get_return_consumed_capacity().as_ref(),
            ))
            .build())
    }

    async fn scan(&self, input: ScanInputBuilder) -> Result<ScanOutput, ServiceError> {
        let table_name = input.get_table_name().clone().unwrap_or_default();
        self.record(RecordedCall {
            method: "Scan",
            table_name: Some(table_name.clone()),
            request_count: 0,
            exclusive_start_key: input.get_exclusive_start_key().clone(),
        })?;
        let (items, last_evaluated_key) =
            page(input.get_exclusive_start_key().as_ref(), *input.get_limit());

        Ok(ScanOutput::builder()
            .count(items.len() as i32)
            .scanned_count(items.len() as i32)
            .set_items(Some(items))
            .set_last_evaluated_key(last_evaluated_key)
            .set_consumed_capacity(read_capacity(
                &table_name,
                input.get_return_consumed_capacity().as_ref(),
            ))
            .build())
    }

    async fn create_table(
        &self,
        input: CreateTableInputBuilder,
    ) -> Result<CreateTableOutput, ServiceError> {
        self.call("CreateTable", input.get_table_name().clone(), 0)?;
        Ok(CreateTableOutput::builder().build())
    }

    async fn describe_table(
        &self,
        input: DescribeTableInputBuilder,
    ) -> Result<DescribeTableOutput, ServiceError> {
        self.call("DescribeTable", input.get_table_name().clone(), 0)?;
        Ok(DescribeTableOutput::builder().build())
    }

    async fn update_table(
        &self,
        input: UpdateTableInputBuilder,
    ) -> Result<UpdateTableOutput, ServiceError> {
        self.call("UpdateTable", input.get_table_name().clone(), 0)?;
        Ok(UpdateTableOutput::builder().build())
    }

    async fn delete_table(
        &self,
        input: DeleteTableInputBuilder,
    ) -> Result<DeleteTableOutput, ServiceError> {
        self.call("DeleteTable", input.get_table_name().clone(), 0)?;
        Ok(DeleteTableOutput::builder().build())
    }
}

/// Options used by most tests: `local-` prefix, no delays, at most 2 retries
pub fn test_options() -> WrapperOptions {
    WrapperOptions::default()
        .with_table_name_prefix("local-")
        .with_group_delay(Duration::ZERO)
        .with_max_retries(2)
        .with_retry_base(Duration::ZERO)
}

/// Wrapper around a mock scripted with `outcomes`
pub fn setup_wrapper(
    outcomes: impl IntoIterator<Item = (usize, Outcome)>,
) -> DynamoDbWrapper<MockDynamoDb> {
    DynamoDbWrapper::new(MockDynamoDb::with_outcomes(outcomes), test_options())
}

/// Events received so far
pub fn drain_events(receiver: &mut broadcast::Receiver<WrapperEvent>) -> Vec<WrapperEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
