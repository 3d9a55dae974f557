//! Request fixtures shared by the integration tests

use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemInput;
use aws_sdk_dynamodb::operation::batch_write_item::builders::BatchWriteItemInputBuilder;
use aws_sdk_dynamodb::operation::put_item::PutItemInput;
use aws_sdk_dynamodb::operation::put_item::builders::PutItemInputBuilder;
use aws_sdk_dynamodb::operation::query::QueryInput;
use aws_sdk_dynamodb::operation::query::builders::QueryInputBuilder;
use aws_sdk_dynamodb::operation::scan::ScanInput;
use aws_sdk_dynamodb::operation::scan::builders::ScanInputBuilder;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnConsumedCapacity, WriteRequest};
use dynamo_wrapper::put_request;
use serde::Serialize;

/// Item of the `Test` and `AnotherTest` tables
#[derive(Serialize, Debug, Clone)]
pub struct TestItem {
    #[serde(rename = "MyPartitionKey")]
    pub my_partition_key: u32,
}

/// `count` put requests with partition keys `0..count`
pub fn put_requests(count: u32) -> Vec<WriteRequest> {
    (0..count)
        .map(|my_partition_key| put_request(&TestItem { my_partition_key }).unwrap())
        .collect()
}

/// 10 puts to `Test`, plus 4 puts to `AnotherTest` when `multiple_tables`
pub fn batch_write_input(
    multiple_tables: bool,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
) -> BatchWriteItemInputBuilder {
    let mut input = BatchWriteItemInput::builder()
        .request_items("Test", put_requests(10))
        .set_return_consumed_capacity(return_consumed_capacity);

    if multiple_tables {
        input = input.request_items("AnotherTest", put_requests(4));
    }

    input
}

pub fn put_item_input(return_consumed_capacity: Option<ReturnConsumedCapacity>) -> PutItemInputBuilder {
    PutItemInput::builder()
        .table_name("Test")
        .item("MyPartitionKey", AttributeValue::N("1".to_string()))
        .set_return_consumed_capacity(return_consumed_capacity)
}

/// Query of `Test` with a page size of 2
pub fn query_input(return_consumed_capacity: Option<ReturnConsumedCapacity>) -> QueryInputBuilder {
    QueryInput::builder()
        .table_name("Test")
        .key_condition_expression("MyPartitionKey = :pk")
        .expression_attribute_values(":pk", AttributeValue::N("1".to_string()))
        .limit(2)
        .set_return_consumed_capacity(return_consumed_capacity)
}

/// Scan of `Test` with a page size of 2
pub fn scan_input(return_consumed_capacity: Option<ReturnConsumedCapacity>) -> ScanInputBuilder {
    ScanInput::builder()
        .table_name("Test")
        .limit(2)
        .set_return_consumed_capacity(return_consumed_capacity)
}
