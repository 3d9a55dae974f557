//! Storage client capability
//!
//! [`DynamoDbApi`] lists the physical operations the wrapper drives, one
//! typed method each. It is implemented for the SDK [`Client`]; tests and
//! alternative transports implement it directly.

use aws_sdk_dynamodb::Client;
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
use std::future::Future;

use crate::error::ServiceError;

/// Physical operations of the storage service
///
/// Every method performs exactly one request and reports failures as a
/// [`ServiceError`] whose code and status drive the retry decision. Table
/// names arrive already prefixed.
pub trait DynamoDbApi: Send + Sync {
    /// `GetItem`
    fn get_item(
        &self,
        input: GetItemInputBuilder,
    ) -> impl Future<Output = Result<GetItemOutput, ServiceError>> + Send;

    /// `PutItem`
    fn put_item(
        &self,
        input: PutItemInputBuilder,
    ) -> impl Future<Output = Result<PutItemOutput, ServiceError>> + Send;

    /// `UpdateItem`
    fn update_item(
        &self,
        input: UpdateItemInputBuilder,
    ) -> impl Future<Output = Result<UpdateItemOutput, ServiceError>> + Send;

    /// `DeleteItem`
    fn delete_item(
        &self,
        input: DeleteItemInputBuilder,
    ) -> impl Future<Output = Result<DeleteItemOutput, ServiceError>> + Send;

    /// `BatchGetItem`
    fn batch_get_item(
        &self,
        input: BatchGetItemInputBuilder,
    ) -> impl Future<Output = Result<BatchGetItemOutput, ServiceError>> + Send;

    /// `BatchWriteItem`
    fn batch_write_item(
        &self,
        input: BatchWriteItemInputBuilder,
    ) -> impl Future<Output = Result<BatchWriteItemOutput, ServiceError>> + Send;

    /// `Query`, a single page
    fn query(
        &self,
        input: QueryInputBuilder,
    ) -> impl Future<Output = Result<QueryOutput, ServiceError>> + Send;

    /// `Scan`, a single page
    fn scan(
        &self,
        input: ScanInputBuilder,
    ) -> impl Future<Output = Result<ScanOutput, ServiceError>> + Send;

    /// `CreateTable`
    fn create_table(
        &self,
        input: CreateTableInputBuilder,
    ) -> impl Future<Output = Result<CreateTableOutput, ServiceError>> + Send;

    /// `DescribeTable`
    fn describe_table(
        &self,
        input: DescribeTableInputBuilder,
    ) -> impl Future<Output = Result<DescribeTableOutput, ServiceError>> + Send;

    /// `UpdateTable`
    fn update_table(
        &self,
        input: UpdateTableInputBuilder,
    ) -> impl Future<Output = Result<UpdateTableOutput, ServiceError>> + Send;

    /// `DeleteTable`
    fn delete_table(
        &self,
        input: DeleteTableInputBuilder,
    ) -> impl Future<Output = Result<DeleteTableOutput, ServiceError>> + Send;
}

impl DynamoDbApi for Client {
    async fn get_item(&self, input: GetItemInputBuilder) -> Result<GetItemOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn put_item(&self, input: PutItemInputBuilder) -> Result<PutItemOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn update_item(
        &self,
        input: UpdateItemInputBuilder,
    ) -> Result<UpdateItemOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn delete_item(
        &self,
        input: DeleteItemInputBuilder,
    ) -> Result<DeleteItemOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn batch_get_item(
        &self,
        input: BatchGetItemInputBuilder,
    ) -> Result<BatchGetItemOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn batch_write_item(
        &self,
        input: BatchWriteItemInputBuilder,
    ) -> Result<BatchWriteItemOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn query(&self, input: QueryInputBuilder) -> Result<QueryOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn scan(&self, input: ScanInputBuilder) -> Result<ScanOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn create_table(
        &self,
        input: CreateTableInputBuilder,
    ) -> Result<CreateTableOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn describe_table(
        &self,
        input: DescribeTableInputBuilder,
    ) -> Result<DescribeTableOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn update_table(
        &self,
        input: UpdateTableInputBuilder,
    ) -> Result<UpdateTableOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }

    async fn delete_table(
        &self,
        input: DeleteTableInputBuilder,
    ) -> Result<DeleteTableOutput, ServiceError> {
        Ok(input.send_with(self).await?)
    }
}
