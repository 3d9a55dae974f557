//! The request orchestrator
//!
//! [`DynamoDbWrapper`] exposes the storage operations with the service
//! limits absorbed: transient failures are retried, query and scan return
//! every page, and batch writes accept any number of requests.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemOutput;
use aws_sdk_dynamodb::operation::batch_get_item::builders::BatchGetItemInputBuilder;
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
use aws_sdk_dynamodb::operation::update_item::UpdateItemOutput;
use aws_sdk_dynamodb::operation::update_item::builders::UpdateItemInputBuilder;
use aws_sdk_dynamodb::operation::update_table::UpdateTableOutput;
use aws_sdk_dynamodb::operation::update_table::builders::UpdateTableInputBuilder;
use tokio::sync::broadcast;

use crate::client::DynamoDbApi;
use crate::events::{EventSender, WrapperEvent};
use crate::operation::Operation;
use crate::options::{OperationConfig, WrapperOptions};
use crate::prefix::TableNamePrefix;
use crate::retry::{RetryEngine, RetryPolicy};
use crate::{Error, dynamodb_client};

mod batch;
mod read;

/// Retrying, paginating and batching front of a storage client
///
/// Every method takes the SDK input builder of the matching operation with
/// logical (unprefixed) table names.
///
/// # Example
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::operation::scan::ScanInput;
/// use dynamo_wrapper::{DynamoDbWrapper, Error, WrapperOptions};
///
/// # async fn example() -> Result<(), Error> {
/// let wrapper = DynamoDbWrapper::from_env(
///     WrapperOptions::default().with_table_name_prefix("dev-"),
/// )
/// .await;
///
/// // every page of dev-users
/// let output = wrapper.scan(ScanInput::builder().table_name("users")).await?;
/// println!("{} items", output.count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DynamoDbWrapper<C = Client> {
    client: C,
    options: WrapperOptions,
    prefix: TableNamePrefix,
    events: EventSender,
}

impl DynamoDbWrapper<Client> {
    /// Wrap the shared default client, see [`dynamodb_client`]
    pub async fn from_env(options: WrapperOptions) -> Self {
        Self::new(dynamodb_client().await.clone(), options)
    }
}

impl<C: DynamoDbApi> DynamoDbWrapper<C> {
    /// Wrap a client
    pub fn new(client: C, options: WrapperOptions) -> Self {
        let prefix = TableNamePrefix::new(options.table_name_prefix.clone());
        Self {
            client,
            options,
            prefix,
            events: EventSender::new(),
        }
    }

    /// The wrapped client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Instance options
    pub fn options(&self) -> &WrapperOptions {
        &self.options
    }

    /// Prefix applied to table names
    pub fn table_name_prefix(&self) -> &str {
        self.prefix.as_str()
    }

    /// Receive the events of every following operation
    pub fn subscribe(&self) -> broadcast::Receiver<WrapperEvent> {
        self.events.subscribe()
    }

    pub(crate) fn engine<'a>(&'a self, policy: &'a RetryPolicy) -> RetryEngine<'a, C> {
        RetryEngine {
            client: &self.client,
            prefix: &self.prefix,
            events: &self.events,
            policy,
        }
    }

    async fn pass_through<O: Operation>(&self, input: O) -> Result<O::Output, Error> {
        let config = OperationConfig::for_instance(&self.options);
        let completed = self.engine(&config.retry).execute(input).await?;
        Ok(completed.output)
    }

    /// `GetItem` with retries
    pub async fn get_item(&self, input: GetItemInputBuilder) -> Result<GetItemOutput, Error> {
        self.pass_through(input).await
    }

    /// `PutItem` with retries
    pub async fn put_item(&self, input: PutItemInputBuilder) -> Result<PutItemOutput, Error> {
        self.pass_through(input).await
    }

    /// `UpdateItem` with retries
    pub async fn update_item(
        &self,
        input: UpdateItemInputBuilder,
    ) -> Result<UpdateItemOutput, Error> {
        self.pass_through(input).await
    }

    /// `DeleteItem` with retries
    pub async fn delete_item(
        &self,
        input: DeleteItemInputBuilder,
    ) -> Result<DeleteItemOutput, Error> {
        self.pass_through(input).await
    }

    /// `BatchGetItem` with retries
    ///
    /// Unprocessed keys are returned to the caller, not retried.
    pub async fn batch_get_item(
        &self,
        input: BatchGetItemInputBuilder,
    ) -> Result<BatchGetItemOutput, Error> {
        self.pass_through(input).await
    }

    /// `CreateTable` with retries
    pub async fn create_table(
        &self,
        input: CreateTableInputBuilder,
    ) -> Result<CreateTableOutput, Error> {
        self.pass_through(input).await
    }

    /// `DescribeTable` with retries
    pub async fn describe_table(
        &self,
        input: DescribeTableInputBuilder,
    ) -> Result<DescribeTableOutput, Error> {
        self.pass_through(input).await
    }

    /// `UpdateTable` with retries
    pub async fn update_table(
        &self,
        input: UpdateTableInputBuilder,
    ) -> Result<UpdateTableOutput, Error> {
        self.pass_through(input).await
    }

    /// `DeleteTable` with retries
    pub async fn delete_table(
        &self,
        input: DeleteTableInputBuilder,
    ) -> Result<DeleteTableOutput, Error> {
        self.pass_through(input).await
    }
}
