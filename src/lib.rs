//! # DynamoDB Request Orchestration
//!
//! A client-side layer in front of the DynamoDB data plane that absorbs the
//! per-call limits of the service:
//! - Retry with exponential backoff on throttling, limit and 5xx failures
//! - Query and scan returning every page in one call
//! - Batch writes of any size, split into groups of at most 25 requests by
//!   item count or by estimated write capacity
//! - Multi-table batch writes processed concurrently per table
//! - Consumed capacity aggregated across all physical calls
//! - Table name prefixing for per-environment tables
//!
//! ## Features
//!
//! - **SDK-native**: takes and returns the `aws-sdk-dynamodb` input and output types
//! - **Async-first**: built on `tokio`; dropping a returned future cancels the operation
//! - **Observable**: retry, capacity and batch progress events on a broadcast channel,
//!   plus `tracing` logs
//! - **Testable**: the storage client is the [`DynamoDbApi`] trait
//!
//! ## Configuration
//!
//! [`DynamoDbWrapper::from_env`] uses the global client, created on first use
//! from the environment with SDK retries disabled. To use another region or
//! endpoint, load a config with the re-exported [`defaults`] loader and pass
//! it to [`init`] before the first call:
//!
//! ```rust,no_run
//! # async fn example() {
//! let config = dynamo_wrapper::defaults(dynamo_wrapper::BehaviorVersion::latest())
//!     .region(dynamo_wrapper::Region::new("eu-west-1"))
//!     .load()
//!     .await;
//! dynamo_wrapper::init(&config).await;
//! # }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemInput;
//! use dynamo_wrapper::{put_request, DynamoDbWrapper, Error, WrapperEvent, WrapperOptions};
//! use serde::Serialize;
//!
//! #[derive(Debug, Clone, Serialize)]
//! struct User {
//!     user_id: String,
//!     email: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let wrapper = DynamoDbWrapper::from_env(
//!         WrapperOptions::default().with_table_name_prefix("dev-"),
//!     )
//!     .await;
//!
//!     let mut events = wrapper.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let WrapperEvent::Retry { retry_count, .. } = event {
//!                 println!("retry #{retry_count}");
//!             }
//!         }
//!     });
//!
//!     let requests = (0..100)
//!         .map(|i| {
//!             put_request(&User {
//!                 user_id: i.to_string(),
//!                 email: format!("user{i}@example.com"),
//!             })
//!         })
//!         .collect::<Result<Vec<_>, _>>()?;
//!
//!     // written to dev-users in groups of 25
//!     let output = wrapper
//!         .batch_write_item(BatchWriteItemInput::builder().set_request_items(Some(
//!             [("users".to_string(), requests)].into(),
//!         )))
//!         .await?;
//!     assert!(output.unprocessed_items().is_none());
//!
//!     Ok(())
//! }
//! ```
#![deny(
    warnings,
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
    deprecated,
    unknown_lints,
    unreachable_code,
    unused_mut
)]

mod error;
pub use error::{
    Error, NOT_YET_IMPLEMENTED, PROVISIONED_THROUGHPUT_EXCEEDED, ServiceError,
    VALIDATION_EXCEPTION,
};

pub mod capacity;

pub mod client;

pub mod estimate;

pub mod events;

mod operation;

pub mod options;

pub mod partition;

pub mod prefix;

pub mod request;

pub mod retry;

mod wrapper;

// Re-export main types for convenience
pub use client::DynamoDbApi;
pub use events::{CapacityType, Method, WrapperEvent};
pub use options::{
    BatchWriteItemOptions, BatchWriteMode, BatchWriteOptions, OperationConfig, PartitionStrategy,
    QueryOptions, ReadOptions, ScanOptions, WrapperOptions,
};
pub use prefix::TableNamePrefix;
pub use request::{WriteOperation, delete_request, put_request};
pub use retry::RetryPolicy;
pub use wrapper::DynamoDbWrapper;

// Re-export the aws-config entry points used to build a config for `init`
pub use aws_config::{BehaviorVersion, Region, SdkConfig, defaults};

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use tokio::sync::OnceCell;

/// A DynamoDB item: attribute names to values
pub type Item = HashMap<String, AttributeValue>;

/// Global DynamoDB client instance
static GLOBAL_CLIENT: OnceCell<DynamoDbClient> = OnceCell::const_new();

/// Default SDK configuration of the global client
///
/// It configures:
/// - SDK retries disabled, the wrapper retries on its own terms
/// - Connect timeout: 3 seconds
/// - Read timeout: 20 seconds
/// - Operation timeout: 60 seconds
/// - LocalStack support via AWS_PROFILE=localstack
async fn aws_config_defaults() -> SdkConfig {
    use aws_types::sdk_config::{RetryConfig, TimeoutConfig};
    use std::time::Duration;

    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(3))
        .read_timeout(Duration::from_secs(20))
        .operation_timeout(Duration::from_secs(60))
        .build();

    let mut loader = defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::disabled())
        .timeout_config(timeout_config);

    // Support LocalStack via AWS_PROFILE=localstack
    if std::env::var("AWS_PROFILE").unwrap_or_default() == "localstack" {
        loader = loader.endpoint_url("http://127.0.0.1:4566");
    }

    loader.load().await
}

/// Initialize the global DynamoDB client with a custom AWS config
///
/// Has no effect once the global client exists. Leave SDK retries disabled
/// in `config` unless physical calls should be retried twice.
///
/// # Example
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() {
///     let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
///         .region(aws_config::Region::new("us-west-2"))
///         .load()
///         .await;
///     dynamo_wrapper::init(&config).await;
/// }
/// ```
pub async fn init(config: &SdkConfig) {
    let _ = GLOBAL_CLIENT
        .get_or_init(|| async { DynamoDbClient::new(config) })
        .await;
}

/// Initialize the global DynamoDB client with a custom client instance
pub async fn init_with_client(client: DynamoDbClient) {
    let _ = GLOBAL_CLIENT.get_or_init(|| async { client }).await;
}

/// Get a reference to the global DynamoDB client
///
/// Automatically initializes the client with sensible defaults if
/// [`init`] or [`init_with_client`] was not called before:
/// - SDK retries disabled
/// - Connect timeout: 3 seconds
/// - Read timeout: 20 seconds
/// - Operation timeout: 60 seconds
/// - LocalStack support via AWS_PROFILE=localstack
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() {
/// let client = dynamo_wrapper::dynamodb_client().await;
/// let wrapper = dynamo_wrapper::DynamoDbWrapper::new(client.clone(), Default::default());
/// # }
/// ```
pub async fn dynamodb_client() -> &'static DynamoDbClient {
    GLOBAL_CLIENT
        .get_or_init(|| async {
            let config = aws_config_defaults().await;
            DynamoDbClient::new(&config)
        })
        .await
}
