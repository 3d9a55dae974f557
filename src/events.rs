//! Wrapper events
//!
//! Notifications published while a logical operation runs. Subscribing is
//! optional and never affects the operation; events sent while nobody
//! listens are dropped.

use aws_sdk_dynamodb::types::ConsumedCapacity;
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;

/// Number of events a slow subscriber may lag behind before missing some
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Physical storage operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GetItem`
    GetItem,
    /// `PutItem`
    PutItem,
    /// `UpdateItem`
    UpdateItem,
    /// `DeleteItem`
    DeleteItem,
    /// `BatchGetItem`
    BatchGetItem,
    /// `BatchWriteItem`
    BatchWriteItem,
    /// `Query`
    Query,
    /// `Scan`
    Scan,
    /// `CreateTable`
    CreateTable,
    /// `DescribeTable`
    DescribeTable,
    /// `UpdateTable`
    UpdateTable,
    /// `DeleteTable`
    DeleteTable,
}

impl Method {
    /// Operation name as used by the service
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GetItem => "GetItem",
            Method::PutItem => "PutItem",
            Method::UpdateItem => "UpdateItem",
            Method::DeleteItem => "DeleteItem",
            Method::BatchGetItem => "BatchGetItem",
            Method::BatchWriteItem => "BatchWriteItem",
            Method::Query => "Query",
            Method::Scan => "Scan",
            Method::CreateTable => "CreateTable",
            Method::DescribeTable => "DescribeTable",
            Method::UpdateTable => "UpdateTable",
            Method::DeleteTable => "DeleteTable",
        }
    }

    /// Kind of capacity the operation consumes, `None` for control plane operations
    pub fn capacity_type(&self) -> Option<CapacityType> {
        match self {
            Method::GetItem | Method::BatchGetItem | Method::Query | Method::Scan => {
                Some(CapacityType::Read)
            }
            Method::PutItem | Method::UpdateItem | Method::DeleteItem | Method::BatchWriteItem => {
                Some(CapacityType::Write)
            }
            Method::CreateTable
            | Method::DescribeTable
            | Method::UpdateTable
            | Method::DeleteTable => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read or write capacity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CapacityType {
    /// `ReadCapacityUnits`
    Read,
    /// `WriteCapacityUnits`
    Write,
}

impl CapacityType {
    /// Name of the capacity unit
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityType::Read => "ReadCapacityUnits",
            CapacityType::Write => "WriteCapacityUnits",
        }
    }
}

/// Event published by a [`DynamoDbWrapper`](crate::DynamoDbWrapper)
#[derive(Clone, Debug, PartialEq)]
pub enum WrapperEvent {
    /// A physical call is about to be retried
    Retry {
        /// Table targeted by the call, without prefix
        table_name: Option<String>,
        /// Operation being retried
        method: Method,
        /// Retry number, starting at 1
        retry_count: u32,
        /// Delay before the retry
        retry_delay: Duration,
    },
    /// A physical call reported consumed capacity
    ConsumedCapacity {
        /// Operation that consumed the capacity
        method: Method,
        /// Read or write
        capacity_type: CapacityType,
        /// Capacity record, table name without prefix
        consumed_capacity: ConsumedCapacity,
    },
    /// A batch write group completed
    BatchGroupWritten {
        /// Table the group was written to, without prefix
        table_name: String,
        /// Requests of the table applied so far
        processed_count: usize,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct EventSender {
    sender: broadcast::Sender<WrapperEvent>,
}

impl EventSender {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<WrapperEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, event: WrapperEvent) {
        // no receivers is not an error
        let _ = self.sender.send(event);
    }
}
