use aws_sdk_dynamodb::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_smithy_runtime_api::http::Response;
use serde_dynamo::Error as SerdeDynamoError;
use std::error::Error as StdError;
use std::fmt;

/// Error code used by the service when a table runs out of provisioned throughput
pub const PROVISIONED_THROUGHPUT_EXCEEDED: &str = "ProvisionedThroughputExceededException";

/// Error code for requests this layer rejects before any physical call
pub const VALIDATION_EXCEPTION: &str = "ValidationException";

/// Error code for request features this layer recognizes but does not support
pub const NOT_YET_IMPLEMENTED: &str = "NotYetImplementedError";

/// Service error codes that signal a transient throttling or limit condition
const THROTTLING_CODES: [&str; 4] = [
    PROVISIONED_THROUGHPUT_EXCEEDED,
    "ThrottlingException",
    "RequestLimitExceeded",
    "LimitExceededException",
];

pub(crate) mod messages {
    pub(crate) const PROVISIONED_THROUGHPUT_EXCEEDED: &str = "The level of configured provisioned throughput for the table was exceeded. Consider increasing your provisioning level with the UpdateTable API";
    pub(crate) const ITEM_COLLECTION_METRICS: &str = "ReturnItemCollectionMetrics is supported in the AWS DynamoDB API, but this capability is not yet implemented by this wrapper library.";
    pub(crate) const BATCH_WRITE_MULTIPLE_TABLES: &str = "Expected exactly 1 table name in RequestItems, but found 0 or 2+. Writing to more than 1 table with BatchWriteItem is supported in the AWS DynamoDB API, but this capability is not enabled in single-table mode.";
    pub(crate) const BATCH_WRITE_DELETE_REQUEST: &str = "DeleteRequest in BatchWriteItem is supported in the AWS DynamoDB API, but this capability is not enabled in single-table mode.";
}

/// Structured failure raised by the underlying storage client
///
/// Carries the service error code, a human readable message and, when the
/// failure came with an HTTP response, its status code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceError {
    /// Service error code, e.g. `ProvisionedThroughputExceededException`
    pub code: String,
    /// Human readable description
    pub message: String,
    /// HTTP status of the response, when one was received
    pub status_code: Option<u16>,
}

impl ServiceError {
    /// Create a new service error
    pub fn new(code: impl Into<String>, message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status_code,
        }
    }

    /// Whether the failure is transient and the physical call may be retried
    ///
    /// HTTP 500 and 503 responses are retryable, as are the service's
    /// throttling and limit error codes. Everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self.status_code, Some(500) | Some(503))
            || THROTTLING_CODES.contains(&self.code.as_str())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "{} ({}): {}", self.code, status, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl StdError for ServiceError {}

impl<E> From<SdkError<E, Response>> for ServiceError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
{
    fn from(err: SdkError<E, Response>) -> Self {
        let status_code = err.raw_response().map(|response| response.status().as_u16());

        let code = match &err {
            SdkError::ServiceError(_) => err.code().unwrap_or("UnknownServiceError").to_string(),
            SdkError::TimeoutError(_) => "TimeoutError".to_string(),
            SdkError::DispatchFailure(_) => "DispatchFailure".to_string(),
            SdkError::ConstructionFailure(_) => "ConstructionFailure".to_string(),
            SdkError::ResponseError(_) => "ResponseError".to_string(),
            _ => "UnknownError".to_string(),
        };

        let message = err
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

        Self {
            code,
            message,
            status_code,
        }
    }
}

/// DynamoDB wrapper operation error
#[derive(Debug)]
pub enum Error {
    /// Malformed or unsupported request shape, raised before any physical call
    Validation(String),
    /// Request feature recognized but intentionally unsupported by this layer
    NotYetImplemented(String),
    /// Every item of a batch write was left unprocessed after all retries
    ProvisionedThroughputExceeded,
    /// Error raised by the underlying storage client
    Service(ServiceError),
    /// DynamoDB request builder error
    BuildError(BuildError),
    /// Serde DynamoDB serialization/deserialization error
    SerdeDynamo(SerdeDynamoError),
}

impl Error {
    /// Stable string code identifying the failure
    pub fn code(&self) -> &str {
        match self {
            Error::Validation(_) => VALIDATION_EXCEPTION,
            Error::NotYetImplemented(_) => NOT_YET_IMPLEMENTED,
            Error::ProvisionedThroughputExceeded => PROVISIONED_THROUGHPUT_EXCEEDED,
            Error::Service(e) => e.code.as_str(),
            Error::BuildError(_) => "BuildError",
            Error::SerdeDynamo(_) => "SerializationError",
        }
    }

    /// Human readable message, without the code
    pub fn message(&self) -> String {
        match self {
            Error::Validation(message) | Error::NotYetImplemented(message) => message.clone(),
            Error::ProvisionedThroughputExceeded => {
                messages::PROVISIONED_THROUGHPUT_EXCEEDED.to_string()
            }
            Error::Service(e) => e.message.clone(),
            Error::BuildError(e) => e.to_string(),
            Error::SerdeDynamo(e) => e.to_string(),
        }
    }

    /// HTTP-like status code of the failure
    ///
    /// Errors raised by this layer report `400`. Service errors report the
    /// status of their response, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Service(e) => e.status_code,
            _ => Some(400),
        }
    }

    /// Check if the error is transient and was eligible for retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Service(e) if e.is_retryable())
    }

    /// Check if the error is a serialization/deserialization error
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::SerdeDynamo(_))
    }

    /// Check if the error was raised before any request reached the service
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotYetImplemented(_) | Error::BuildError(_)
        )
    }
}

macro_rules! impl_from_error {
    ($name:ident, $variant:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$variant(e)
            }
        }
    };
    ($name:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$name(e)
            }
        }
    };
}

impl_from_error!(SerdeDynamoError, SerdeDynamo);
impl_from_error!(ServiceError, Service);
impl_from_error!(BuildError);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(message) => write!(f, "{}: {}", VALIDATION_EXCEPTION, message),
            Error::NotYetImplemented(message) => write!(f, "{}: {}", NOT_YET_IMPLEMENTED, message),
            Error::ProvisionedThroughputExceeded => write!(
                f,
                "{}: {}",
                PROVISIONED_THROUGHPUT_EXCEEDED,
                messages::PROVISIONED_THROUGHPUT_EXCEEDED
            ),
            Error::Service(e) => write!(f, "DynamoDB operation failed: {}", e),
            Error::BuildError(e) => write!(f, "DynamoDB request builder error: {}", e),
            Error::SerdeDynamo(e) => write!(f, "DynamoDB serialization error: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Service(e) => Some(e),
            Error::BuildError(e) => Some(e),
            Error::SerdeDynamo(e) => Some(e),
            _ => None,
        }
    }
}
