//! Retry engine
//!
//! Turns one request into a bounded sequence of physical calls. Throttling,
//! limit and 5xx failures are retried after an exponential backoff, as are
//! batch writes whose response leaves items unprocessed (the next attempt
//! carries only those). Any other failure is returned immediately.

use aws_sdk_dynamodb::types::ConsumedCapacity;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

use crate::client::DynamoDbApi;
use crate::events::{EventSender, WrapperEvent};
use crate::operation::Operation;
use crate::options::CustomBackoff;
use crate::prefix::TableNamePrefix;
use crate::Error;

/// Retry bounds and backoff
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each following one
    pub base_delay: Duration,
    /// Replaces the exponential backoff when set
    pub custom_backoff: Option<CustomBackoff>,
}

impl RetryPolicy {
    /// Delay before retry number `retry_count` (starting at 1)
    ///
    /// `base_delay * 2^(retry_count - 1)` unless a custom backoff is set, whose
    /// result is used as is.
    pub fn delay(&self, retry_count: u32) -> Duration {
        match &self.custom_backoff {
            Some(backoff) => backoff(retry_count),
            None => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(retry_count.saturating_sub(1))),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("custom_backoff", &self.custom_backoff.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Output of a request together with the capacity reported by every
/// successful physical call it took
#[derive(Debug)]
pub(crate) struct Completed<O> {
    pub(crate) output: O,
    pub(crate) consumed_capacity: Vec<ConsumedCapacity>,
}

pub(crate) struct RetryEngine<'a, C> {
    pub(crate) client: &'a C,
    pub(crate) prefix: &'a TableNamePrefix,
    pub(crate) events: &'a EventSender,
    pub(crate) policy: &'a RetryPolicy,
}

impl<C: DynamoDbApi> RetryEngine<'_, C> {
    /// Run `request` until it succeeds, fails fatally or runs out of retries
    ///
    /// The request carries logical table names; the output comes back with
    /// the prefix removed.
    pub(crate) async fn execute<O: Operation>(&self, request: O) -> Result<Completed<O::Output>, Error> {
        let method = O::METHOD;
        let mut request = request.add_table_prefix(self.prefix);
        let table_name = request.target_table().map(|name| self.prefix.remove(&name));

        let mut consumed_capacity = Vec::new();
        let mut retry_count: u32 = 0;

        loop {
            tracing::debug!(method = %method, table_name = ?table_name, retry_count, "sending request");

            let last_error = match request.clone().send(self.client).await {
                Ok(raw) => {
                    let next = request.unprocessed(&raw);
                    let output = O::remove_table_prefix(raw, self.prefix);
                    self.record_capacity::<O>(&output, &mut consumed_capacity);

                    match next {
                        None => {
                            return Ok(Completed {
                                output,
                                consumed_capacity,
                            });
                        }
                        Some(next) => {
                            request = next;
                            None
                        }
                    }
                }
                Err(err) if err.is_retryable() => Some(err),
                Err(err) => {
                    tracing::debug!(method = %method, code = %err.code, "request failed");
                    return Err(err.into());
                }
            };

            retry_count += 1;

            if retry_count > self.policy.max_retries {
                tracing::warn!(
                    method = %method,
                    table_name = ?table_name,
                    max_retries = self.policy.max_retries,
                    "retries exhausted"
                );
                let output = request.exhausted(last_error)?;
                return Ok(Completed {
                    output: O::remove_table_prefix(output, self.prefix),
                    consumed_capacity,
                });
            }

            let retry_delay = self.policy.delay(retry_count);

            tracing::warn!(
                method = %method,
                table_name = ?table_name,
                retry_count,
                delay_ms = retry_delay.as_millis() as u64,
                error = ?last_error.as_ref().map(|e| e.code.as_str()),
                "retrying request"
            );

            self.events.emit(WrapperEvent::Retry {
                table_name: table_name.clone(),
                method,
                retry_count,
                retry_delay,
            });

            sleep(retry_delay).await;
        }
    }

    fn record_capacity<O: Operation>(&self, output: &O::Output, consumed_capacity: &mut Vec<ConsumedCapacity>) {
        let records = O::capacity_of(output);

        if let Some(capacity_type) = O::METHOD.capacity_type() {
            for record in &records {
                self.events.emit(WrapperEvent::ConsumedCapacity {
                    method: O::METHOD,
                    capacity_type,
                    consumed_capacity: record.clone(),
                });
            }
        }

        consumed_capacity.extend(records);
    }
}
