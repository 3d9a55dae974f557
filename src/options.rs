//! Wrapper configuration
//!
//! Options come from three places: hard-coded defaults, the options the
//! wrapper was constructed with, and options passed to a single call (for
//! batch writes, optionally keyed by table name). [`OperationConfig`] is the
//! resolved value for one logical call; caller-supplied options are never
//! modified.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default delay between pages of a query/scan and between batch write groups
pub const DEFAULT_GROUP_DELAY_MS: u64 = 100;

/// Default maximum number of retries for one physical call
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default base of the exponential backoff
pub const DEFAULT_RETRY_BASE_MS: u64 = 100;

/// Default number of write requests per group for [`PartitionStrategy::EqualItemCount`]
pub const DEFAULT_TARGET_ITEM_COUNT: usize = 25;

/// Default estimated WCU per group for [`PartitionStrategy::EvenlyDistributedGroupWcu`]
pub const DEFAULT_TARGET_GROUP_WCU: usize = 5;

/// Custom backoff: maps the retry count (starting at 1) to the delay before that retry
pub type CustomBackoff = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// How a batch write splits its requests into groups
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum PartitionStrategy {
    /// Groups of `target_item_count` requests (capped at 25)
    #[default]
    EqualItemCount,
    /// Groups whose estimated total WCU stays within `target_group_wcu`
    #[serde(rename = "EvenlyDistributedGroupWCU")]
    EvenlyDistributedGroupWcu,
}

/// Retry delay settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RetryDelayOptions {
    /// Base of the exponential backoff in milliseconds
    pub base_ms: u64,
    /// Overrides the exponential backoff when set
    #[serde(skip)]
    pub custom_backoff: Option<CustomBackoff>,
}

impl Default for RetryDelayOptions {
    fn default() -> Self {
        Self {
            base_ms: DEFAULT_RETRY_BASE_MS,
            custom_backoff: None,
        }
    }
}

impl fmt::Debug for RetryDelayOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryDelayOptions")
            .field("base_ms", &self.base_ms)
            .field("custom_backoff", &self.custom_backoff.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Instance-level options, fixed for the lifetime of a wrapper
///
/// Deserializable so it can be read from a configuration file; the custom
/// backoff can only be set programmatically.
///
/// # Example
///
/// ```
/// use dynamo_wrapper::WrapperOptions;
/// use std::time::Duration;
///
/// let options = WrapperOptions::default()
///     .with_table_name_prefix("dev-")
///     .with_max_retries(3)
///     .with_custom_backoff(|retry| Duration::from_millis(50 * u64::from(retry)));
///
/// assert_eq!(options.table_name_prefix, "dev-");
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WrapperOptions {
    /// Prefix added to every table name in requests and removed from responses
    pub table_name_prefix: String,
    /// Delay between pages of a query/scan and between batch write groups
    pub group_delay_ms: u64,
    /// Maximum number of retries for one physical call
    pub max_retries: u32,
    /// Retry delay settings
    pub retry_delay_options: RetryDelayOptions,
}

impl Default for WrapperOptions {
    fn default() -> Self {
        Self {
            table_name_prefix: String::new(),
            group_delay_ms: DEFAULT_GROUP_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_options: RetryDelayOptions::default(),
        }
    }
}

impl WrapperOptions {
    /// Set the table name prefix
    pub fn with_table_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_name_prefix = prefix.into();
        self
    }

    /// Set the delay between pages and between batch write groups
    pub fn with_group_delay(mut self, delay: Duration) -> Self {
        self.group_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base of the exponential backoff
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_delay_options.base_ms = base.as_millis() as u64;
        self
    }

    /// Replace the exponential backoff with a custom function of the retry count
    pub fn with_custom_backoff<F>(mut self, backoff: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        self.retry_delay_options.custom_backoff = Some(Arc::new(backoff));
        self
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_delay_options.base_ms),
            custom_backoff: self.retry_delay_options.custom_backoff.clone(),
        }
    }
}

/// Batch write options; unset fields fall back to the next level
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchWriteOptions {
    /// How requests are split into groups
    pub partition_strategy: Option<PartitionStrategy>,
    /// Requests per group for [`PartitionStrategy::EqualItemCount`]; values below 1 are ignored
    pub target_item_count: Option<usize>,
    /// Estimated WCU per group for [`PartitionStrategy::EvenlyDistributedGroupWcu`]; values below 1 are ignored
    pub target_group_wcu: Option<usize>,
    /// Delay between groups in milliseconds
    pub group_delay_ms: Option<u64>,
}

impl BatchWriteOptions {
    /// Split into groups of at most `count` requests
    pub fn equal_item_count(count: usize) -> Self {
        Self {
            partition_strategy: Some(PartitionStrategy::EqualItemCount),
            target_item_count: Some(count),
            ..Self::default()
        }
    }

    /// Split into groups of about `wcu` estimated write capacity units
    pub fn evenly_distributed_group_wcu(wcu: usize) -> Self {
        Self {
            partition_strategy: Some(PartitionStrategy::EvenlyDistributedGroupWcu),
            target_group_wcu: Some(wcu),
            ..Self::default()
        }
    }

    /// Override the delay between groups
    pub fn with_group_delay(mut self, delay: Duration) -> Self {
        self.group_delay_ms = Some(delay.as_millis() as u64);
        self
    }
}

/// Which request shapes a batch write accepts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum BatchWriteMode {
    /// Any number of tables, puts and deletes, each table written independently
    #[default]
    PerTable,
    /// Exactly one table and only put requests
    SingleTable,
}

/// Call-level options for a batch write
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchWriteItemOptions {
    /// Options applied to every table without an override
    pub defaults: BatchWriteOptions,
    /// Overrides keyed by table name (without prefix)
    pub tables: HashMap<String, BatchWriteOptions>,
    /// Accepted request shapes
    pub mode: BatchWriteMode,
}

impl BatchWriteItemOptions {
    /// Same options for every table
    pub fn all_tables(defaults: BatchWriteOptions) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Restrict the call to one table with put requests only
    pub fn single_table(defaults: BatchWriteOptions) -> Self {
        Self {
            defaults,
            mode: BatchWriteMode::SingleTable,
            ..Self::default()
        }
    }

    /// Add an override for one table
    pub fn table(mut self, table_name: impl Into<String>, options: BatchWriteOptions) -> Self {
        let _ = self.tables.insert(table_name.into(), options);
        self
    }
}

/// Call-level options for a query or scan
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Delay between pages in milliseconds
    pub group_delay_ms: Option<u64>,
}

/// Call-level options for a query
pub type QueryOptions = ReadOptions;

/// Call-level options for a scan
pub type ScanOptions = ReadOptions;

/// Resolved configuration for one logical call
#[derive(Clone, Debug)]
pub struct OperationConfig {
    /// Delay between pages or groups
    pub group_delay: Duration,
    /// How requests are split into groups
    pub partition_strategy: PartitionStrategy,
    /// Requests per group for [`PartitionStrategy::EqualItemCount`]
    pub target_item_count: usize,
    /// Estimated WCU per group for [`PartitionStrategy::EvenlyDistributedGroupWcu`]
    pub target_group_wcu: usize,
    /// Retry and backoff settings
    pub retry: RetryPolicy,
}

impl OperationConfig {
    /// Resolve the configuration of a batch write for one table
    ///
    /// Precedence: per-table override, call-level options, instance options,
    /// hard-coded defaults.
    pub fn for_batch_write(
        instance: &WrapperOptions,
        call: &BatchWriteItemOptions,
        table_name: &str,
    ) -> Self {
        let layers: Vec<&BatchWriteOptions> = call
            .tables
            .get(table_name)
            .into_iter()
            .chain(std::iter::once(&call.defaults))
            .collect();

        let group_delay_ms = layers
            .iter()
            .find_map(|o| o.group_delay_ms)
            .unwrap_or(instance.group_delay_ms);

        Self {
            group_delay: Duration::from_millis(group_delay_ms),
            partition_strategy: layers
                .iter()
                .find_map(|o| o.partition_strategy)
                .unwrap_or_default(),
            target_item_count: layers
                .iter()
                .find_map(|o| o.target_item_count.filter(|count| *count > 0))
                .unwrap_or(DEFAULT_TARGET_ITEM_COUNT),
            target_group_wcu: layers
                .iter()
                .find_map(|o| o.target_group_wcu.filter(|wcu| *wcu > 0))
                .unwrap_or(DEFAULT_TARGET_GROUP_WCU),
            retry: instance.retry_policy(),
        }
    }

    /// Resolve the configuration of a query or scan
    pub fn for_read(instance: &WrapperOptions, call: &ReadOptions) -> Self {
        Self {
            group_delay: Duration::from_millis(call.group_delay_ms.unwrap_or(instance.group_delay_ms)),
            partition_strategy: PartitionStrategy::default(),
            target_item_count: DEFAULT_TARGET_ITEM_COUNT,
            target_group_wcu: DEFAULT_TARGET_GROUP_WCU,
            retry: instance.retry_policy(),
        }
    }

    /// Configuration for a single pass-through call
    pub fn for_instance(instance: &WrapperOptions) -> Self {
        Self::for_read(instance, &ReadOptions::default())
    }
}
