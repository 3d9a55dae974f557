use aws_sdk_dynamodb::operation::query::QueryOutput;
use aws_sdk_dynamodb::operation::query::builders::QueryInputBuilder;
use aws_sdk_dynamodb::operation::scan::ScanOutput;
use aws_sdk_dynamodb::operation::scan::builders::ScanInputBuilder;
use aws_sdk_dynamodb::types::ConsumedCapacity;
use tokio::time::sleep;

use super::DynamoDbWrapper;
use crate::capacity::aggregate;
use crate::client::DynamoDbApi;
use crate::operation::Operation;
use crate::options::{OperationConfig, QueryOptions, ReadOptions, ScanOptions};
use crate::{Error, Item};

/// One page of a query or scan
struct Page {
    items: Vec<Item>,
    count: i32,
    scanned_count: i32,
    consumed_capacity: Option<ConsumedCapacity>,
    last_evaluated_key: Option<Item>,
}

trait PaginatedOperation: Operation {
    fn with_start_key(self, key: Item) -> Self;

    fn into_page(output: Self::Output) -> Page;

    fn from_pages(
        items: Vec<Item>,
        count: i32,
        scanned_count: i32,
        consumed_capacity: Option<ConsumedCapacity>,
    ) -> Self::Output;
}

macro_rules! impl_paginated_operation {
    ($builder:ty => $output:ident) => {
        impl PaginatedOperation for $builder {
            fn with_start_key(self, key: Item) -> Self {
                self.set_exclusive_start_key(Some(key))
            }

            fn into_page(output: $output) -> Page {
                Page {
                    items: output.items.unwrap_or_default(),
                    count: output.count,
                    scanned_count: output.scanned_count,
                    consumed_capacity: output.consumed_capacity,
                    last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
                }
            }

            fn from_pages(
                items: Vec<Item>,
                count: i32,
                scanned_count: i32,
                consumed_capacity: Option<ConsumedCapacity>,
            ) -> $output {
                $output::builder()
                    .set_items(Some(items))
                    .count(count)
                    .scanned_count(scanned_count)
                    .set_consumed_capacity(consumed_capacity)
                    .build()
            }
        }
    };
}

impl_paginated_operation!(QueryInputBuilder => QueryOutput);
impl_paginated_operation!(ScanInputBuilder => ScanOutput);

impl<C: DynamoDbApi> DynamoDbWrapper<C> {
    /// `Query` returning every page
    ///
    /// Pages are requested one after the other, waiting the group delay in
    /// between. Items are concatenated in page order, counts are summed and
    /// consumed capacity is aggregated when any page reported it. The output
    /// carries no `LastEvaluatedKey`.
    pub async fn query(&self, input: QueryInputBuilder) -> Result<QueryOutput, Error> {
        self.query_with_options(input, &QueryOptions::default()).await
    }

    /// [`query`](Self::query) with call-level options
    pub async fn query_with_options(
        &self,
        input: QueryInputBuilder,
        options: &QueryOptions,
    ) -> Result<QueryOutput, Error> {
        self.read_all_pages(input, options).await
    }

    /// `Scan` returning every page, see [`query`](Self::query)
    pub async fn scan(&self, input: ScanInputBuilder) -> Result<ScanOutput, Error> {
        self.scan_with_options(input, &ScanOptions::default()).await
    }

    /// [`scan`](Self::scan) with call-level options
    pub async fn scan_with_options(
        &self,
        input: ScanInputBuilder,
        options: &ScanOptions,
    ) -> Result<ScanOutput, Error> {
        self.read_all_pages(input, options).await
    }

    async fn read_all_pages<O: PaginatedOperation>(
        &self,
        input: O,
        options: &ReadOptions,
    ) -> Result<O::Output, Error> {
        let method = O::METHOD;
        let config = OperationConfig::for_read(&self.options, options);
        let engine = self.engine(&config.retry);

        let mut items = Vec::new();
        let mut count = 0;
        let mut scanned_count = 0;
        let mut capacities = Vec::new();
        let mut pages = 0;

        let mut request = input.clone();

        loop {
            let page = O::into_page(engine.execute(request).await?.output);
            pages += 1;

            items.extend(page.items);
            count += page.count;
            scanned_count += page.scanned_count;
            capacities.extend(page.consumed_capacity);

            let Some(last_evaluated_key) = page.last_evaluated_key else {
                break;
            };

            tracing::debug!(method = %method, pages, "fetching next page");
            sleep(config.group_delay).await;

            request = input.clone().with_start_key(last_evaluated_key);
        }

        tracing::debug!(method = %method, pages, count, scanned_count, "read complete");

        Ok(O::from_pages(items, count, scanned_count, aggregate(&capacities)))
    }
}
