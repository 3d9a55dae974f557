use aws_sdk_dynamodb::operation::batch_write_item::builders::BatchWriteItemInputBuilder;
use aws_sdk_dynamodb::operation::batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput};
use aws_sdk_dynamodb::types::{
    ConsumedCapacity, ReturnConsumedCapacity, ReturnItemCollectionMetrics, WriteRequest,
};
use futures_util::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use tokio::time::sleep;
use tokio_stream::{self as stream};

use super::DynamoDbWrapper;
use crate::capacity::aggregate_multiple;
use crate::client::DynamoDbApi;
use crate::error::messages;
use crate::events::WrapperEvent;
use crate::options::{BatchWriteItemOptions, BatchWriteMode, OperationConfig};
use crate::partition::partition;
use crate::request::WriteOperation;
use crate::Error;

/// Outcome of writing every group of one table
#[derive(Debug, Default)]
struct TableWrite {
    table_name: String,
    unprocessed: Vec<WriteRequest>,
    consumed_capacity: Vec<ConsumedCapacity>,
}

/// Reject request shapes this layer does not handle, before any request is sent
fn validate(input: &BatchWriteItemInputBuilder, mode: BatchWriteMode) -> Result<(), Error> {
    if input.get_return_item_collection_metrics() == &Some(ReturnItemCollectionMetrics::Size) {
        return Err(Error::NotYetImplemented(messages::ITEM_COLLECTION_METRICS.to_string()));
    }

    let request_items = input.get_request_items().as_ref();
    let table_count = request_items.map_or(0, HashMap::len);

    if mode == BatchWriteMode::SingleTable && table_count != 1 {
        return Err(Error::NotYetImplemented(messages::BATCH_WRITE_MULTIPLE_TABLES.to_string()));
    }

    let Some(request_items) = request_items.filter(|items| !items.is_empty()) else {
        return Err(Error::Validation(
            "RequestItems must contain at least one table".to_string(),
        ));
    };

    for (table_name, requests) in request_items {
        if requests.is_empty() {
            return Err(Error::Validation(format!(
                "RequestItems for table {table_name} must contain at least one WriteRequest"
            )));
        }

        for request in requests {
            let operation = WriteOperation::from_request(request)?;
            if mode == BatchWriteMode::SingleTable && operation.is_delete() {
                return Err(Error::NotYetImplemented(
                    messages::BATCH_WRITE_DELETE_REQUEST.to_string(),
                ));
            }
        }
    }

    Ok(())
}

impl<C: DynamoDbApi> DynamoDbWrapper<C> {
    /// `BatchWriteItem` for any number of requests
    ///
    /// See [`batch_write_item_with_options`](Self::batch_write_item_with_options).
    pub async fn batch_write_item(
        &self,
        input: BatchWriteItemInputBuilder,
    ) -> Result<BatchWriteItemOutput, Error> {
        self.batch_write_item_with_options(input, &BatchWriteItemOptions::default())
            .await
    }

    /// `BatchWriteItem` for any number of requests, tables and group sizes
    ///
    /// The requests of each table are split into groups by the table's
    /// partition strategy and written group after group, waiting the group
    /// delay in between. Tables are written concurrently. Each group is
    /// retried until it is fully processed or retries run out, in which case
    /// its remaining requests are reported back.
    ///
    /// `ReturnConsumedCapacity` is forwarded to every group and the reported
    /// capacity is aggregated per table.
    ///
    /// # Errors
    ///
    /// - [`Error::NotYetImplemented`] when item collection metrics are
    ///   requested, or in [`BatchWriteMode::SingleTable`] for several tables
    ///   or delete requests
    /// - [`Error::Validation`] for an empty or malformed request
    /// - [`Error::ProvisionedThroughputExceeded`] when no request at all was
    ///   processed
    /// - the service error of the first group that failed fatally
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemInput;
    /// use dynamo_wrapper::{put_request, BatchWriteItemOptions, BatchWriteOptions, DynamoDbWrapper, Error};
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Event {
    ///     id: u64,
    ///     body: String,
    /// }
    ///
    /// # async fn example(wrapper: DynamoDbWrapper) -> Result<(), Error> {
    /// let requests = (0..1000)
    ///     .map(|id| put_request(&Event { id, body: String::new() }))
    ///     .collect::<Result<Vec<_>, _>>()?;
    ///
    /// let options = BatchWriteItemOptions::all_tables(BatchWriteOptions::evenly_distributed_group_wcu(20));
    /// let output = wrapper
    ///     .batch_write_item_with_options(
    ///         BatchWriteItemInput::builder().set_request_items(Some([("events".to_string(), requests)].into())),
    ///         &options,
    ///     )
    ///     .await?;
    ///
    /// if let Some(unprocessed) = output.unprocessed_items() {
    ///     println!("{} requests left", unprocessed.values().map(Vec::len).sum::<usize>());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn batch_write_item_with_options(
        &self,
        input: BatchWriteItemInputBuilder,
        options: &BatchWriteItemOptions,
    ) -> Result<BatchWriteItemOutput, Error> {
        validate(&input, options.mode)?;

        let return_consumed_capacity = input.get_return_consumed_capacity().clone();

        let mut tables: Vec<(String, Vec<WriteRequest>)> = input
            .get_request_items()
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect();
        tables.sort_by(|(a, _), (b, _)| a.cmp(b));

        let total_requests: usize = tables.iter().map(|(_, requests)| requests.len()).sum();

        // partition everything up front so a bad request fails before any write
        let mut plans = Vec::with_capacity(tables.len());
        for (table_name, requests) in &tables {
            let config = OperationConfig::for_batch_write(&self.options, options, table_name);
            let groups = partition(requests, &config)?;
            plans.push((table_name.as_str(), groups, config));
        }

        // one pipeline per table
        let concurrency = plans.len().max(1);

        let written: Vec<TableWrite> = stream::iter(plans.into_iter().map(|(table_name, groups, config)| {
            self.write_table(table_name, groups, config, return_consumed_capacity.clone())
        }))
        .buffer_unordered(concurrency)
        .try_collect()
        .await?;

        let unprocessed_count: usize = written.iter().map(|table| table.unprocessed.len()).sum();

        if unprocessed_count == total_requests {
            tracing::warn!(total_requests, "no write request was processed");
            return Err(Error::ProvisionedThroughputExceeded);
        }

        let mut written = written;
        written.sort_by(|a, b| a.table_name.cmp(&b.table_name));

        let consumed_capacity: Vec<ConsumedCapacity> = written
            .iter()
            .flat_map(|table| table.consumed_capacity.iter().cloned())
            .collect();

        let unprocessed_items: HashMap<String, Vec<WriteRequest>> = written
            .into_iter()
            .filter(|table| !table.unprocessed.is_empty())
            .map(|table| (table.table_name, table.unprocessed))
            .collect();

        tracing::debug!(
            total_requests,
            unprocessed_count,
            tables = tables.len(),
            "batch write complete"
        );

        Ok(BatchWriteItemOutput::builder()
            .set_unprocessed_items((!unprocessed_items.is_empty()).then_some(unprocessed_items))
            .set_consumed_capacity(
                (!consumed_capacity.is_empty()).then(|| aggregate_multiple(&consumed_capacity)),
            )
            .build())
    }

    async fn write_table(
        &self,
        table_name: &str,
        groups: Vec<&[WriteRequest]>,
        config: OperationConfig,
        return_consumed_capacity: Option<ReturnConsumedCapacity>,
    ) -> Result<TableWrite, Error> {
        let engine = self.engine(&config.retry);

        let mut written = TableWrite {
            table_name: table_name.to_string(),
            ..TableWrite::default()
        };
        let mut processed_count = 0;
        let group_count = groups.len();

        for (index, group) in groups.into_iter().enumerate() {
            if index > 0 {
                sleep(config.group_delay).await;
            }

            let request = BatchWriteItemInput::builder()
                .request_items(table_name, group.to_vec())
                .set_return_consumed_capacity(return_consumed_capacity.clone());

            let completed = engine.execute(request).await?;

            let unprocessed: Vec<WriteRequest> = completed
                .output
                .unprocessed_items
                .map(|items| items.into_values().flatten().collect())
                .unwrap_or_default();

            processed_count += group.len().saturating_sub(unprocessed.len());

            tracing::debug!(
                table_name,
                group = index + 1,
                group_count,
                group_len = group.len(),
                unprocessed = unprocessed.len(),
                "batch group written"
            );

            written.unprocessed.extend(unprocessed);
            written.consumed_capacity.extend(completed.consumed_capacity);

            self.events.emit(WrapperEvent::BatchGroupWritten {
                table_name: table_name.to_string(),
                processed_count,
            });
        }

        Ok(written)
    }
}
