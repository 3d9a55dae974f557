//! Batch write partitioning
//!
//! A batch write call accepts at most [`BATCH_WRITE_MAX_ITEM_COUNT`] requests.
//! [`next_group`] cuts the next contiguous group out of an arbitrarily long
//! request list; walking it from offset 0 and advancing by each group's length
//! visits every request exactly once, in order.

use aws_sdk_dynamodb::types::WriteRequest;

use crate::estimate::estimate_write_capacity_units;
use crate::options::{OperationConfig, PartitionStrategy};
use crate::request::WriteOperation;
use crate::Error;

/// Maximum number of write requests in one physical batch write call
pub const BATCH_WRITE_MAX_ITEM_COUNT: usize = 25;

/// Estimated cost of a delete request, whose item size is unknown without reading it
const DELETE_REQUEST_WCU: usize = 1;

/// Returns the group of requests starting at `start`, or `None` once `start`
/// is past the end of `requests`
///
/// A returned group is never empty and never longer than
/// [`BATCH_WRITE_MAX_ITEM_COUNT`].
///
/// # Errors
///
/// With [`PartitionStrategy::EvenlyDistributedGroupWcu`], fails when a
/// request cannot be classified or its item size cannot be estimated.
pub fn next_group<'a>(
    requests: &'a [WriteRequest],
    start: usize,
    config: &OperationConfig,
) -> Result<Option<&'a [WriteRequest]>, Error> {
    if start >= requests.len() {
        return Ok(None);
    }

    let len = match config.partition_strategy {
        PartitionStrategy::EqualItemCount => group_len_by_count(requests.len() - start, config.target_item_count),
        PartitionStrategy::EvenlyDistributedGroupWcu => {
            group_len_by_wcu(&requests[start..], config.target_group_wcu)?
        }
    };

    Ok(Some(&requests[start..start + len]))
}

/// Split all of `requests` into groups
pub fn partition<'a>(
    requests: &'a [WriteRequest],
    config: &OperationConfig,
) -> Result<Vec<&'a [WriteRequest]>, Error> {
    let mut groups = Vec::new();
    let mut start = 0;

    while let Some(group) = next_group(requests, start, config)? {
        start += group.len();
        groups.push(group);
    }

    Ok(groups)
}

/// Estimated write capacity units of one request
pub fn write_request_wcu(request: &WriteRequest) -> Result<usize, Error> {
    match WriteOperation::from_request(request)? {
        WriteOperation::Put(item) => estimate_write_capacity_units(item),
        WriteOperation::Delete(_) => Ok(DELETE_REQUEST_WCU),
    }
}

fn group_len_by_count(remaining: usize, target_item_count: usize) -> usize {
    target_item_count.clamp(1, BATCH_WRITE_MAX_ITEM_COUNT).min(remaining)
}

fn group_len_by_wcu(remaining: &[WriteRequest], target_group_wcu: usize) -> Result<usize, Error> {
    // the first request is always taken so an oversized item still makes progress
    let mut total = write_request_wcu(&remaining[0])?;
    let mut len = 1;

    for request in remaining.iter().skip(1).take(BATCH_WRITE_MAX_ITEM_COUNT - 1) {
        let wcu = write_request_wcu(request)?;
        if total + wcu > target_group_wcu {
            break;
        }
        total += wcu;
        len += 1;
    }

    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{BatchWriteItemOptions, BatchWriteOptions, WrapperOptions};
    use crate::request::{delete_request, put_request};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Record {
        id: u32,
        payload: String,
    }

    fn record(id: u32, payload_len: usize) -> WriteRequest {
        put_request(&Record {
            id,
            payload: "x".repeat(payload_len),
        })
        .unwrap()
    }

    fn small_records(count: u32) -> Vec<WriteRequest> {
        (0..count).map(|id| record(id, 10)).collect()
    }

    fn config(options: BatchWriteOptions) -> OperationConfig {
        OperationConfig::for_batch_write(
            &WrapperOptions::default(),
            &BatchWriteItemOptions::all_tables(options),
            "Test",
        )
    }

    fn ids(group: &[WriteRequest]) -> Vec<String> {
        group
            .iter()
            .map(|r| match WriteOperation::from_request(r).unwrap() {
                WriteOperation::Put(item) | WriteOperation::Delete(item) => {
                    item.get("id").unwrap().as_n().unwrap().clone()
                }
            })
            .collect()
    }

    #[test]
    fn test_by_count_reconstructs_the_list() {
        let requests = small_records(53);
        let groups = partition(&requests, &config(BatchWriteOptions::equal_item_count(10))).unwrap();

        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![10, 10, 10, 10, 10, 3]);
        let rebuilt: Vec<String> = groups.iter().flat_map(|g| ids(g)).collect();
        assert_eq!(rebuilt, ids(&requests));
    }

    #[test]
    fn test_by_count_is_capped_at_25() {
        let requests = small_records(60);
        let groups = partition(&requests, &config(BatchWriteOptions::equal_item_count(100))).unwrap();

        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![25, 25, 10]);
    }

    #[test]
    fn test_out_of_range_start_ends_partitioning() {
        let requests = small_records(3);
        let cfg = config(BatchWriteOptions::equal_item_count(2));

        assert!(next_group(&requests, 3, &cfg).unwrap().is_none());
        assert!(next_group(&requests, 100, &cfg).unwrap().is_none());
        assert!(next_group(&[], 0, &cfg).unwrap().is_none());

        let cfg = config(BatchWriteOptions::evenly_distributed_group_wcu(5));
        assert!(next_group(&requests, 3, &cfg).unwrap().is_none());
    }

    #[test]
    fn test_by_wcu_groups_small_items() {
        // every small item costs 1 WCU
        let requests = small_records(10);
        let groups = partition(&requests, &config(BatchWriteOptions::evenly_distributed_group_wcu(4))).unwrap();

        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![4, 4, 2]);
    }

    #[test]
    fn test_by_wcu_oversized_item_is_alone() {
        let requests = vec![record(0, 3000), record(1, 10), record(2, 10)];
        let groups = partition(&requests, &config(BatchWriteOptions::evenly_distributed_group_wcu(2))).unwrap();

        // 3 WCU item exceeds the target but still forms its own group
        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_by_wcu_stops_at_first_item_over_target() {
        let requests = vec![record(0, 10), record(1, 1500), record(2, 10), record(3, 10)];
        let groups = partition(&requests, &config(BatchWriteOptions::evenly_distributed_group_wcu(2))).unwrap();

        // 1 + 2 > 2 and 2 + 1 > 2, so the 2 WCU item sits alone
        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![1, 1, 2]);
    }

    #[test]
    fn test_by_wcu_is_capped_at_25() {
        let requests = small_records(30);
        let groups = partition(&requests, &config(BatchWriteOptions::evenly_distributed_group_wcu(1000))).unwrap();

        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![25, 5]);
    }

    #[test]
    fn test_delete_requests_cost_one_unit() {
        #[derive(Serialize)]
        struct Key {
            id: u32,
        }

        let requests: Vec<WriteRequest> = (0..6).map(|id| delete_request(&Key { id }).unwrap()).collect();
        assert_eq!(write_request_wcu(&requests[0]).unwrap(), 1);

        let groups = partition(&requests, &config(BatchWriteOptions::evenly_distributed_group_wcu(3))).unwrap();
        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![3, 3]);
    }

    #[test]
    fn test_malformed_request_fails_by_wcu() {
        let requests = vec![WriteRequest::builder().build()];
        let err = next_group(&requests, 0, &config(BatchWriteOptions::evenly_distributed_group_wcu(5))).unwrap_err();
        assert!(err.is_validation_error());
    }
}
