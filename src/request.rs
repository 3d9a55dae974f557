//! Write request helpers
//!
//! The SDK models a batch write entry as a struct with two optional members.
//! [`WriteOperation`] is the checked view of it: exactly one of put or delete.

use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, PutRequest, WriteRequest};
use serde::Serialize;
use serde_dynamo::to_item;
use std::collections::HashMap;

use crate::{Error, Item};

/// A write request resolved to the single operation it carries
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WriteOperation<'a> {
    /// Put (insert or replace) of the full item
    Put(&'a Item),
    /// Delete of the item identified by its primary key
    Delete(&'a Item),
}

impl<'a> WriteOperation<'a> {
    /// Classify a write request
    ///
    /// A request carrying neither or both of a put and a delete is rejected.
    pub fn from_request(request: &'a WriteRequest) -> Result<Self, Error> {
        match (&request.put_request, &request.delete_request) {
            (Some(put), None) => Ok(WriteOperation::Put(&put.item)),
            (None, Some(delete)) => Ok(WriteOperation::Delete(&delete.key)),
            (Some(_), Some(_)) => Err(Error::Validation(
                "WriteRequest must contain exactly one of PutRequest or DeleteRequest, found both"
                    .to_string(),
            )),
            (None, None) => Err(Error::Validation(
                "WriteRequest must contain exactly one of PutRequest or DeleteRequest, found neither"
                    .to_string(),
            )),
        }
    }

    /// Whether this is a delete
    pub fn is_delete(&self) -> bool {
        matches!(self, WriteOperation::Delete(_))
    }
}

/// Build a put request from any serializable value
pub fn put_request<T: Serialize>(value: &T) -> Result<WriteRequest, Error> {
    let item = to_item::<_, HashMap<String, AttributeValue>>(value)?;
    let put_request = PutRequest::builder().set_item(Some(item)).build()?;

    Ok(WriteRequest::builder()
        .set_put_request(Some(put_request))
        .build())
}

/// Build a delete request from a serializable primary key
pub fn delete_request<K: Serialize>(key: &K) -> Result<WriteRequest, Error> {
    let key = to_item::<_, HashMap<String, AttributeValue>>(key)?;
    let delete_request = DeleteRequest::builder().set_key(Some(key)).build()?;

    Ok(WriteRequest::builder()
        .set_delete_request(Some(delete_request))
        .build())
}
