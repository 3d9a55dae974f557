//! Item size estimation
//!
//! Approximates the storage size of an item the way the service documents it
//! (<https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/CapacityUnitCalculations.html>),
//! so that capacity units can be estimated before a request is sent.
//!
//! Strings are counted as one byte per character, which is exact for
//! alphanumeric text. Numbers are counted in their string form.

use aws_sdk_dynamodb::types::AttributeValue;

use crate::Error;
use crate::Item;

/// Bytes covered by one write capacity unit
pub const WRITE_CAPACITY_UNIT_BYTES: usize = 1024;

/// Bytes covered by one (strongly consistent) read capacity unit
pub const READ_CAPACITY_UNIT_BYTES: usize = 4096;

/// Overhead of a list or map attribute
const DOCUMENT_OVERHEAD: usize = 3;

/// Estimates the size of an item in bytes
///
/// Fails for binary attributes, which are not supported, and for attribute
/// variants unknown to this version of the SDK.
pub fn estimate_item_size(item: &Item) -> Result<usize, Error> {
    item.iter().try_fold(0, |total, (name, value)| {
        Ok::<_, Error>(total + estimate_attribute_size(Some(name.as_str()), value)?)
    })
}

/// Estimates the write capacity units consumed when writing `item`
pub fn estimate_write_capacity_units(item: &Item) -> Result<usize, Error> {
    Ok(estimate_item_size(item)?.div_ceil(WRITE_CAPACITY_UNIT_BYTES))
}

/// Estimates the read capacity units consumed when reading `item`
pub fn estimate_read_capacity_units(item: &Item) -> Result<usize, Error> {
    Ok(estimate_item_size(item)?.div_ceil(READ_CAPACITY_UNIT_BYTES))
}

fn estimate_attribute_size(name: Option<&str>, value: &AttributeValue) -> Result<usize, Error> {
    let name_bytes = name.map_or(0, text_len);

    let value_bytes = match value {
        AttributeValue::Null(_) | AttributeValue::Bool(_) => 1,
        AttributeValue::N(text) | AttributeValue::S(text) => text_len(text),
        AttributeValue::Ns(set) | AttributeValue::Ss(set) => set.iter().map(|e| text_len(e)).sum(),
        AttributeValue::L(list) => list.iter().try_fold(DOCUMENT_OVERHEAD, |total, v| {
            Ok::<_, Error>(total + estimate_attribute_size(None, v)?)
        })?,
        AttributeValue::M(map) => map.iter().try_fold(DOCUMENT_OVERHEAD, |total, (k, v)| {
            Ok::<_, Error>(total + estimate_attribute_size(Some(k.as_str()), v)?)
        })?,
        AttributeValue::B(_) => {
            return Err(Error::NotYetImplemented(
                "DynamoDB Binary data type is not yet supported".to_string(),
            ));
        }
        AttributeValue::Bs(_) => {
            return Err(Error::NotYetImplemented(
                "DynamoDB BinarySet data type is not yet supported".to_string(),
            ));
        }
        other => {
            return Err(Error::Validation(format!(
                "Invalid attribute type {:?}",
                other
            )));
        }
    };

    Ok(name_bytes + value_bytes)
}

#[inline]
fn text_len(text: &str) -> usize {
    text.chars().count()
}
