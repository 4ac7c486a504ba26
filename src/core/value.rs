//! Store replies and their coercion into Rust types

use crate::core::error::{ClientError, ClientResult};
use redis::FromRedisValue;

pub use redis::Value;

/// Coerce a reply into `T`.
///
/// A nil reply is a type error: GET on a missing key, LPOP on an empty list
/// or LINDEX out of range all surface here.
pub fn from_reply<T: FromRedisValue>(reply: &Value) -> ClientResult<T> {
    if let Value::Nil = reply {
        return Err(ClientError::Type("Value is nil".to_string()));
    }
    redis::from_redis_value(reply).map_err(|e| ClientError::Type(e.to_string()))
}

/// Coerce a multi-bulk reply into strings. A nil reply yields an empty list.
pub fn strings_from_reply(reply: &Value) -> ClientResult<Vec<String>> {
    match reply {
        Value::Nil => Ok(Vec::new()),
        Value::Bulk(_) => {
            redis::from_redis_value(reply).map_err(|e| ClientError::Type(e.to_string()))
        }
        other => Err(ClientError::Type(format!(
            "Cannot convert {other:?} to a list of strings"
        ))),
    }
}

/// Split a flat `field, value, field, value, ...` reply into pairs
pub fn pairs_from_reply(reply: &Value) -> ClientResult<Vec<(String, String)>> {
    let items = strings_from_reply(reply)?;
    if items.len() % 2 != 0 {
        return Err(ClientError::Type(format!(
            "Expected an even number of items, got {}",
            items.len()
        )));
    }

    let mut pairs = Vec::with_capacity(items.len() / 2);
    let mut items = items.into_iter();
    while let (Some(field), Some(value)) = (items.next(), items.next()) {
        pairs.push((field, value));
    }
    Ok(pairs)
}
