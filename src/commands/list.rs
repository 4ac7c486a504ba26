//! List accessors
//!
//! Values written through [`list_set`](KeyValueClient::list_set) and
//! [`push_left_json`](KeyValueClient::push_left_json) are stored as JSON
//! text; [`push_left`](KeyValueClient::push_left) stores text verbatim.
//! Reads always return the stored text.

use crate::client::{Database, KeyValueClient};
use crate::command::Command;
use crate::connection::ManageConnection;
use crate::core::error::ClientResult;
use serde::Serialize;

impl<M: ManageConnection> KeyValueClient<M> {
    /// LPUSH a text value as-is
    pub async fn push_left(&self, db: Database, key: &str, value: &str) -> ClientResult<()> {
        self.execute(db, Command::new("LPUSH").arg(key).arg(value))
            .await?;
        Ok(())
    }

    /// LPUSH the JSON encoding of `value`
    pub async fn push_left_json<T>(&self, db: Database, key: &str, value: &T) -> ClientResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let text = serde_json::to_string(value)?;
        self.push_left(db, key, &text).await
    }

    /// BRPOP a single list.
    ///
    /// Holds its pooled connection until an element arrives or `timeout_secs`
    /// elapses, and returns an empty string on timeout. A timeout of zero
    /// blocks indefinitely.
    pub async fn blocking_pop_right(
        &self,
        db: Database,
        key: &str,
        timeout_secs: u64,
    ) -> ClientResult<String> {
        let mut popped = self
            .query_strings(db, Command::new("BRPOP").arg(key).arg(timeout_secs))
            .await?;

        // [key, value]
        if popped.len() == 2 {
            Ok(popped.pop().unwrap_or_default())
        } else {
            Ok(String::new())
        }
    }

    /// LLEN
    pub async fn list_length(&self, db: Database, key: &str) -> ClientResult<i64> {
        self.query(db, Command::new("LLEN").arg(key)).await
    }

    /// LRANGE, inclusive on both ends; negative indexes count from the tail
    pub async fn list_range(
        &self,
        db: Database,
        key: &str,
        start: i64,
        stop: i64,
    ) -> ClientResult<Vec<String>> {
        self.query_strings(db, Command::new("LRANGE").arg(key).arg(start).arg(stop))
            .await
    }

    /// LPOP. An empty list is a type error.
    pub async fn pop_left(&self, db: Database, key: &str) -> ClientResult<String> {
        self.query(db, Command::new("LPOP").arg(key)).await
    }

    /// LSET the JSON encoding of `value` at `index`
    pub async fn list_set<T>(&self, db: Database, key: &str, index: i64, value: &T) -> ClientResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let text = serde_json::to_string(value)?;
        self.execute(db, Command::new("LSET").arg(key).arg(index).arg(text))
            .await?;
        Ok(())
    }

    /// LINDEX. An index out of range is a type error.
    pub async fn list_index(&self, db: Database, key: &str, index: i64) -> ClientResult<String> {
        self.query(db, Command::new("LINDEX").arg(key).arg(index)).await
    }
}
