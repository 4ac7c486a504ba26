//! Hash accessors

use crate::client::{Database, KeyValueClient};
use crate::command::Command;
use crate::connection::ManageConnection;
use crate::core::{
    error::{ClientError, ClientResult},
    value::pairs_from_reply,
};
use crate::record;
use redis::ToRedisArgs;
use serde::de::DeserializeOwned;

impl<M: ManageConnection> KeyValueClient<M> {
    /// HMSET: set several fields of a hash at once.
    ///
    /// Fails with [`ClientError::InvalidArgument`] before anything is sent
    /// when `fields` is empty.
    pub async fn set_hash_fields<I, F, V>(&self, db: Database, key: &str, fields: I) -> ClientResult<()>
    where
        I: IntoIterator<Item = (F, V)>,
        F: ToRedisArgs,
        V: ToRedisArgs,
    {
        let mut command = Command::new("HMSET").arg(key);
        let mut count = 0usize;
        for (field, value) in fields {
            command = command.arg(field).arg(value);
            count += 1;
        }
        if count == 0 {
            return Err(ClientError::InvalidArgument(
                "hash fields must not be empty".to_string(),
            ));
        }

        self.execute(db, command).await?;
        Ok(())
    }

    /// HGETALL into a record.
    ///
    /// Returns `Ok(None)` without fetching when the key does not exist.
    /// Existence and fetch are two separate commands: a key deleted between
    /// them yields a record built from no fields at all.
    pub async fn get_all_hash_fields<T: DeserializeOwned>(
        &self,
        db: Database,
        key: &str,
    ) -> ClientResult<Option<T>> {
        let exists: bool = self.query(db, Command::new("EXISTS").arg(key)).await?;
        if !exists {
            return Ok(None);
        }

        let reply = self.execute(db, Command::new("HGETALL").arg(key)).await?;
        let fields = pairs_from_reply(&reply)?;
        record::from_fields(fields).map(Some)
    }
}
