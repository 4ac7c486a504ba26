//! Key management accessors

use crate::client::{Database, KeyValueClient};
use crate::command::Command;
use crate::connection::ManageConnection;
use crate::core::error::ClientResult;
use tracing::debug;

/// Expirations are always set in this database, whatever the caller asks for.
const EXPIRE_DATABASE: Database = 0;

impl<M: ManageConnection> KeyValueClient<M> {
    /// EXPIRE a key after `seconds`.
    ///
    /// The command always runs against logical database 0; `db` is accepted
    /// for signature symmetry with the other accessors but not used.
    pub async fn set_expire(&self, db: Database, key: &str, seconds: i64) -> ClientResult<()> {
        if db != EXPIRE_DATABASE {
            debug!(
                "EXPIRE {} requested on db {}, issuing on db {}",
                key, db, EXPIRE_DATABASE
            );
        }
        self.execute(EXPIRE_DATABASE, Command::new("EXPIRE").arg(key).arg(seconds))
            .await?;
        Ok(())
    }

    /// KEYS matching a glob pattern.
    ///
    /// KEYS walks the whole keyspace of the database and the reply is
    /// unbounded; avoid it on large or busy databases.
    pub async fn keys_matching(&self, db: Database, pattern: &str) -> ClientResult<Vec<String>> {
        self.query_strings(db, Command::new("KEYS").arg(pattern))
            .await
    }

    /// Delete every key matching a glob pattern, one DEL per key.
    ///
    /// Not atomic: keys created after the listing survive. Stops at the first
    /// failed DEL and returns its error, leaving the remaining keys in place.
    pub async fn delete_keys_matching(&self, db: Database, pattern: &str) -> ClientResult<()> {
        let keys = self.keys_matching(db, pattern).await?;
        debug!("Deleting {} key(s) matching {} on db {}", keys.len(), pattern, db);

        for key in &keys {
            self.delete_key(db, key).await?;
        }
        Ok(())
    }

    /// DEL a single key
    pub async fn delete_key(&self, db: Database, key: &str) -> ClientResult<()> {
        self.execute(db, Command::new("DEL").arg(key)).await?;
        Ok(())
    }
}
