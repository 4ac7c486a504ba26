//! Pooled key-value client
//!
//! This module provides [`KeyValueClient`], a pool of connections plus the
//! single primitive every typed accessor goes through:
//! [`execute`](KeyValueClient::execute). The accessors themselves live in
//! [`crate::commands`], grouped by data type.

use crate::command::Command;
use crate::connection::{ManageConnection, RedisConnectionManager};
use crate::core::{
    config::{ClientConfig, PoolConfig},
    error::ClientResult,
    value::{from_reply, strings_from_reply, Value},
};
use crate::pool::{ConnectionPool, PoolState};
use redis::FromRedisValue;
use tracing::{debug, info, warn};

/// Logical database index.
///
/// A default server offers databases 0 to 15; see
/// [`execute`](KeyValueClient::execute) for what happens above that.
pub type Database = u8;

/// Key-value client with per-database typed accessors
///
/// Every call borrows one connection from the pool, selects the requested
/// logical database on it, runs the command and gives the connection back.
/// The client is cheap to clone; clones share the pool.
pub struct KeyValueClient<M: ManageConnection = RedisConnectionManager> {
    pool: ConnectionPool<M>,
}

impl<M: ManageConnection> Clone for KeyValueClient<M> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

impl KeyValueClient {
    /// Build a client for the server described by `config`.
    ///
    /// Connections are opened on first use; this only fails when the
    /// configuration cannot describe a usable pool.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use redis_kv_client::{ClientConfig, KeyValueClient};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = ClientConfig::new("127.0.0.1", 6379)
    ///         .with_password("secret")
    ///         .with_max_active(16)
    ///         .with_max_idle(4);
    ///     let client = KeyValueClient::new(config)?;
    ///
    ///     let name = client.get_string(0, "user:1:name").await?;
    ///     println!("{name}");
    ///
    ///     client.close();
    ///     Ok(())
    /// }
    /// ```
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let manager = RedisConnectionManager::new(&config)?;
        info!("Creating key-value client for {}", manager.address());
        Ok(Self::with_manager(manager, config.pool))
    }
}

impl<M: ManageConnection> KeyValueClient<M> {
    /// Build a client over any connection manager
    pub fn with_manager(manager: M, pool: PoolConfig) -> Self {
        Self {
            pool: ConnectionPool::new(manager, pool),
        }
    }

    /// Release all pooled connections. Calls made afterwards fail with
    /// [`ClientError::PoolClosed`](crate::ClientError::PoolClosed).
    pub fn close(&self) {
        self.pool.close();
    }

    /// Open and idle connection counts
    pub fn pool_state(&self) -> PoolState {
        self.pool.state()
    }

    /// Run `command` against logical database `db` and return the raw reply.
    ///
    /// Waits for a pooled connection, issues `SELECT db` on it (a failed
    /// select is logged and otherwise ignored), then issues the command. The
    /// connection goes back to the pool whatever the outcome.
    ///
    /// When the server rejects the SELECT, for instance a `db` above 15 on a
    /// default configuration, the command runs against whichever database
    /// the pooled connection had selected before.
    pub async fn execute(&self, db: Database, command: Command) -> ClientResult<Value> {
        let mut conn = self.pool.get().await?;

        let select = Command::new("SELECT").arg(i64::from(db));
        if let Err(e) = conn.run(&select).await {
            warn!("SELECT {} failed, running {} anyway: {}", db, command.name(), e);
        }

        debug!("db {}: {}", db, command.name());
        conn.run(&command).await
    }

    /// Execute and coerce a scalar reply
    pub(crate) async fn query<T: FromRedisValue>(
        &self,
        db: Database,
        command: Command,
    ) -> ClientResult<T> {
        let reply = self.execute(db, command).await?;
        from_reply(&reply)
    }

    /// Execute and coerce a multi-bulk reply into strings
    pub(crate) async fn query_strings(
        &self,
        db: Database,
        command: Command,
    ) -> ClientResult<Vec<String>> {
        let reply = self.execute(db, command).await?;
        strings_from_reply(&reply)
    }
}
