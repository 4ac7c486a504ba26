//! Connections to the store
//!
//! [`Connection`] runs one command on one connection. [`ManageConnection`]
//! dials new connections and health-checks pooled ones; the pool is generic
//! over it. [`RedisConnectionManager`] is the implementation backed by the
//! `redis` crate.

use crate::command::Command;
use crate::core::{
    config::ClientConfig,
    error::{ClientError, ClientResult},
    value::Value,
};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// A single connection able to run commands
#[async_trait]
pub trait Connection: Send {
    /// Send a command and wait for its reply
    async fn run(&mut self, command: &Command) -> ClientResult<Value>;
}

/// Creates and validates connections for the pool
#[async_trait]
pub trait ManageConnection: Send + Sync + 'static {
    /// The connection type handed out by the pool
    type Connection: Connection + 'static;

    /// Open a new, authenticated connection
    async fn connect(&self) -> ClientResult<Self::Connection>;

    /// Health check run on idle connections before reuse
    async fn is_valid(&self, conn: &mut Self::Connection) -> ClientResult<()> {
        conn.run(&Command::new("PING")).await.map(|_| ())
    }
}

#[async_trait]
impl Connection for MultiplexedConnection {
    async fn run(&mut self, command: &Command) -> ClientResult<Value> {
        let cmd = command.to_cmd();
        let reply: Value = cmd.query_async(self).await?;
        Ok(reply)
    }
}

/// Dials TCP connections to a Redis server and authenticates them
#[derive(Debug, Clone)]
pub struct RedisConnectionManager {
    client: redis::Client,
    address: String,
    connect_timeout: Duration,
}

impl RedisConnectionManager {
    /// Create a manager for the server described by `config`.
    ///
    /// Nothing is dialed here; connections are opened on first use. When a
    /// password is configured, every new connection sends AUTH before it is
    /// handed to the pool.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let host = config.host.trim();
        if host.is_empty() {
            return Err(ClientError::Init("host must not be empty".to_string()));
        }

        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(host.to_string(), config.port),
            redis: RedisConnectionInfo {
                password: config.password.clone(),
                ..Default::default()
            },
        };
        let address = config.address();
        let client = redis::Client::open(info)
            .map_err(|e| ClientError::Init(format!("invalid address {address}: {e}")))?;

        Ok(Self {
            client,
            address,
            connect_timeout: config.connect_timeout,
        })
    }

    /// `host:port` this manager dials
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl ManageConnection for RedisConnectionManager {
    type Connection = MultiplexedConnection;

    async fn connect(&self) -> ClientResult<Self::Connection> {
        debug!("Connecting to Redis at {}", self.address);

        // AUTH, when configured, runs inside the dial and shares its timeout.
        let conn = timeout(
            self.connect_timeout,
            self.client.get_multiplexed_tokio_connection(),
        )
        .await
        .map_err(|_| ClientError::Timeout)??;

        Ok(conn)
    }
}
