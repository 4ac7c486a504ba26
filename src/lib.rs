//! Pooled, per-database typed access to a Redis server
//!
//! `redis-kv-client` wraps a bounded pool of Redis connections behind a
//! small typed API. Every call names the logical database it targets; the
//! client borrows a connection, selects that database, runs the command and
//! returns the connection to the pool.
//!
//! # Features
//!
//! - Bounded connection pool with idle limit, idle timeout and PING on borrow
//! - Per-call logical database selection
//! - Typed accessors for strings, hashes, lists, sorted sets, keys and pub/sub
//! - Hash fields deserialized straight into `serde` records
//! - Async/await support with Tokio
//!
//! # Quick Start
//!
//! ```no_run
//! use redis_kv_client::{ClientConfig, KeyValueClient};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KeyValueClient::new(ClientConfig::new("127.0.0.1", 6379))?;
//!
//!     client
//!         .set_hash_fields(1, "user:1", [("name", "ada"), ("age", "36")])
//!         .await?;
//!     if let Some(user) = client.get_all_hash_fields::<User>(1, "user:1").await? {
//!         println!("{} is {}", user.name, user.age);
//!     }
//!
//!     client.push_left(0, "jobs", "resize:42").await?;
//!     let job = client.blocking_pop_right(0, "jobs", 5).await?;
//!     println!("next job: {job}");
//!
//!     client.close();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod client;
pub mod command;
pub mod commands;
pub mod connection;
pub mod core;
pub mod pool;
pub mod record;

#[cfg(test)]
mod mock;

pub use client::{Database, KeyValueClient};
pub use command::Command;
pub use connection::{Connection, ManageConnection, RedisConnectionManager};
pub use pool::{ConnectionPool, PoolState, PooledConnection};

pub use crate::core::{
    config::{ClientConfig, PoolConfig, DEFAULT_IDLE_TIMEOUT, DEFAULT_PORT},
    error::{ClientError, ClientResult},
    value::Value,
};
