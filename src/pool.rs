//! Connection pooling
//!
//! A semaphore bounds the number of open connections (`max_active`); a
//! mutex-guarded deque keeps up to `max_idle` connections for reuse. The
//! mutex is never held across an `.await`.
//!
//! Connections are handed out inside a [`PooledConnection`] guard that gives
//! the connection and its slot back on drop, on every path including errors
//! and cancellation. A connection whose last command failed at the transport
//! level, or was interrupted mid-flight, is closed instead of reused.

use crate::command::Command;
use crate::connection::{Connection, ManageConnection};
use crate::core::{
    config::PoolConfig,
    error::{ClientError, ClientResult},
    value::Value,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Snapshot of the pool's connection counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Connections currently open, idle or in use
    pub connections: usize,
    /// Connections sitting idle in the pool
    pub idle: usize,
}

struct IdleConnection<C> {
    conn: C,
    since: Instant,
}

struct PoolInner<M: ManageConnection> {
    manager: M,
    config: PoolConfig,
    semaphore: Arc<Semaphore>,
    idle: Mutex<VecDeque<IdleConnection<M::Connection>>>,
    open: AtomicUsize,
    closed: AtomicBool,
}

impl<M: ManageConnection> PoolInner<M> {
    fn idle(&self) -> MutexGuard<'_, VecDeque<IdleConnection<M::Connection>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn discard(&self, count: usize) {
        self.open.fetch_sub(count, Ordering::AcqRel);
    }

    fn put_back(&self, conn: M::Connection) {
        let mut idle = self.idle();
        if self.closed.load(Ordering::Acquire) || idle.len() >= self.config.max_idle {
            drop(idle);
            self.discard(1);
            return;
        }
        // Most recently used first; expiry is checked from the back.
        idle.push_front(IdleConnection {
            conn,
            since: Instant::now(),
        });
    }
}

/// Releases one open-connection count on drop unless kept
struct OpenSlot<'a, M: ManageConnection> {
    pool: &'a PoolInner<M>,
    kept: bool,
}

impl<'a, M: ManageConnection> OpenSlot<'a, M> {
    fn new(pool: &'a PoolInner<M>) -> Self {
        Self { pool, kept: false }
    }

    fn keep(mut self) {
        self.kept = true;
    }
}

impl<M: ManageConnection> Drop for OpenSlot<'_, M> {
    fn drop(&mut self) {
        if !self.kept {
            self.pool.discard(1);
        }
    }
}

/// Bounded pool of store connections
pub struct ConnectionPool<M: ManageConnection> {
    inner: Arc<PoolInner<M>>,
}

impl<M: ManageConnection> Clone for ConnectionPool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: ManageConnection> ConnectionPool<M> {
    /// Create a new connection pool. No connection is opened until one is
    /// requested.
    pub fn new(manager: M, config: PoolConfig) -> Self {
        let permits = if config.max_active == 0 {
            Semaphore::MAX_PERMITS
        } else {
            config.max_active
        };

        info!(
            "Creating connection pool (max_active={}, max_idle={}, idle_timeout={:?})",
            config.max_active, config.max_idle, config.idle_timeout
        );

        Self {
            inner: Arc::new(PoolInner {
                manager,
                semaphore: Arc::new(Semaphore::new(permits)),
                idle: Mutex::new(VecDeque::with_capacity(config.max_idle)),
                open: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// Get a connection from the pool.
    ///
    /// Waits while `max_active` connections are checked out. Idle
    /// connections are reused (after a health check, when enabled) before a
    /// new one is dialed.
    pub async fn get(&self) -> ClientResult<PooledConnection<M>> {
        let permit = self.acquire_permit().await?;

        while let Some(mut conn) = self.pop_idle() {
            if !self.inner.config.test_on_borrow {
                return Ok(PooledConnection::new(Arc::clone(&self.inner), conn, permit));
            }

            // Counted as open only once the check passes, even if this
            // future is dropped mid-PING.
            let slot = OpenSlot::new(&self.inner);
            match self.inner.manager.is_valid(&mut conn).await {
                Ok(()) => {
                    slot.keep();
                    return Ok(PooledConnection::new(Arc::clone(&self.inner), conn, permit));
                }
                Err(e) => {
                    warn!("Discarding pooled connection that failed health check: {}", e);
                }
            }
        }

        let conn = self.inner.manager.connect().await?;
        self.inner.open.fetch_add(1, Ordering::AcqRel);
        debug!("Opened new pooled connection");
        Ok(PooledConnection::new(Arc::clone(&self.inner), conn, permit))
    }

    async fn acquire_permit(&self) -> ClientResult<OwnedSemaphorePermit> {
        let acquire = Arc::clone(&self.inner.semaphore).acquire_owned();
        let permit = match self.inner.config.wait_timeout {
            Some(limit) => timeout(limit, acquire)
                .await
                .map_err(|_| ClientError::Timeout)?,
            None => acquire.await,
        };
        permit.map_err(|_| ClientError::PoolClosed)
    }

    fn pop_idle(&self) -> Option<M::Connection> {
        let idle_timeout = self.inner.config.idle_timeout;
        let mut idle = self.inner.idle();

        let mut expired = 0;
        if !idle_timeout.is_zero() {
            while idle
                .back()
                .is_some_and(|oldest| oldest.since.elapsed() >= idle_timeout)
            {
                idle.pop_back();
                expired += 1;
            }
        }
        let conn = idle.pop_front().map(|entry| entry.conn);
        drop(idle);

        if expired > 0 {
            debug!("Closed {} expired idle connection(s)", expired);
            self.inner.discard(expired);
        }
        conn
    }

    /// Close the pool: idle connections are dropped, checked-out connections
    /// are closed when released, and later `get` calls fail.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.semaphore.close();

        let drained = self.inner.idle().drain(..).count();
        self.inner.discard(drained);
        info!("Connection pool closed ({} idle connection(s) released)", drained);
    }

    /// Check if [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Current connection counts
    pub fn state(&self) -> PoolState {
        let idle = self.inner.idle().len();
        PoolState {
            connections: self.inner.open.load(Ordering::Acquire),
            idle,
        }
    }
}

/// A connection checked out of the pool. Returned to the pool on drop.
pub struct PooledConnection<M: ManageConnection> {
    pool: Arc<PoolInner<M>>,
    conn: Option<M::Connection>,
    broken: bool,
    // Released after `drop` has put the connection back.
    _permit: OwnedSemaphorePermit,
}

impl<M: ManageConnection> PooledConnection<M> {
    fn new(pool: Arc<PoolInner<M>>, conn: M::Connection, permit: OwnedSemaphorePermit) -> Self {
        Self {
            pool,
            conn: Some(conn),
            broken: false,
            _permit: permit,
        }
    }

    /// Run a command on this connection
    pub async fn run(&mut self, command: &Command) -> ClientResult<Value> {
        let conn = self.conn.as_mut().ok_or(ClientError::PoolClosed)?;

        // Stays set if this future is dropped before the reply arrives.
        self.broken = true;
        let result = conn.run(command).await;
        self.broken = matches!(&result, Err(e) if e.is_connection_error());
        result
    }
}

impl<M: ManageConnection> Drop for PooledConnection<M> {
    fn drop(&mut self) {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => return,
        };

        if self.broken {
            debug!("Closing broken pooled connection");
            drop(conn);
            self.pool.discard(1);
        } else {
            self.pool.put_back(conn);
        }
    }
}
