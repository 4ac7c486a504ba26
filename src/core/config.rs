//! Configuration types for the key-value client and its connection pool

use std::time::Duration;

/// How long an unused connection may sit in the pool before it is discarded
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default Redis port
pub const DEFAULT_PORT: u16 = 6379;

/// Configuration for connection pooling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of connections open at once, idle or in use.
    /// Zero means no limit.
    pub max_active: usize,
    /// Maximum number of idle connections kept for reuse
    pub max_idle: usize,
    /// Idle connections older than this are closed instead of reused.
    /// Zero disables the check.
    pub idle_timeout: Duration,
    /// How long to wait for a free slot when `max_active` is reached.
    /// `None` waits until a connection is released.
    pub wait_timeout: Option<Duration>,
    /// PING idle connections before handing them out
    pub test_on_borrow: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_active: 10,
            max_idle: 5,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            wait_timeout: None,
            test_on_borrow: true,
        }
    }
}

/// Configuration for the key-value client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host name or address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Optional password sent with AUTH on every new connection
    pub password: Option<String>,

    /// Timeout for establishing a new connection
    pub connect_timeout: Duration,

    /// Pool configuration
    pub pool: PoolConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            password: None,
            connect_timeout: Duration::from_secs(5),
            pool: PoolConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration for the given host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the password for authentication. An empty password disables AUTH.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.password = (!password.is_empty()).then_some(password);
        self
    }

    /// Set the maximum number of open connections (zero for no limit)
    #[must_use]
    pub const fn with_max_active(mut self, max_active: usize) -> Self {
        self.pool.max_active = max_active;
        self
    }

    /// Set the maximum number of idle connections
    #[must_use]
    pub const fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.pool.max_idle = max_idle;
        self
    }

    /// Set the idle timeout
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool.idle_timeout = timeout;
        self
    }

    /// Bound the wait for a free connection slot
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.pool.wait_timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the pool configuration
    #[must_use]
    pub fn with_pool_config(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// `host:port` of the server
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
