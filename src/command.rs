//! Commands sent to the store
//!
//! A [`Command`] is a name plus an ordered list of binary arguments. It is
//! built per call and handed to the connection, which turns it into a
//! `redis::Cmd` for encoding.

use redis::ToRedisArgs;
use std::fmt;

/// A command name and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<Vec<u8>>,
}

impl Command {
    /// Create a new command with no arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument. Anything the store client can encode is accepted;
    /// a value may expand to several arguments.
    #[must_use]
    pub fn arg<T: ToRedisArgs>(mut self, arg: T) -> Self {
        arg.write_redis_args(&mut self.args);
        self
    }

    /// Get the command name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the encoded arguments
    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Build the store client's command for this name and argument list
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd(&self.name);
        for arg in &self.args {
            cmd.arg(arg.as_slice());
        }
        cmd
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}
