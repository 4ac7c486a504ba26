//! String and existence accessors

use crate::client::{Database, KeyValueClient};
use crate::command::Command;
use crate::connection::ManageConnection;
use crate::core::error::ClientResult;

impl<M: ManageConnection> KeyValueClient<M> {
    /// GET a key as a string. A missing key is a type error.
    pub async fn get_string(&self, db: Database, key: &str) -> ClientResult<String> {
        self.query(db, Command::new("GET").arg(key)).await
    }

    /// GET a key as a 32-bit integer
    pub async fn get_int(&self, db: Database, key: &str) -> ClientResult<i32> {
        self.query(db, Command::new("GET").arg(key)).await
    }

    /// GET a key as a 64-bit integer
    pub async fn get_int64(&self, db: Database, key: &str) -> ClientResult<i64> {
        self.query(db, Command::new("GET").arg(key)).await
    }

    /// EXISTS: 1 if the key exists, 0 otherwise
    pub async fn is_key_exist(&self, db: Database, key: &str) -> ClientResult<i64> {
        self.query(db, Command::new("EXISTS").arg(key)).await
    }
}
