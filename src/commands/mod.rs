//! Typed accessors on [`KeyValueClient`](crate::KeyValueClient)
//!
//! Each accessor builds one [`Command`](crate::Command), sends it through
//! [`KeyValueClient::execute`](crate::KeyValueClient::execute) and coerces
//! the reply. They are grouped by the data type they operate on.

pub mod hash;
pub mod keys;
pub mod list;
pub mod pubsub;
pub mod sorted_set;
pub mod strings;
