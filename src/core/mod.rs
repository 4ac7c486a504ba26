//! Core types shared by the pool, the connections and the client

pub mod config;
pub mod error;
pub mod value;
