//! Persistence: the Postgres pool and the named JSON stores built on it.
//! Connection and schema setup live in `init`; `data_map` holds the stores themselves.

pub mod data_map;
pub mod init;

pub use data_map::DataMap;
pub use init::{DbPool, connect, ensure_schema};
