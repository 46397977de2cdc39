//! Druid query client
//!
//! Issues the fixed `sys.tasks` aggregation against the SQL-over-HTTP API and
//! turns the JSON rows into [`TaskCountRecord`](crate::types::TaskCountRecord)s.

pub mod client;
pub mod decode;
pub mod query;
pub mod source;

pub use client::{DruidClient, QueryError};
pub use decode::{decode_rows, DecodeError};
pub use query::{SqlRequest, TaskQuery};
pub use source::{StaticSource, TaskSource};
