//! Excel Query API Server module
//!
//! HTTP REST API over the query engine.
//! Run with `excel-query-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server};
