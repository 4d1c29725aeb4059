//! HTTP API.

pub mod error;
pub mod games;
pub mod middleware;
pub mod routes;
pub mod search;
pub mod status;

pub use routes::*;
