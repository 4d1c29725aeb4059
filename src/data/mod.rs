//! Database access.

pub mod grids;
pub mod health;

pub use grids::{GridStore, PgGridStore};
