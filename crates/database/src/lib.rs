//! # Database Crate
//!
//! This crate fetches an assessment SQLite database from blob storage, opens
//! it, and turns query results into Polars `DataFrame`s.
//!
//! ## Architectural Principles
//!
//! - **Download, then open:** A `Database` always starts from a fresh copy of
//!   the remote file; the local copy is overwritten on every open and never
//!   deleted.
//! - **Errors go up:** Open failures and query failures are distinct `DbError`
//!   kinds. Nothing in this crate terminates the process; that decision belongs
//!   to the binary.
//! - **Whole results:** Every query is materialised completely in memory.
//!
//! ## Public API
//!
//! - `Database`: The handle (`open`, `query_to_dataframe`, `close`).
//! - `query_data_from_database`: Open, query and close in one call.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod frame;
pub mod orchestrator;
#[cfg(feature = "testkit")]
pub mod testkit;

// Re-export the key components to create a clean, public-facing API.
pub use connection::Database;
pub use error::DbError;
pub use orchestrator::{query_data_from_database, query_data_with_source};
