//! SQLite storage for starred repositories.
//!
//! The database is held in memory and written to a single file on every
//! save, so the store can live inside a synced notes folder.
//!
//! # Submodules
//!
//! - [`database`] - Connection lifecycle and durable save
//! - [`schema`] - Database schema
//! - [`serialization`] - Wire, entity and row conversions
//! - [`stars`] - Query facade
//! - [`queries`] - SQL statements

pub mod database;
pub mod queries;
pub mod schema;
pub mod serialization;
pub mod stars;

pub use database::StarsDatabase;
pub use stars::{RemovedRepository, Stats, StarsStorage};
