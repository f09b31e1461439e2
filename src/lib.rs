//! ghstars - mirror your GitHub stars into a local SQLite store
//!
//! This crate provides the core functionality for the `ghstars` CLI tool.
//!
//! # Architecture
//!
//! - [`github`] - GraphQL client and cursor paginator
//! - [`storage`] - SQLite store, serialization and query facade
//! - [`sync`] - Incremental and full import
//! - [`service`] - Orchestration under the operation lock
//! - [`model`] - Repository entity and value objects
//! - [`config`] - Settings file and path resolution
//! - [`vault`] - Document store for the notes folder
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod lock;
pub mod model;
pub mod service;
pub mod storage;
pub mod sync;
pub mod vault;

pub use error::{Error, Result};
