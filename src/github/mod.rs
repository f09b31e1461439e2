//! GitHub GraphQL access.
//!
//! - [`client`] - `reqwest` client with bounded retry
//! - [`pagination`] - Cursor paginator over starred repositories
//! - [`types`] - Wire format of the GraphQL responses
//! - [`queries`] - GraphQL documents

pub mod client;
pub mod pagination;
pub mod queries;
pub mod types;

pub use client::{DEFAULT_ENDPOINT, GitHubClient};
pub use pagination::{
    MAX_PAGE_SIZE, PageSize, StarredPage, StarredRepositories, StarredRepositoriesSource,
};
pub use types::StarredRepositoryEdge;
