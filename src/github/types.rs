//! Wire format of the GitHub GraphQL API.
//!
//! These structs mirror the JSON shape of the starred repositories query.
//! Timestamps and URLs stay as strings here; converting them into the
//! entity model is the job of `storage::serialization`, which fails
//! closed on malformed values.

use serde::{Deserialize, Serialize};

/// GraphQL request body.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: &'a serde_json::Value,
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct StarredRepositoriesData {
    pub viewer: Viewer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub starred_repositories: StarredRepositoryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarredRepositoryConnection {
    pub total_count: u64,
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<StarredRepositoryEdge>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// One starred repository with the edge-level star timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarredRepositoryEdge {
    pub starred_at: String,
    pub node: RepositoryNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub id: String,
    pub name: String,
    pub owner: OwnerNode,
    pub description: Option<String>,
    pub url: String,
    pub homepage_url: Option<String>,
    pub is_archived: bool,
    pub is_fork: bool,
    #[serde(default)]
    pub is_private: bool,
    pub is_template: bool,
    pub latest_release: Option<ReleaseNode>,
    pub license_info: Option<LicenseNode>,
    pub stargazer_count: i64,
    pub fork_count: i64,
    pub created_at: String,
    pub pushed_at: Option<String>,
    pub updated_at: String,
    pub languages: Option<LanguageConnection>,
    #[serde(default)]
    pub repository_topics: RepositoryTopicConnection,
    #[serde(default)]
    pub funding_links: Vec<FundingLinkNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerNode {
    /// `User` or `Organization`.
    #[serde(rename = "__typename")]
    pub typename: String,
    pub login: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNode {
    pub name: Option<String>,
    pub published_at: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseNode {
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub spdx_id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageConnection {
    #[serde(default)]
    pub edges: Vec<LanguageEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageEdge {
    pub node: LanguageNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageNode {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryTopicConnection {
    #[serde(default)]
    pub nodes: Vec<RepositoryTopicNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryTopicNode {
    pub topic: TopicNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNode {
    pub name: String,
    pub stargazer_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingLinkNode {
    pub url: String,
    pub platform: String,
}
