//! Wire-format fixtures shared by storage and sync tests.

use serde_json::{Value, json};

use crate::github::types::StarredRepositoryEdge;

/// Fixed star time used when a test does not care about ordering.
const DEFAULT_STARRED_AT: &str = "2024-01-01T00:00:00Z";

fn base_node(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("repo-{}", id.to_lowercase()),
        "owner": {
            "__typename": "User",
            "login": "octocat",
            "url": "https://github.com/octocat"
        },
        "description": format!("Repository {id}"),
        "url": format!("https://github.com/octocat/{id}"),
        "homepageUrl": format!("example.com/{id}"),
        "isArchived": false,
        "isFork": false,
        "isPrivate": false,
        "isTemplate": false,
        "latestRelease": {
            "name": null,
            "publishedAt": "2023-12-24T08:30:00Z",
            "url": format!("https://github.com/octocat/{id}/releases/tag/v1.0.0")
        },
        "licenseInfo": {
            "name": "MIT License",
            "nickname": null,
            "spdxId": "MIT",
            "url": "https://choosealicense.com/licenses/mit/"
        },
        "stargazerCount": 120,
        "forkCount": 7,
        "createdAt": "2020-05-17T09:15:42Z",
        "pushedAt": "2023-12-30T22:01:10Z",
        "updatedAt": "2024-01-01T00:00:00Z",
        "languages": { "edges": [
            { "node": { "name": "Rust" } },
            { "node": { "name": "Shell" } }
        ]},
        "repositoryTopics": { "nodes": [
            { "topic": { "name": "cli", "stargazerCount": 40 } },
            { "topic": { "name": "rust", "stargazerCount": 900 } }
        ]},
        "fundingLinks": [
            { "platform": "GITHUB", "url": "https://github.com/sponsors/octocat" }
        ]
    })
}

/// Build an edge from a default node with the given fields replaced.
///
/// `starredAt` in `overrides` sets the edge-level star time.
pub fn edge_from_json(overrides: Value) -> StarredRepositoryEdge {
    let id = overrides
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("R_0")
        .to_string();
    let mut node = base_node(&id);
    let mut starred_at = Value::String(DEFAULT_STARRED_AT.to_string());

    if let Value::Object(fields) = overrides {
        for (key, value) in fields {
            if key == "starredAt" {
                starred_at = value;
            } else {
                node[key] = value;
            }
        }
    }

    serde_json::from_value(json!({ "starredAt": starred_at, "node": node }))
        .expect("fixture edge must deserialize")
}

fn owner_json(login: &str) -> Value {
    json!({
        "__typename": "User",
        "login": login,
        "url": format!("https://github.com/{login}")
    })
}

/// An edge for `id` owned by `owner`, starred at the default time.
pub fn edge(id: &str, owner: &str) -> StarredRepositoryEdge {
    edge_from_json(json!({ "id": id, "owner": owner_json(owner) }))
}

/// An edge starred `minute` minutes after 2024-01-01T00:00Z.
pub fn starred_edge(id: &str, owner: &str, minute: u32) -> StarredRepositoryEdge {
    edge_from_json(json!({
        "id": id,
        "owner": owner_json(owner),
        "starredAt": format!("2024-01-01T{:02}:{:02}:00Z", minute / 60, minute % 60)
    }))
}

/// An edge whose `createdAt` cannot be parsed.
pub fn malformed_edge(id: &str) -> StarredRepositoryEdge {
    edge_from_json(json!({ "id": id, "createdAt": "not-a-timestamp" }))
}
