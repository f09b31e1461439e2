//! Conversions between the wire format, the entity model and stored rows.
//!
//! Both directions fail closed: a malformed timestamp or URL, or a row
//! whose columns have the wrong type, yields `DeserializationFailed`
//! rather than a partially-filled repository.
//!
//! Timestamps are truncated to milliseconds on the way in so that
//! `from_stored_row(to_stored_row(r))` reproduces `r` exactly.

use chrono::{DateTime, DurationRound, SecondsFormat, TimeDelta, Utc};
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::github::types::{LicenseNode, ReleaseNode, StarredRepositoryEdge};
use crate::model::{FundingLink, FundingPlatform, LicenseInfo, Owner, Release, Repository, Topic};

const ORGANIZATION_TYPENAME: &str = "Organization";

/// Format a timestamp the way it is stored.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp, truncated to milliseconds.
///
/// # Errors
///
/// Returns `DeserializationFailed` naming the field on malformed input.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .map_err(|e| invalid(field, value, &e))?
        .with_timezone(&Utc);
    parsed
        .duration_trunc(TimeDelta::milliseconds(1))
        .map_err(|e| invalid(field, value, &e))
}

fn parse_optional_timestamp(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(field, v)).transpose()
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| invalid(field, value, &e))
}

/// Normalize a user-supplied URL (homepage, funding link).
///
/// Trims whitespace, resolves protocol-relative `//host` and bare
/// `host/path` forms to https, then parses.
///
/// # Errors
///
/// Returns `DeserializationFailed` if the result is still not a URL.
pub fn normalize_url(field: &str, value: &str) -> Result<Url> {
    let trimmed = value.trim();
    let candidate = if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{rest}")
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    parse_url(field, &candidate)
}

/// Empty or blank homepages are reported by GitHub as `""`.
fn normalize_homepage(value: Option<&str>) -> Result<Option<Url>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => normalize_url("homepageUrl", v).map(Some),
    }
}

fn normalize_description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
}

fn invalid(field: &str, value: &str, err: &dyn std::fmt::Display) -> Error {
    Error::DeserializationFailed(format!("{field}: invalid value '{value}': {err}"))
}

fn sort_topics(topics: &mut [Topic]) {
    topics.sort_by(|a, b| {
        b.stargazer_count
            .cmp(&a.stargazer_count)
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn release_from_wire(node: &ReleaseNode) -> Result<Release> {
    Ok(Release {
        name: node.name.clone(),
        published_at: parse_optional_timestamp(
            "latestRelease.publishedAt",
            node.published_at.as_deref(),
        )?,
        url: parse_url("latestRelease.url", &node.url)?,
    })
}

fn license_from_wire(node: &LicenseNode) -> Result<LicenseInfo> {
    Ok(LicenseInfo {
        spdx_id: node.spdx_id.clone(),
        name: node.name.clone(),
        nickname: node.nickname.clone(),
        url: node
            .url
            .as_deref()
            .map(|u| parse_url("licenseInfo.url", u))
            .transpose()?,
    })
}

/// Convert one GraphQL edge into a repository.
///
/// `imported_at` and `unstarred_at` are left empty; they are assigned by
/// the store.
///
/// # Errors
///
/// Returns `DeserializationFailed` on any malformed timestamp or URL.
pub fn from_wire_format(edge: &StarredRepositoryEdge) -> Result<Repository> {
    let node = &edge.node;

    let mut topics: Vec<Topic> = node
        .repository_topics
        .nodes
        .iter()
        .map(|n| Topic::new(n.topic.name.clone(), n.topic.stargazer_count))
        .collect();
    sort_topics(&mut topics);

    let funding_links = node
        .funding_links
        .iter()
        .map(|link| {
            Ok(FundingLink {
                url: normalize_url("fundingLinks.url", &link.url)?,
                platform: FundingPlatform::from_wire(&link.platform),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Repository {
        id: node.id.clone(),
        name: node.name.clone(),
        description: normalize_description(node.description.as_deref()),
        url: parse_url("url", &node.url)?,
        homepage_url: normalize_homepage(node.homepage_url.as_deref())?,
        owner: Owner {
            login: node.owner.login.clone(),
            url: parse_url("owner.url", &node.owner.url)?,
            is_organization: node.owner.typename == ORGANIZATION_TYPENAME,
        },
        is_archived: node.is_archived,
        is_fork: node.is_fork,
        is_private: node.is_private,
        is_template: node.is_template,
        latest_release: node.latest_release.as_ref().map(release_from_wire).transpose()?,
        license_info: node.license_info.as_ref().map(license_from_wire).transpose()?,
        stargazer_count: node.stargazer_count,
        fork_count: node.fork_count,
        created_at: parse_timestamp("createdAt", &node.created_at)?,
        pushed_at: parse_optional_timestamp("pushedAt", node.pushed_at.as_deref())?,
        starred_at: parse_timestamp("starredAt", &edge.starred_at)?,
        updated_at: parse_timestamp("updatedAt", &node.updated_at)?,
        imported_at: None,
        unstarred_at: None,
        languages: node
            .languages
            .as_ref()
            .map(|l| l.edges.iter().map(|e| e.node.name.clone()).collect())
            .unwrap_or_default(),
        repository_topics: topics,
        funding_links,
    })
}

// ── Stored form ───────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct StoredRelease {
    name: Option<String>,
    published_at: Option<String>,
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredFundingLink {
    url: String,
    platform: String,
}

/// One repository joined with its owner and license, as read from or
/// written to the database. Topics live in their own table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRepositoryRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub homepage_url: Option<String>,
    pub owner_login: String,
    pub owner_url: String,
    pub owner_is_organization: bool,
    pub is_archived: bool,
    pub is_fork: bool,
    pub is_private: bool,
    pub is_template: bool,
    /// JSON object `{name, published_at, url}`.
    pub latest_release: Option<String>,
    pub license: Option<String>,
    pub license_name: Option<String>,
    pub license_nickname: Option<String>,
    pub license_url: Option<String>,
    pub stargazer_count: i64,
    pub fork_count: i64,
    pub created_at: String,
    pub pushed_at: Option<String>,
    pub starred_at: String,
    pub updated_at: String,
    pub imported_at: String,
    pub unstarred_at: Option<String>,
    /// JSON array of language names.
    pub languages: Option<String>,
    /// JSON array of `{url, platform}`.
    pub funding_links: Option<String>,
}

impl StoredRepositoryRow {
    /// Read a row selected with the column aliases of
    /// `queries::SELECT_REPOSITORIES`.
    ///
    /// # Errors
    ///
    /// Returns the SQLite error for a missing column or a type mismatch.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            url: row.get("url")?,
            homepage_url: row.get("homepage_url")?,
            owner_login: row.get("owner_login")?,
            owner_url: row.get("owner_url")?,
            owner_is_organization: row.get("owner_is_organization")?,
            is_archived: row.get("is_archived")?,
            is_fork: row.get("is_fork")?,
            is_private: row.get("is_private")?,
            is_template: row.get("is_template")?,
            latest_release: row.get("latest_release")?,
            license: row.get("license")?,
            license_name: row.get("license_name")?,
            license_nickname: row.get("license_nickname")?,
            license_url: row.get("license_url")?,
            stargazer_count: row.get("stargazer_count")?,
            fork_count: row.get("fork_count")?,
            created_at: row.get("created_at")?,
            pushed_at: row.get("pushed_at")?,
            starred_at: row.get("starred_at")?,
            updated_at: row.get("updated_at")?,
            imported_at: row.get("imported_at")?,
            unstarred_at: row.get("unstarred_at")?,
            languages: row.get("languages")?,
            funding_links: row.get("funding_links")?,
        })
    }
}

/// Convert a repository into its stored row.
///
/// `imported_at` is used only when the repository has none yet. A license
/// without an SPDX id has no storage key and is not persisted.
///
/// # Errors
///
/// Returns `Json` if an embedded JSON column cannot be encoded.
pub fn to_stored_row(repo: &Repository, imported_at: DateTime<Utc>) -> Result<StoredRepositoryRow> {
    let latest_release = repo
        .latest_release
        .as_ref()
        .map(|r| {
            serde_json::to_string(&StoredRelease {
                name: r.name.clone(),
                published_at: r.published_at.as_ref().map(format_timestamp),
                url: r.url.to_string(),
            })
        })
        .transpose()?;

    let funding_links: Vec<StoredFundingLink> = repo
        .funding_links
        .iter()
        .map(|l| StoredFundingLink {
            url: l.url.to_string(),
            platform: l.platform.as_wire_str().to_string(),
        })
        .collect();

    let license = repo
        .license_info
        .as_ref()
        .filter(|l| l.spdx_id.is_some());

    Ok(StoredRepositoryRow {
        id: repo.id.clone(),
        name: repo.name.clone(),
        description: repo.description.clone(),
        url: repo.url.to_string(),
        homepage_url: repo.homepage_url.as_ref().map(Url::to_string),
        owner_login: repo.owner.login.clone(),
        owner_url: repo.owner.url.to_string(),
        owner_is_organization: repo.owner.is_organization,
        is_archived: repo.is_archived,
        is_fork: repo.is_fork,
        is_private: repo.is_private,
        is_template: repo.is_template,
        latest_release,
        license: license.and_then(|l| l.spdx_id.clone()),
        license_name: license.and_then(|l| l.name.clone()),
        license_nickname: license.and_then(|l| l.nickname.clone()),
        license_url: license.and_then(|l| l.url.as_ref().map(Url::to_string)),
        stargazer_count: repo.stargazer_count,
        fork_count: repo.fork_count,
        created_at: format_timestamp(&repo.created_at),
        pushed_at: repo.pushed_at.as_ref().map(format_timestamp),
        starred_at: format_timestamp(&repo.starred_at),
        updated_at: format_timestamp(&repo.updated_at),
        imported_at: format_timestamp(&repo.imported_at.unwrap_or(imported_at)),
        unstarred_at: repo.unstarred_at.as_ref().map(format_timestamp),
        languages: Some(serde_json::to_string(&repo.languages)?),
        funding_links: Some(serde_json::to_string(&funding_links)?),
    })
}

fn decode_json<T: DeserializeOwned>(field: &str, value: &str) -> Result<T> {
    serde_json::from_str(value).map_err(|e| invalid(field, value, &e))
}

/// Convert a stored row back into a repository, without topics.
///
/// # Errors
///
/// Returns `DeserializationFailed` if any column holds a malformed value.
pub fn from_stored_row(row: StoredRepositoryRow) -> Result<Repository> {
    let latest_release = row
        .latest_release
        .as_deref()
        .map(|json| {
            let stored: StoredRelease = decode_json("latest_release", json)?;
            Ok::<_, Error>(Release {
                name: stored.name,
                published_at: parse_optional_timestamp(
                    "latest_release.published_at",
                    stored.published_at.as_deref(),
                )?,
                url: parse_url("latest_release.url", &stored.url)?,
            })
        })
        .transpose()?;

    let license_info = row
        .license
        .map(|spdx_id| {
            Ok::<_, Error>(LicenseInfo {
                spdx_id: Some(spdx_id),
                name: row.license_name,
                nickname: row.license_nickname,
                url: row
                    .license_url
                    .as_deref()
                    .map(|u| parse_url("license_url", u))
                    .transpose()?,
            })
        })
        .transpose()?;

    let languages: Vec<String> = row
        .languages
        .as_deref()
        .map(|json| decode_json("languages", json))
        .transpose()?
        .unwrap_or_default();

    let funding_links = row
        .funding_links
        .as_deref()
        .map(|json| decode_json::<Vec<StoredFundingLink>>("funding_links", json))
        .transpose()?
        .unwrap_or_default()
        .into_iter()
        .map(|l| {
            Ok(FundingLink {
                url: normalize_url("funding_links.url", &l.url)?,
                platform: FundingPlatform::from_wire(&l.platform),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Repository {
        url: parse_url("url", &row.url)?,
        homepage_url: normalize_homepage(row.homepage_url.as_deref())?,
        owner: Owner {
            url: parse_url("owner_url", &row.owner_url)?,
            login: row.owner_login,
            is_organization: row.owner_is_organization,
        },
        id: row.id,
        name: row.name,
        description: normalize_description(row.description.as_deref()),
        is_archived: row.is_archived,
        is_fork: row.is_fork,
        is_private: row.is_private,
        is_template: row.is_template,
        latest_release,
        license_info,
        stargazer_count: row.stargazer_count,
        fork_count: row.fork_count,
        created_at: parse_timestamp("created_at", &row.created_at)?,
        pushed_at: parse_optional_timestamp("pushed_at", row.pushed_at.as_deref())?,
        starred_at: parse_timestamp("starred_at", &row.starred_at)?,
        updated_at: parse_timestamp("updated_at", &row.updated_at)?,
        imported_at: Some(parse_timestamp("imported_at", &row.imported_at)?),
        unstarred_at: parse_optional_timestamp("unstarred_at", row.unstarred_at.as_deref())?,
        languages,
        repository_topics: Vec::new(),
        funding_links,
    })
}

/// Attach topics read from the join table, in display order.
pub fn attach_topics(repo: &mut Repository, mut topics: Vec<Topic>) {
    sort_topics(&mut topics);
    repo.repository_topics = topics;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fixtures::{edge, edge_from_json};

    #[test]
    fn test_from_wire_format_maps_fields() {
        let repo = from_wire_format(&edge("R_1", "alice")).unwrap();

        assert_eq!(repo.id, "R_1");
        assert_eq!(repo.owner.login, "alice");
        assert!(!repo.owner.is_organization);
        assert_eq!(repo.main_language(), "Rust");
        assert_eq!(repo.homepage_url.as_ref().unwrap().as_str(), "https://example.com/R_1");
        assert_eq!(repo.imported_at, None);
        assert_eq!(repo.unstarred_at, None);
        assert_eq!(repo.funding_links[0].platform, FundingPlatform::GitHub);
    }

    #[test]
    fn test_organization_owner() {
        let wire = edge_from_json(serde_json::json!({
            "id": "R_1",
            "owner": {
                "__typename": "Organization",
                "login": "rust-lang",
                "url": "https://github.com/rust-lang"
            }
        }));
        assert!(from_wire_format(&wire).unwrap().owner.is_organization);
    }

    #[test]
    fn test_topics_sorted_by_stars_then_name() {
        let wire = edge_from_json(serde_json::json!({
            "id": "R_1",
            "repositoryTopics": { "nodes": [
                { "topic": { "name": "cli", "stargazerCount": 5 } },
                { "topic": { "name": "rust", "stargazerCount": 90 } },
                { "topic": { "name": "async", "stargazerCount": 5 } }
            ]}
        }));
        let repo = from_wire_format(&wire).unwrap();
        let names: Vec<&str> = repo.repository_topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "async", "cli"]);
    }

    #[test]
    fn test_malformed_timestamp_fails_closed() {
        let wire = edge_from_json(serde_json::json!({ "id": "R_1", "createdAt": "yesterday" }));
        let err = from_wire_format(&wire).unwrap_err();
        assert!(matches!(err, Error::DeserializationFailed(msg) if msg.contains("createdAt")));
    }

    #[test]
    fn test_url_normalization() {
        assert_eq!(
            normalize_url("f", "//ko-fi.com/someone").unwrap().as_str(),
            "https://ko-fi.com/someone"
        );
        assert_eq!(
            normalize_url("f", " example.org/docs ").unwrap().as_str(),
            "https://example.org/docs"
        );
        assert_eq!(
            normalize_url("f", "http://example.org").unwrap().as_str(),
            "http://example.org/"
        );
        assert!(normalize_url("f", "https://").is_err());
    }

    #[test]
    fn test_blank_homepage_and_description_are_absent() {
        let wire = edge_from_json(serde_json::json!({
            "id": "R_1",
            "homepageUrl": "  ",
            "description": "   "
        }));
        let repo = from_wire_format(&wire).unwrap();
        assert_eq!(repo.homepage_url, None);
        assert_eq!(repo.description, None);
    }

    #[test]
    fn test_stored_row_round_trip() {
        let mut repo = from_wire_format(&edge("R_1", "alice")).unwrap();
        let imported_at = parse_timestamp("t", "2024-05-01T10:00:00.123Z").unwrap();

        let row = to_stored_row(&repo, imported_at).unwrap();
        let mut restored = from_stored_row(row).unwrap();
        attach_topics(&mut restored, repo.repository_topics.clone());

        assert_eq!(restored.imported_at, Some(imported_at));
        restored.imported_at = None;
        repo.imported_at = None;
        assert_eq!(restored, repo);
    }

    #[test]
    fn test_license_without_spdx_id_is_not_stored() {
        let wire = edge_from_json(serde_json::json!({
            "id": "R_1",
            "licenseInfo": { "name": "Other", "nickname": null, "spdxId": null, "url": null }
        }));
        let repo = from_wire_format(&wire).unwrap();
        assert!(repo.license_info.is_some());

        let row = to_stored_row(&repo, Utc::now()).unwrap();
        assert_eq!(row.license, None);
        assert_eq!(row.license_name, None);
    }

    #[test]
    fn test_malformed_stored_json_fails_closed() {
        let repo = from_wire_format(&edge("R_1", "alice")).unwrap();
        let mut row = to_stored_row(&repo, Utc::now()).unwrap();
        row.languages = Some("not json".to_string());
        assert!(matches!(
            from_stored_row(row),
            Err(Error::DeserializationFailed(_))
        ));
    }

    #[test]
    fn test_timestamps_truncate_to_millis() {
        let ts = parse_timestamp("t", "2024-01-02T03:04:05.123456789+02:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-02T01:04:05.123Z");
    }
}
