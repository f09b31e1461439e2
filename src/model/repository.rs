//! Starred repository model.
//!
//! A `Repository` is the central entity mirrored from GitHub. Owners,
//! licenses and topics are value objects that are shared across
//! repositories in storage but carried inline here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Name reported as the main language when GitHub knows none.
pub const OTHER_LANGUAGE: &str = "Other";

/// Owner of a repository (user or organization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Login name, unique across GitHub.
    pub login: String,
    /// Profile URL.
    pub url: Url,
    /// True when the owner is an organization.
    pub is_organization: bool,
}

/// License information as reported by GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    /// SPDX identifier; the storage key for licenses.
    pub spdx_id: Option<String>,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub url: Option<Url>,
}

/// Latest release of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub url: Url,
}

/// A topic with its global stargazer count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub stargazer_count: i64,
}

impl Topic {
    /// Create a new topic.
    #[must_use]
    pub fn new(name: impl Into<String>, stargazer_count: i64) -> Self {
        Self {
            name: name.into(),
            stargazer_count,
        }
    }
}

/// Funding platforms known to GitHub.
///
/// Unknown platform strings are kept verbatim in `Other` so a new
/// platform on GitHub's side never fails an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FundingPlatform {
    GitHub,
    Patreon,
    OpenCollective,
    KoFi,
    Tidelift,
    CommunityBridge,
    Liberapay,
    IssueHunt,
    LfxCrowdfunding,
    Polar,
    BuyMeACoffee,
    ThanksDev,
    Custom,
    Other(String),
}

impl FundingPlatform {
    /// Parse the GraphQL enum value (e.g. `KO_FI`).
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "GITHUB" => Self::GitHub,
            "PATREON" => Self::Patreon,
            "OPEN_COLLECTIVE" => Self::OpenCollective,
            "KO_FI" => Self::KoFi,
            "TIDELIFT" => Self::Tidelift,
            "COMMUNITY_BRIDGE" => Self::CommunityBridge,
            "LIBERAPAY" => Self::Liberapay,
            "ISSUEHUNT" => Self::IssueHunt,
            "LFX_CROWDFUNDING" => Self::LfxCrowdfunding,
            "POLAR" => Self::Polar,
            "BUY_ME_A_COFFEE" => Self::BuyMeACoffee,
            "THANKS_DEV" => Self::ThanksDev,
            "CUSTOM" => Self::Custom,
            other => Self::Other(other.to_string()),
        }
    }

    /// The GraphQL enum value; this is also the stored form.
    #[must_use]
    pub fn as_wire_str(&self) -> &str {
        match self {
            Self::GitHub => "GITHUB",
            Self::Patreon => "PATREON",
            Self::OpenCollective => "OPEN_COLLECTIVE",
            Self::KoFi => "KO_FI",
            Self::Tidelift => "TIDELIFT",
            Self::CommunityBridge => "COMMUNITY_BRIDGE",
            Self::Liberapay => "LIBERAPAY",
            Self::IssueHunt => "ISSUEHUNT",
            Self::LfxCrowdfunding => "LFX_CROWDFUNDING",
            Self::Polar => "POLAR",
            Self::BuyMeACoffee => "BUY_ME_A_COFFEE",
            Self::ThanksDev => "THANKS_DEV",
            Self::Custom => "CUSTOM",
            Self::Other(s) => s,
        }
    }

    /// Human-readable platform name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::GitHub => "GitHub",
            Self::Patreon => "Patreon",
            Self::OpenCollective => "Open Collective Foundation",
            Self::KoFi => "Ko-fi",
            Self::Tidelift => "Tidelift",
            Self::CommunityBridge => "Community Bridge",
            Self::Liberapay => "Liberapay",
            Self::IssueHunt => "IssueHunt",
            Self::LfxCrowdfunding => "LFX Crowdfunding",
            Self::Polar => "Polar",
            Self::BuyMeACoffee => "Buy Me a Coffee",
            Self::ThanksDev => "thanks.dev",
            Self::Custom => "Custom",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for FundingPlatform {
    fn from(s: String) -> Self {
        Self::from_wire(&s)
    }
}

impl From<FundingPlatform> for String {
    fn from(platform: FundingPlatform) -> Self {
        platform.as_wire_str().to_string()
    }
}

impl std::fmt::Display for FundingPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A funding link declared in the repository's FUNDING.yml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingLink {
    pub url: Url,
    pub platform: FundingPlatform,
}

/// A starred repository.
///
/// `imported_at` and `unstarred_at` are assigned locally; every other
/// field comes from GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Opaque GitHub node id.
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub url: Url,
    pub homepage_url: Option<Url>,
    pub owner: Owner,
    pub is_archived: bool,
    pub is_fork: bool,
    pub is_private: bool,
    pub is_template: bool,
    pub latest_release: Option<Release>,
    pub license_info: Option<LicenseInfo>,
    pub stargazer_count: i64,
    pub fork_count: i64,
    pub created_at: DateTime<Utc>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub starred_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// When this repository was first written to the local store.
    pub imported_at: Option<DateTime<Utc>>,
    /// Set once the repository is no longer starred (soft delete).
    pub unstarred_at: Option<DateTime<Utc>>,
    /// Languages ordered by size, largest first.
    pub languages: Vec<String>,
    /// Topics ordered by descending stargazer count.
    pub repository_topics: Vec<Topic>,
    pub funding_links: Vec<FundingLink>,
}

impl Repository {
    /// The largest language, or `"Other"` when none is known.
    #[must_use]
    pub fn main_language(&self) -> &str {
        self.languages.first().map_or(OTHER_LANGUAGE, String::as_str)
    }

    /// Release name, falling back to the last segment of the release URL.
    #[must_use]
    pub fn latest_release_name(&self) -> Option<String> {
        let release = self.latest_release.as_ref()?;
        if let Some(name) = release.name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        release
            .url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    /// Whether the repository is still starred.
    #[must_use]
    pub fn is_starred(&self) -> bool {
        self.unstarred_at.is_none()
    }
}
