//! SQL statements used by the facade and the sync engine.

pub const UPSERT_LICENSE: &str = "
INSERT INTO licenses (spdx_id, name, nickname, url)
VALUES (:spdx_id, :name, :nickname, :url)
ON CONFLICT (spdx_id) DO UPDATE SET
    name = excluded.name,
    nickname = excluded.nickname,
    url = excluded.url";

pub const UPSERT_OWNER: &str = "
INSERT INTO owners (login, url, is_organization)
VALUES (:login, :url, :is_organization)
ON CONFLICT (login) DO UPDATE SET
    url = excluded.url,
    is_organization = excluded.is_organization";

pub const UPSERT_TOPIC: &str = "
INSERT INTO topics (name, stargazer_count)
VALUES (:name, :stargazer_count)
ON CONFLICT (name) DO UPDATE SET stargazer_count = excluded.stargazer_count";

/// Insert or refresh a repository. Re-starring clears `unstarred_at`;
/// `imported_at` keeps the first import time.
pub const UPSERT_REPOSITORY: &str = "
INSERT INTO repositories (
    id, name, description, url, homepage_url, owner,
    is_archived, is_fork, is_private, is_template,
    latest_release, license, stargazer_count, fork_count,
    created_at, pushed_at, starred_at, updated_at, imported_at, unstarred_at,
    languages, funding_links
) VALUES (
    :id, :name, :description, :url, :homepage_url, :owner,
    :is_archived, :is_fork, :is_private, :is_template,
    :latest_release, :license, :stargazer_count, :fork_count,
    :created_at, :pushed_at, :starred_at, :updated_at, :imported_at, NULL,
    :languages, :funding_links
)
ON CONFLICT (id) DO UPDATE SET
    name = excluded.name,
    description = excluded.description,
    url = excluded.url,
    homepage_url = excluded.homepage_url,
    owner = excluded.owner,
    is_archived = excluded.is_archived,
    is_fork = excluded.is_fork,
    is_private = excluded.is_private,
    is_template = excluded.is_template,
    latest_release = excluded.latest_release,
    license = excluded.license,
    stargazer_count = excluded.stargazer_count,
    fork_count = excluded.fork_count,
    created_at = excluded.created_at,
    pushed_at = excluded.pushed_at,
    starred_at = excluded.starred_at,
    updated_at = excluded.updated_at,
    unstarred_at = NULL,
    languages = excluded.languages,
    funding_links = excluded.funding_links";

pub const DELETE_TOPIC_LINKS: &str = "DELETE FROM repositories_topics WHERE repo_id = :repo_id";

pub const INSERT_TOPIC_LINK: &str = "
INSERT INTO repositories_topics (repo_id, topic_name)
VALUES (:repo_id, :topic_name)
ON CONFLICT (repo_id, topic_name) DO NOTHING";

pub const SELECT_STARRED_IDS: &str = "SELECT id FROM repositories WHERE unstarred_at IS NULL";

/// Keeps the first unstar time of rows that were already unstarred.
pub const MARK_UNSTARRED: &str = "
UPDATE repositories SET unstarred_at = COALESCE(unstarred_at, :unstarred_at)
WHERE id = :id";

pub const SELECT_STATS: &str = "
SELECT
    COUNT(*) FILTER (WHERE unstarred_at IS NULL) AS starred_count,
    COUNT(*) FILTER (WHERE unstarred_at IS NOT NULL) AS unstarred_count,
    (SELECT id FROM repositories
        WHERE unstarred_at IS NULL
        ORDER BY starred_at DESC, id ASC
        LIMIT 1) AS last_repo_id,
    (SELECT MAX(starred_at) FROM repositories WHERE unstarred_at IS NULL) AS last_star_date,
    MAX(imported_at) AS last_import_date
FROM repositories";

pub const SELECT_REPOSITORIES: &str = "
SELECT
    r.id, r.name, r.description, r.url, r.homepage_url,
    o.login AS owner_login, o.url AS owner_url, o.is_organization AS owner_is_organization,
    r.is_archived, r.is_fork, r.is_private, r.is_template,
    r.latest_release,
    r.license, l.name AS license_name, l.nickname AS license_nickname, l.url AS license_url,
    r.stargazer_count, r.fork_count,
    r.created_at, r.pushed_at, r.starred_at, r.updated_at, r.imported_at, r.unstarred_at,
    r.languages, r.funding_links
FROM repositories r
JOIN owners o ON o.login = r.owner
LEFT JOIN licenses l ON l.spdx_id = r.license
ORDER BY r.starred_at DESC, r.id ASC";

pub const SELECT_REPOSITORY_TOPICS: &str = "
SELECT t.name, t.stargazer_count
FROM repositories_topics rt
JOIN topics t ON t.name = rt.topic_name
WHERE rt.repo_id = :repo_id
ORDER BY t.stargazer_count DESC, t.name ASC";

pub const DELETE_UNSTARRED_REPOSITORIES: &str = "
DELETE FROM repositories WHERE unstarred_at IS NOT NULL RETURNING owner, name";

pub const DELETE_DANGLING_TOPIC_LINKS: &str = "
DELETE FROM repositories_topics WHERE repo_id NOT IN (SELECT id FROM repositories)";

pub const DELETE_ORPHAN_OWNERS: &str = "
DELETE FROM owners WHERE login NOT IN (SELECT owner FROM repositories)";

/// The subquery filters NULLs; `x NOT IN (..., NULL)` is never true.
pub const DELETE_ORPHAN_LICENSES: &str = "
DELETE FROM licenses
WHERE spdx_id NOT IN (SELECT license FROM repositories WHERE license IS NOT NULL)";

pub const DELETE_ORPHAN_TOPICS: &str = "
DELETE FROM topics WHERE name NOT IN (SELECT topic_name FROM repositories_topics)";
