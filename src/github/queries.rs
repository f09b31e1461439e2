//! GraphQL documents sent to the GitHub API.

/// Total number of repositories starred by the viewer.
pub const TOTAL_STARRED_REPOSITORIES_COUNT: &str = r"
query {
    viewer {
        starredRepositories(first: 1) {
            totalCount
        }
    }
}
";

/// One page of starred repositories, newest star first.
///
/// Ordering by `STARRED_AT DESC` is what makes the incremental
/// stop-early watermark valid.
pub const STARRED_REPOSITORIES: &str = r"
query ($after: String, $pageSize: Int!) {
    viewer {
        starredRepositories(first: $pageSize, after: $after, orderBy: {field: STARRED_AT, direction: DESC}) {
            totalCount
            pageInfo {
                endCursor
                hasNextPage
            }
            edges {
                starredAt
                node {
                    id
                    name
                    owner {
                        __typename
                        login
                        url
                    }
                    description
                    url
                    homepageUrl
                    isArchived
                    isFork
                    isPrivate
                    isTemplate
                    latestRelease {
                        name
                        publishedAt
                        url
                    }
                    licenseInfo {
                        name
                        nickname
                        spdxId
                        url
                    }
                    stargazerCount
                    forkCount
                    createdAt
                    pushedAt
                    updatedAt
                    languages(first: 10, orderBy: {field: SIZE, direction: DESC}) {
                        edges {
                            node {
                                name
                            }
                        }
                    }
                    repositoryTopics(first: 100) {
                        nodes {
                            topic {
                                name
                                stargazerCount
                            }
                        }
                    }
                    fundingLinks {
                        url
                        platform
                    }
                }
            }
        }
    }
}
";
