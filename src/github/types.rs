// GitHub GraphQL response types.
// Defines structs for deserializing search, viewer and star mutation payloads.

use serde::{Deserialize, Serialize};

/// Authenticated user returned by the `me` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
}

/// Viewer's watch subscription on a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionState {
    Subscribed,
    Unsubscribed,
    Ignored,
    #[serde(other)]
    Unknown,
}

/// Stargazer connection, reduced to its count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stargazers {
    pub total_count: u64,
}

/// Star count and whether the viewer has starred the node.
///
/// Flattened into [`Repository`], so on the wire this is
/// `stargazers { totalCount }` next to `viewerHasStarred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarState {
    pub stargazers: Stargazers,
    pub viewer_has_starred: bool,
}

impl StarState {
    pub fn new(total_count: u64, viewer_has_starred: bool) -> Self {
        Self {
            stargazers: Stargazers { total_count },
            viewer_has_starred,
        }
    }

    pub fn total_count(&self) -> u64 {
        self.stargazers.total_count
    }

    /// State after a mutation reported `viewer_has_starred`.
    ///
    /// The count moves by one in the direction of the new flag; it is not
    /// reconciled against the server's total. An unstar at zero stays at zero.
    pub fn settled(&self, viewer_has_starred: bool) -> Self {
        let total_count = if viewer_has_starred {
            self.total_count().saturating_add(1)
        } else {
            self.total_count().saturating_sub(1)
        };
        Self::new(total_count, viewer_has_starred)
    }
}

/// Searchable, starrable repository node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub url: String,
    pub viewer_subscription: Option<SubscriptionState>,
    #[serde(flatten)]
    pub star: StarState,
}

/// Search edge; the cursor is not kept once a page has been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub node: Repository,
}

/// Cursor pagination metadata for a search page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// One page of repository search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub repository_count: u64,
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
}

impl SearchResult {
    /// Find a repository node on this page by id.
    pub fn node(&self, node_id: &str) -> Option<&Repository> {
        self.edges
            .iter()
            .map(|edge| &edge.node)
            .find(|node| node.id == node_id)
    }

    /// Find a repository node on this page by name.
    pub fn node_by_name(&self, name: &str) -> Option<&Repository> {
        self.edges
            .iter()
            .map(|edge| &edge.node)
            .find(|node| node.name == name)
    }
}

/// Authoritative post-mutation state for one starrable node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarMutationResult {
    pub id: String,
    pub viewer_has_starred: bool,
}
