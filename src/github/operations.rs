// GitHub GraphQL operations.
// Query documents, their variables, and typed methods over any Transport.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::client::Transport;
use super::types::{SearchResult, StarMutationResult, Viewer};

pub const ME: &str = r#"
query me {
  viewer {
    login
    name
    avatarUrl
  }
}
"#;

pub const SEARCH_REPOSITORIES: &str = r#"
query searchRepositories($first: Int, $after: String, $last: Int, $before: String, $query: String!) {
  search(first: $first, after: $after, last: $last, before: $before, query: $query, type: REPOSITORY) {
    repositoryCount
    pageInfo {
      endCursor
      hasNextPage
      hasPreviousPage
      startCursor
    }
    edges {
      cursor
      node {
        ... on Repository {
          id
          name
          url
          viewerSubscription
          stargazers {
            totalCount
          }
          viewerHasStarred
        }
      }
    }
  }
}
"#;

pub const ADD_STAR: &str = r#"
mutation addStar($input: AddStarInput!) {
  addStar(input: $input) {
    starrable {
      id
      viewerHasStarred
    }
  }
}
"#;

pub const REMOVE_STAR: &str = r#"
mutation removeStar($input: RemoveStarInput!) {
  removeStar(input: $input) {
    starrable {
      id
      viewerHasStarred
    }
  }
}
"#;

/// Operation name used in cache keys for repository search.
pub const SEARCH_REPOSITORIES_OPERATION: &str = "searchRepositories";

/// Variables for `searchRepositories`.
///
/// Unset pagination arguments serialize as `null`, which GitHub treats as absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchVariables {
    pub query: String,
    pub first: Option<u32>,
    pub after: Option<String>,
    pub last: Option<u32>,
    pub before: Option<String>,
}

impl SearchVariables {
    /// Variables for the first page of `query`.
    pub fn first_page(query: impl Into<String>, page_size: u32) -> Self {
        Self {
            query: query.into(),
            first: Some(page_size),
            after: None,
            last: None,
            before: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StarInput<'a> {
    starrable_id: &'a str,
}

#[derive(Serialize)]
struct StarVariables<'a> {
    input: StarInput<'a>,
}

#[derive(Debug, Deserialize)]
struct ViewerResponse {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    search: SearchResult,
}

#[derive(Debug, Deserialize)]
struct StarPayload {
    starrable: StarMutationResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddStarResponse {
    add_star: StarPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveStarResponse {
    remove_star: StarPayload,
}

/// Typed GitHub operations available on every [`Transport`].
#[allow(async_fn_in_trait)]
pub trait Operations: Transport {
    /// Get the authenticated user.
    async fn fetch_viewer(&mut self) -> Result<Viewer> {
        let response: ViewerResponse = self.execute("me", ME, &serde_json::json!({})).await?;
        Ok(response.viewer)
    }

    /// Search repositories for one page.
    async fn search_repositories(&mut self, variables: &SearchVariables) -> Result<SearchResult> {
        let response: SearchResponse = self
            .execute(SEARCH_REPOSITORIES_OPERATION, SEARCH_REPOSITORIES, variables)
            .await?;
        Ok(response.search)
    }

    /// Star a repository on behalf of the viewer.
    async fn add_star(&mut self, starrable_id: &str) -> Result<StarMutationResult> {
        let variables = StarVariables {
            input: StarInput { starrable_id },
        };
        let response: AddStarResponse = self.execute("addStar", ADD_STAR, &variables).await?;
        Ok(response.add_star.starrable)
    }

    /// Remove the viewer's star from a repository.
    async fn remove_star(&mut self, starrable_id: &str) -> Result<StarMutationResult> {
        let variables = StarVariables {
            input: StarInput { starrable_id },
        };
        let response: RemoveStarResponse =
            self.execute("removeStar", REMOVE_STAR, &variables).await?;
        Ok(response.remove_star.starrable)
    }
}

impl<T: Transport> Operations for T {}
