// GitHub API module.
// Provides the GraphQL transport, operations, and response types.

pub mod client;
pub mod operations;
pub mod types;

pub use client::{GitHubClient, RateLimit, Transport};
pub use operations::{Operations, SEARCH_REPOSITORIES_OPERATION, SearchVariables};
pub use types::*;
