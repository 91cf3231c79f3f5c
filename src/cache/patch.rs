// Post-mutation cache patching.
// Rewrites the one starred/unstarred node in a cached search page without refetching.

use std::sync::Arc;

use crate::error::{Result, StargazeError};
use crate::github::{Edge, SearchResult, StarMutationResult};

use super::key::QueryKey;
use super::store::CacheStore;

/// Patch the page cached under `key` with a settled star mutation.
///
/// Fails with `CacheMiss` when nothing is cached for `key` and with
/// `NodeNotFound` when the page does not contain the mutated node; the cache
/// is not written in either case. On success exactly one entry is written.
///
/// Not idempotent: applying the same result twice moves the count twice.
/// Callers hold the node's in-flight guard until the mutation settles.
pub fn apply_mutation_result<C: CacheStore>(
    key: &QueryKey,
    cache: &mut C,
    result: &StarMutationResult,
) -> Result<()> {
    let cached = cache
        .read(key)
        .ok_or_else(|| StargazeError::CacheMiss(key.to_string()))?;

    let patched = patch_search_result(&cached, result)?;
    cache.write(key.clone(), Arc::new(patched));

    tracing::debug!(%key, node_id = %result.id, starred = result.viewer_has_starred, "patched cached page");
    Ok(())
}

/// New page equal to `page` except for the node `result` refers to.
///
/// `repository_count` and `page_info` are carried over unchanged.
pub fn patch_search_result(page: &SearchResult, result: &StarMutationResult) -> Result<SearchResult> {
    if page.node(&result.id).is_none() {
        return Err(StargazeError::NodeNotFound {
            node_id: result.id.clone(),
        });
    }

    let edges = page
        .edges
        .iter()
        .map(|edge| {
            if edge.node.id != result.id {
                return edge.clone();
            }

            let current = edge.node.star;
            if !result.viewer_has_starred && current.total_count() == 0 {
                tracing::warn!(node_id = %result.id, "unstar on a node with no stargazers");
            }

            let mut node = edge.node.clone();
            node.star = current.settled(result.viewer_has_starred);
            Edge { node }
        })
        .collect();

    Ok(SearchResult {
        repository_count: page.repository_count,
        edges,
        page_info: page.page_info.clone(),
    })
}
