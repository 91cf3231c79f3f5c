// Search session.
// Serves search pages cache-first, sends star mutations, and patches the cached page on settlement.

use std::sync::Arc;

use tracing::instrument;

use crate::cache::{CacheStore, MemoryCache, QueryKey, apply_mutation_result};
use crate::error::{Result, StargazeError};
use crate::github::{Operations, SearchResult, StarState, Transport, Viewer};
use crate::state::{SearchState, StarAction, StarGuard, StarToggles};

/// A star mutation that has been sent but not yet applied to the cache.
///
/// The node stays disabled until this is settled or dropped.
#[derive(Debug)]
pub struct PendingStar {
    /// Key of the page the toggle was triggered from.
    pub key: QueryKey,
    pub node_id: String,
    pub action: StarAction,
    guard: StarGuard,
}

/// Search session over one transport and one cache.
pub struct Session<T: Transport, C: CacheStore = MemoryCache> {
    transport: T,
    cache: C,
    /// Current search and page.
    pub search: SearchState,
    stars: StarToggles,
}

impl<T: Transport> Session<T, MemoryCache> {
    pub fn new(transport: T, search: SearchState) -> Self {
        Self::with_cache(transport, MemoryCache::new(), search)
    }
}

impl<T: Transport, C: CacheStore> Session<T, C> {
    pub fn with_cache(transport: T, cache: C, search: SearchState) -> Self {
        Self {
            transport,
            cache,
            search,
            stars: StarToggles::new(),
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether the star control for `node_id` is disabled.
    pub fn is_star_in_flight(&self, node_id: &str) -> bool {
        self.stars.is_in_flight(node_id)
    }

    /// Get the authenticated user.
    pub async fn viewer(&mut self) -> Result<Viewer> {
        self.transport.fetch_viewer().await
    }

    /// Current page, from the cache when present.
    #[instrument(skip(self), fields(key = %self.search.key()))]
    pub async fn load(&mut self) -> Result<Arc<SearchResult>> {
        let key = self.search.key();
        if let Some(page) = self.cache.read(&key) {
            tracing::debug!("cache hit");
            self.search.set_loaded(Arc::clone(&page));
            return Ok(page);
        }
        self.fetch(key).await
    }

    /// Current page from the network, replacing any cached entry.
    pub async fn refetch(&mut self) -> Result<Arc<SearchResult>> {
        let key = self.search.key();
        self.fetch(key).await
    }

    async fn fetch(&mut self, key: QueryKey) -> Result<Arc<SearchResult>> {
        self.search.set_loading();
        match self.transport.search_repositories(&key.variables).await {
            Ok(page) => {
                let page = Arc::new(page);
                self.cache.write(key, Arc::clone(&page));
                self.search.set_loaded(Arc::clone(&page));
                Ok(page)
            }
            Err(e) => {
                self.search.set_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Start a new search and load its first page.
    pub async fn search(&mut self, query: &str) -> Result<Arc<SearchResult>> {
        self.search.set_query(query);
        self.load().await
    }

    /// Load the next page. Returns `None` when the current page is the last.
    pub async fn next_page(&mut self) -> Result<Option<Arc<SearchResult>>> {
        let page = self.load().await?;
        if !self.search.next_page(&page.page_info) {
            return Ok(None);
        }
        self.load().await.map(Some)
    }

    /// Load the previous page. Returns `None` when the current page is the first.
    pub async fn previous_page(&mut self) -> Result<Option<Arc<SearchResult>>> {
        let page = self.load().await?;
        if !self.search.previous_page(&page.page_info) {
            return Ok(None);
        }
        self.load().await.map(Some)
    }

    /// Disable the star control for `node_id` and decide which mutation to send.
    ///
    /// The node must be on the currently cached page.
    pub fn begin_star(&mut self, node_id: &str) -> Result<PendingStar> {
        let key = self.search.key();
        let page = self
            .cache
            .read(&key)
            .ok_or_else(|| StargazeError::CacheMiss(key.to_string()))?;
        let node = page.node(node_id).ok_or_else(|| StargazeError::NodeNotFound {
            node_id: node_id.to_string(),
        })?;
        let action = StarAction::for_state(&node.star);

        let guard = self.stars.begin(node_id)?;
        Ok(PendingStar {
            key,
            node_id: node_id.to_string(),
            action,
            guard,
        })
    }

    /// Send the mutation for `pending`, re-enable the control, and patch the page.
    ///
    /// The patch targets the key captured by `begin_star`. A cache miss there
    /// falls back to refetching that key. Dropping the returned future before
    /// it completes re-enables the control without touching the cache.
    #[instrument(skip(self, pending), fields(node_id = %pending.node_id, action = pending.action.label()))]
    pub async fn settle_star(&mut self, pending: PendingStar) -> Result<StarState> {
        let PendingStar {
            key,
            node_id,
            action,
            guard,
        } = pending;
        let sent = match action {
            StarAction::Add => self.transport.add_star(&node_id).await,
            StarAction::Remove => self.transport.remove_star(&node_id).await,
        };
        drop(guard);
        let result = sent?;

        match apply_mutation_result(&key, &mut self.cache, &result) {
            Ok(()) => {}
            Err(e) if e.is_cache_miss() => {
                tracing::warn!(key = %key, "cached page gone before mutation settled, refetching");
                let page = self.transport.search_repositories(&key.variables).await?;
                self.cache.write(key.clone(), Arc::new(page));
            }
            Err(e) => return Err(e),
        }

        let page = self
            .cache
            .read(&key)
            .ok_or_else(|| StargazeError::CacheMiss(key.to_string()))?;
        if key == self.search.key() {
            self.search.set_loaded(Arc::clone(&page));
        }

        page.node(&result.id)
            .map(|node| node.star)
            .ok_or(StargazeError::NodeNotFound { node_id: result.id })
    }

    /// Toggle the viewer's star on a node of the current page.
    pub async fn toggle_star(&mut self, node_id: &str) -> Result<StarState> {
        let pending = self.begin_star(node_id)?;
        self.settle_star(pending).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use serde::{Serialize, de::DeserializeOwned};
    use serde_json::{Value, json};

    use super::*;
    use crate::github::SearchVariables;

    enum Reply {
        Data(Value),
        Fail(StargazeError),
        /// Never answers, like a request stuck on the network.
        Hang,
    }

    /// Transport that answers from a queue and records every call.
    #[derive(Default)]
    struct MockTransport {
        responses: VecDeque<Reply>,
        calls: Vec<(String, Value)>,
    }

    impl MockTransport {
        fn respond(mut self, data: Value) -> Self {
            self.responses.push_back(Reply::Data(data));
            self
        }

        fn fail(mut self, error: StargazeError) -> Self {
            self.responses.push_back(Reply::Fail(error));
            self
        }

        fn hang(mut self) -> Self {
            self.responses.push_back(Reply::Hang);
            self
        }

        fn operations(&self) -> Vec<&str> {
            self.calls.iter().map(|(op, _)| op.as_str()).collect()
        }
    }

    impl Transport for MockTransport {
        async fn execute<V, R>(&mut self, operation: &str, _query: &str, variables: &V) -> Result<R>
        where
            V: Serialize,
            R: DeserializeOwned,
        {
            self.calls
                .push((operation.to_string(), serde_json::to_value(variables)?));
            match self.responses.pop_front() {
                Some(Reply::Data(data)) => Ok(serde_json::from_value(data)?),
                Some(Reply::Fail(error)) => Err(error),
                Some(Reply::Hang) => std::future::pending().await,
                None => Err(StargazeError::Other("no response queued".into())),
            }
        }
    }

    fn node(id: &str, total: u64, starred: bool) -> Value {
        json!({
            "cursor": format!("cursor-{}", id),
            "node": {
                "id": id,
                "name": format!("repo-{}", id),
                "url": format!("https://github.com/example/repo-{}", id),
                "viewerSubscription": "UNSUBSCRIBED",
                "stargazers": { "totalCount": total },
                "viewerHasStarred": starred
            }
        })
    }

    fn search_page(edges: Vec<Value>, has_prev: bool, has_next: bool) -> Value {
        json!({
            "search": {
                "repositoryCount": 12,
                "pageInfo": {
                    "startCursor": "start",
                    "endCursor": "end",
                    "hasPreviousPage": has_prev,
                    "hasNextPage": has_next
                },
                "edges": edges
            }
        })
    }

    fn starred(field: &str, id: &str, flag: bool) -> Value {
        json!({ field: { "starrable": { "id": id, "viewerHasStarred": flag } } })
    }

    fn session(transport: MockTransport) -> Session<MockTransport> {
        Session::new(transport, SearchState::new("rust", 2))
    }

    #[tokio::test]
    async fn test_load_is_cache_first() {
        let transport = MockTransport::default().respond(search_page(
            vec![node("A", 3, false), node("B", 0, false)],
            false,
            true,
        ));
        let mut session = session(transport);

        let first = session.load().await.unwrap();
        let second = session.load().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(session.transport().operations(), vec!["searchRepositories"]);
        assert_eq!(
            session.transport().calls[0].1,
            serde_json::to_value(SearchVariables::first_page("rust", 2)).unwrap()
        );
        assert!(session.search.results.is_loaded());
    }

    #[tokio::test]
    async fn test_toggle_star_patches_cached_page() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 3, false), node("B", 0, false)], false, true))
            .respond(starred("addStar", "A", true));
        let mut session = session(transport);
        session.load().await.unwrap();

        let state = session.toggle_star("A").await.unwrap();

        assert_eq!(state, StarState::new(4, true));
        assert_eq!(
            session.transport().operations(),
            vec!["searchRepositories", "addStar"]
        );
        assert_eq!(
            session.transport().calls[1].1,
            json!({ "input": { "starrableId": "A" } })
        );

        let page = session.cache().read(&session.search.key()).unwrap();
        assert_eq!(page.node("A").unwrap().star, StarState::new(4, true));
        assert_eq!(page.node("B").unwrap().star, StarState::new(0, false));
        assert_eq!(page.repository_count, 12);
        assert!(!session.is_star_in_flight("A"));
    }

    #[tokio::test]
    async fn test_toggle_starred_node_removes_star() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 5, true)], false, false))
            .respond(starred("removeStar", "A", false));
        let mut session = session(transport);
        session.load().await.unwrap();

        let state = session.toggle_star("A").await.unwrap();

        assert_eq!(state, StarState::new(4, false));
        assert_eq!(session.transport().operations()[1], "removeStar");
    }

    #[tokio::test]
    async fn test_second_trigger_rejected_while_in_flight() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 3, false)], false, false))
            .respond(starred("addStar", "A", true));
        let mut session = session(transport);
        session.load().await.unwrap();

        let pending = session.begin_star("A").unwrap();
        assert!(session.is_star_in_flight("A"));
        assert!(matches!(
            session.begin_star("A"),
            Err(StargazeError::StarInFlight(_))
        ));

        session.settle_star(pending).await.unwrap();
        let page = session.cache().read(&session.search.key()).unwrap();
        assert_eq!(page.node("A").unwrap().star, StarState::new(4, true));
    }

    #[tokio::test]
    async fn test_failed_mutation_releases_guard_and_keeps_cache() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 3, false)], false, false))
            .fail(StargazeError::Unauthorized);
        let mut session = session(transport);
        let before = session.load().await.unwrap();

        let result = session.toggle_star("A").await;

        assert!(matches!(result, Err(StargazeError::Unauthorized)));
        assert!(!session.is_star_in_flight("A"));
        let after = session.cache().read(&session.search.key()).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_abandoned_settle_releases_guard() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 3, false)], false, false))
            .hang()
            .respond(starred("addStar", "A", true));
        let mut session = session(transport);
        let before = session.load().await.unwrap();

        let pending = session.begin_star("A").unwrap();
        let settled = tokio::time::timeout(Duration::from_millis(10), session.settle_star(pending)).await;

        assert!(settled.is_err());
        assert!(!session.is_star_in_flight("A"));
        let after = session.cache().read(&session.search.key()).unwrap();
        assert!(Arc::ptr_eq(&before, &after));

        let state = session.toggle_star("A").await.unwrap();
        assert_eq!(state, StarState::new(4, true));
        assert_eq!(
            session.transport().operations(),
            vec!["searchRepositories", "addStar", "addStar"]
        );
    }

    #[tokio::test]
    async fn test_dropped_pending_star_releases_guard() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 3, false)], false, false));
        let mut session = session(transport);
        session.load().await.unwrap();

        let pending = session.begin_star("A").unwrap();
        assert!(session.is_star_in_flight("A"));
        drop(pending);

        assert!(!session.is_star_in_flight("A"));
        assert!(session.begin_star("A").is_ok());
    }

    #[tokio::test]
    async fn test_settle_after_navigation_patches_captured_page() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 3, false)], false, true))
            .respond(search_page(vec![node("C", 1, false)], true, false))
            .respond(starred("addStar", "A", true));
        let mut session = session(transport);
        session.load().await.unwrap();
        let first_key = session.search.key();

        let pending = session.begin_star("A").unwrap();
        let second = session.next_page().await.unwrap().unwrap();
        let state = session.settle_star(pending).await.unwrap();

        assert_eq!(state, StarState::new(4, true));
        let first = session.cache().read(&first_key).unwrap();
        assert_eq!(first.node("A").unwrap().star, StarState::new(4, true));

        let current = session.cache().read(&session.search.key()).unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        let shown = session.search.results.data().unwrap();
        assert!(Arc::ptr_eq(shown, &second));
        assert_eq!(shown.edges[0].node.id, "C");
    }

    #[tokio::test]
    async fn test_toggle_unknown_node() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 3, false)], false, false));
        let mut session = session(transport);
        session.load().await.unwrap();

        let result = session.toggle_star("Z").await;

        assert!(matches!(
            result,
            Err(StargazeError::NodeNotFound { node_id }) if node_id == "Z"
        ));
        assert_eq!(session.transport().operations(), vec!["searchRepositories"]);
    }

    #[tokio::test]
    async fn test_toggle_before_load_is_cache_miss() {
        let mut session = session(MockTransport::default());
        let result = session.toggle_star("A").await;
        assert!(matches!(result, Err(StargazeError::CacheMiss(_))));
        assert!(session.transport().calls.is_empty());
    }

    #[tokio::test]
    async fn test_cache_miss_on_settle_refetches() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 3, false)], false, false))
            .respond(starred("addStar", "A", true))
            .respond(search_page(vec![node("A", 9, true)], false, false));
        let mut session = Session::with_cache(
            transport,
            MemoryCache::new(),
            SearchState::new("rust", 2),
        );
        session.load().await.unwrap();

        let pending = session.begin_star("A").unwrap();
        session.cache.clear();
        let state = session.settle_star(pending).await.unwrap();

        assert_eq!(state, StarState::new(9, true));
        assert_eq!(
            session.transport().operations(),
            vec!["searchRepositories", "addStar", "searchRepositories"]
        );
    }

    #[tokio::test]
    async fn test_paging_forward_and_back() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 1, false)], false, true))
            .respond(search_page(vec![node("C", 1, false)], true, false))
            .respond(search_page(vec![node("A", 1, false)], false, true));
        let mut session = session(transport);
        session.load().await.unwrap();

        let next = session.next_page().await.unwrap().unwrap();
        assert_eq!(next.edges[0].node.id, "C");
        assert_eq!(session.search.variables().after.as_deref(), Some("end"));

        assert!(session.next_page().await.unwrap().is_none());

        let prev = session.previous_page().await.unwrap().unwrap();
        assert_eq!(session.search.variables().before.as_deref(), Some("start"));
        assert_eq!(session.search.variables().last, Some(2));
        assert_eq!(prev.edges[0].node.id, "A");
        // backward variables make a new key, so the page is fetched again
        assert_eq!(session.transport().calls.len(), 3);
        assert_eq!(session.cache().len(), 3);
    }

    #[tokio::test]
    async fn test_search_resets_to_first_page() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 1, false)], false, true))
            .respond(search_page(vec![node("G", 2, true)], false, false));
        let mut session = session(transport);
        session.load().await.unwrap();

        let page = session.search("language:go").await.unwrap();

        assert_eq!(page.edges[0].node.id, "G");
        assert_eq!(
            session.search.variables(),
            &SearchVariables::first_page("language:go", 2)
        );
        assert_eq!(session.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_load_error_sets_error_state() {
        let transport = MockTransport::default().fail(StargazeError::GraphQl("bad query".into()));
        let mut session = session(transport);

        let result = session.load().await;

        assert!(matches!(result, Err(StargazeError::GraphQl(_))));
        assert!(matches!(session.search.results, crate::state::LoadingState::Error(_)));
        assert!(session.cache().is_empty());
    }

    #[tokio::test]
    async fn test_refetch_replaces_cached_page() {
        let transport = MockTransport::default()
            .respond(search_page(vec![node("A", 3, false)], false, false))
            .respond(search_page(vec![node("A", 8, false)], false, false));
        let mut session = session(transport);
        let first = session.load().await.unwrap();

        let second = session.refetch().await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        let cached = session.cache().read(&session.search.key()).unwrap();
        assert_eq!(cached.node("A").unwrap().star.total_count(), 8);
        assert_eq!(session.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_viewer() {
        let transport = MockTransport::default().respond(json!({
            "viewer": { "login": "octocat", "name": "The Octocat", "avatarUrl": "https://example.com/a.png" }
        }));
        let mut session = session(transport);

        let viewer = session.viewer().await.unwrap();

        assert_eq!(viewer.login, "octocat");
        assert_eq!(session.transport().operations(), vec!["me"]);
    }
}
