// Search state management.
// Tracks the search string, cursor pagination variables, and the current page's loading state.

use std::sync::Arc;

use crate::cache::QueryKey;
use crate::github::{PageInfo, SearchResult, SearchVariables};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Search string used when none is configured.
pub const DEFAULT_QUERY: &str = "フロントエンドエンジニア";

/// Loading state for async data.
#[derive(Debug, Clone, Default)]
pub enum LoadingState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> LoadingState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadingState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// Search string, pagination variables and the page they produced.
#[derive(Debug, Clone)]
pub struct SearchState {
    variables: SearchVariables,
    page_size: u32,
    /// Page for the current variables.
    pub results: LoadingState<Arc<SearchResult>>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY, DEFAULT_PAGE_SIZE)
    }
}

impl SearchState {
    pub fn new(query: impl Into<String>, page_size: u32) -> Self {
        Self {
            variables: SearchVariables::first_page(query, page_size),
            page_size,
            results: LoadingState::Idle,
        }
    }

    pub fn variables(&self) -> &SearchVariables {
        &self.variables
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Cache key for the current variables.
    pub fn key(&self) -> QueryKey {
        QueryKey::search(&self.variables)
    }

    /// Start a new search from its first page.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.variables = SearchVariables::first_page(query, self.page_size);
        self.results = LoadingState::Idle;
    }

    /// Move forward past `page_info.end_cursor`.
    ///
    /// Returns false and leaves the variables alone when there is no next page.
    pub fn next_page(&mut self, page_info: &PageInfo) -> bool {
        match (&page_info.end_cursor, page_info.has_next_page) {
            (Some(cursor), true) => {
                self.variables = SearchVariables {
                    query: self.variables.query.clone(),
                    first: Some(self.page_size),
                    after: Some(cursor.clone()),
                    last: None,
                    before: None,
                };
                self.results = LoadingState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Move backward before `page_info.start_cursor`.
    ///
    /// Returns false and leaves the variables alone when there is no previous page.
    pub fn previous_page(&mut self, page_info: &PageInfo) -> bool {
        match (&page_info.start_cursor, page_info.has_previous_page) {
            (Some(cursor), true) => {
                self.variables = SearchVariables {
                    query: self.variables.query.clone(),
                    first: None,
                    after: None,
                    last: Some(self.page_size),
                    before: Some(cursor.clone()),
                };
                self.results = LoadingState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Set loaded data.
    pub fn set_loaded(&mut self, page: Arc<SearchResult>) {
        self.results = LoadingState::Loaded(page);
    }

    /// Set loading state.
    pub fn set_loading(&mut self) {
        self.results = LoadingState::Loading;
    }

    /// Set error state.
    pub fn set_error(&mut self, error: String) {
        self.results = LoadingState::Error(error);
    }

    /// Page info of the loaded page, if any.
    pub fn page_info(&self) -> Option<&PageInfo> {
        self.results.data().map(|page| &page.page_info)
    }
}
