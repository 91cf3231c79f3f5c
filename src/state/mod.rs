// State management module.
// Handles search pagination, page loading state, and star toggles.

pub mod search;
pub mod star;

pub use search::{DEFAULT_PAGE_SIZE, DEFAULT_QUERY, LoadingState, SearchState};
pub use star::{StarAction, StarGuard, StarToggles};
