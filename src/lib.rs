//! Search GitHub repositories over GraphQL and star them.
//!
//! Search pages are cached in memory per query and pagination variables.
//! When a star or unstar mutation settles, the cached page is patched from the
//! mutation result instead of being fetched again; see [`cache::apply_mutation_result`].

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod state;

pub use app::{PendingStar, Session};
pub use config::AppConfig;
pub use error::{Result, StargazeError};
