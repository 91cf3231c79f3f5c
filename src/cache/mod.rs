// Cache module for in-memory query results.
// Keys search pages by operation and variables, and patches them after star mutations.

pub mod key;
pub mod patch;
pub mod store;

pub use key::QueryKey;
pub use patch::{apply_mutation_result, patch_search_result};
pub use store::{CacheStore, CachedData, MemoryCache};
