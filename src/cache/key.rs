// Cache keys for query results.
// A key is the operation name plus the full variable set it was fetched with.

use std::fmt;

use crate::github::{SEARCH_REPOSITORIES_OPERATION, SearchVariables};

/// Identifies one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub operation: String,
    pub variables: SearchVariables,
}

impl QueryKey {
    pub fn new(operation: impl Into<String>, variables: SearchVariables) -> Self {
        Self {
            operation: operation.into(),
            variables,
        }
    }

    /// Key for a `searchRepositories` page.
    pub fn search(variables: &SearchVariables) -> Self {
        Self::new(SEARCH_REPOSITORIES_OPERATION, variables.clone())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.variables;
        write!(f, "{}(query={:?}", self.operation, v.query)?;
        if let Some(first) = v.first {
            write!(f, ", first={}", first)?;
        }
        if let Some(after) = &v.after {
            write!(f, ", after={}", after)?;
        }
        if let Some(last) = v.last {
            write!(f, ", last={}", last)?;
        }
        if let Some(before) = &v.before {
            write!(f, ", before={}", before)?;
        }
        write!(f, ")")
    }
}
