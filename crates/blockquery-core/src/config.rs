//! Query configuration.

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Default bound on list, range and page lengths.
pub const DEFAULT_QUERY_MAX_SIZE: u64 = 1000;

/// Configuration shared by every query a resolver serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryConfig {
    /// Maximum number of blocks a single list, range or page may select.
    pub query_max_size: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            query_max_size: DEFAULT_QUERY_MAX_SIZE,
        }
    }
}

impl QueryConfig {
    pub fn new(query_max_size: u64) -> Self {
        Self { query_max_size }
    }

    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, QueryError> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| QueryError::argument(format!("invalid query config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// A zero max size would reject every multi-block query.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.query_max_size == 0 {
            return Err(QueryError::argument("queryMaxSize must be at least 1"));
        }
        Ok(())
    }

    /// The error every oversized selection reports.
    pub fn too_large(&self) -> QueryError {
        QueryError::argument(format!(
            "too large a selection: maximum length allowed is {}",
            self.query_max_size
        ))
    }
}
