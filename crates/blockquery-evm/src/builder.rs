//! Fluent builder API for block query services.
//!
//! # Example
//!
//! ```rust,no_run
//! use blockquery_evm::QueryBuilder;
//!
//! let config = QueryBuilder::new()
//!     .query_max_size(250)
//!     .build_config();
//! ```

use blockquery_core::config::QueryConfig;
use blockquery_core::error::QueryError;
use blockquery_core::source::BlockSource;

use crate::query::BlockQuery;

/// Fluent builder for [`QueryConfig`] and [`BlockQuery`].
#[derive(Default)]
pub struct QueryBuilder {
    config: QueryConfig,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            config: QueryConfig::default(),
        }
    }

    /// Start from an existing config (e.g. one parsed with [`QueryConfig::from_json`]).
    pub fn with_config(config: QueryConfig) -> Self {
        Self { config }
    }

    /// Bound on list, range and page lengths.
    pub fn query_max_size(mut self, n: u64) -> Self {
        self.config.query_max_size = n;
        self
    }

    /// Build the `QueryConfig`.
    pub fn build_config(self) -> QueryConfig {
        self.config
    }

    /// Validate the config and build a query service over `source`.
    pub fn build<S: BlockSource>(self, source: S) -> Result<BlockQuery<S>, QueryError> {
        self.config.validate()?;
        Ok(BlockQuery::new(source, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let cfg = QueryBuilder::new().build_config();
        assert_eq!(cfg.query_max_size, 1000);
    }

    #[test]
    fn builder_custom() {
        let cfg = QueryBuilder::new().query_max_size(25).build_config();
        assert_eq!(cfg.query_max_size, 25);
    }

    #[test]
    fn builder_from_config() {
        let base = QueryConfig::from_json(r#"{"queryMaxSize": 7}"#).unwrap();
        let cfg = QueryBuilder::with_config(base).build_config();
        assert_eq!(cfg.query_max_size, 7);
    }
}
