//! blockquery-evm — range resolver, query orchestrator and EVM block source.

pub mod builder;
pub mod fetcher;
pub mod query;
pub mod resolver;

pub use builder::QueryBuilder;
pub use fetcher::{EvmBlockSource, EvmRpcClient};
pub use query::BlockQuery;
pub use resolver::BlockResolver;
