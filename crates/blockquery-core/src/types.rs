//! Shared types for the block query pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

// ─── Paged ────────────────────────────────────────────────────────────────────

/// An entity that can appear in a paginated result set.
///
/// `kind` is the run-time type tag written into cursors; `block_number` is the
/// position the page info builder uses for keyset math.
pub trait Paged {
    /// Entity kind tag (e.g. `"Block"`).
    fn kind(&self) -> &str;
    /// Block number this entity is positioned at.
    fn block_number(&self) -> u64;
}

// ─── Block ────────────────────────────────────────────────────────────────────

/// A block as returned by the upstream data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block number.
    pub number: u64,
    /// Block hash (`0x…`).
    pub hash: String,
    /// Parent block hash (`0x…`).
    pub parent_hash: String,
    /// Unix timestamp of the block (seconds since epoch).
    pub timestamp: i64,
    /// Number of transactions in the block.
    pub transaction_count: u32,
    /// Full transactions, only populated when [`FetchHints::transactions`] was set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<Transaction>,
}

impl Paged for Block {
    fn kind(&self) -> &str {
        "Block"
    }

    fn block_number(&self) -> u64 {
        self.number
    }
}

// ─── Transaction / Account ────────────────────────────────────────────────────

/// A transaction, either standalone or nested in a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction hash.
    pub hash: String,
    /// Hash of the containing block; `None` while pending.
    pub block_hash: Option<String>,
    /// Number of the containing block; `None` while pending.
    pub block_number: Option<u64>,
    /// Position within the block.
    pub index: Option<u32>,
    /// Sender address.
    pub from: String,
    /// Recipient address; `None` for contract creation.
    pub to: Option<String>,
    /// Transferred value in wei, as a hex quantity.
    pub value: String,
}

/// An account handle. Balances, code and storage are fetched lazily by the
/// data source and are not part of this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
}

impl Account {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

// ─── BlockTag ─────────────────────────────────────────────────────────────────

/// Symbolic block tag understood by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    Earliest,
    Latest,
    Pending,
    Safe,
    Finalized,
}

impl BlockTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::Latest => "latest",
            Self::Pending => "pending",
            Self::Safe => "safe",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockTag {
    type Err = QueryError;

    /// Tags are trimmed and matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earliest" => Ok(Self::Earliest),
            "latest" => Ok(Self::Latest),
            "pending" => Ok(Self::Pending),
            "safe" => Ok(Self::Safe),
            "finalized" => Ok(Self::Finalized),
            other => Err(QueryError::argument(format!("Unknown block tag: '{other}'."))),
        }
    }
}

// ─── BlockRef ─────────────────────────────────────────────────────────────────

/// A single block reference: the argument of the upstream lookup primitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockRef {
    Number(u64),
    Hash(String),
    Tag(BlockTag),
}

impl BlockRef {
    /// Returns the block number if this reference already is one.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<u64> for BlockRef {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<BlockTag> for BlockRef {
    fn from(tag: BlockTag) -> Self {
        Self::Tag(tag)
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "#{n}"),
            Self::Hash(h) => f.write_str(h),
            Self::Tag(t) => write!(f, "{t}"),
        }
    }
}

// ─── FetchHints ───────────────────────────────────────────────────────────────

/// Which sub-entities the caller asked for. Forwarded verbatim to the data
/// source so it can avoid fetching what nobody reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchHints {
    /// Full transaction objects are needed.
    pub transactions: bool,
    /// Transaction logs are needed.
    pub logs: bool,
    /// Topic filters for nested log selections (`None` entries are wildcards).
    pub log_filters: Option<Vec<Option<String>>>,
}

impl FetchHints {
    /// Hints that request full transactions.
    pub fn with_transactions(mut self) -> Self {
        self.transactions = true;
        self
    }

    /// Hints that request logs (implies transactions).
    pub fn with_logs(mut self, filters: Option<Vec<Option<String>>>) -> Self {
        self.transactions = true;
        self.logs = true;
        self.log_filters = filters;
        self
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
