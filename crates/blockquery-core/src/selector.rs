//! Block selectors and the validation that turns raw query arguments into them.
//!
//! Each query shape has its own argument struct (deserialized straight from
//! the request layer) and one validation function. Validation is pure and
//! runs to completion before any upstream I/O.

use serde::{Deserialize, Serialize};

use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::page::PageDirection;
use crate::types::{BlockRef, BlockTag};

// ─── Raw arguments ────────────────────────────────────────────────────────────

/// Select a single block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockArgs {
    pub number: Option<u64>,
    pub hash: Option<String>,
    pub tag: Option<String>,
}

/// Select a single block relative to a reference block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockOffsetArgs {
    pub number: Option<u64>,
    pub hash: Option<String>,
    pub tag: Option<String>,
    /// Signed distance from the reference block. Zero is valid.
    pub offset: Option<i64>,
}

/// Select an explicit list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlocksArgs {
    pub numbers: Option<Vec<u64>>,
    pub hashes: Option<Vec<String>>,
}

/// Select an inclusive range of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlocksRangeArgs {
    /// `[start, end]`; signed so that negative input can be rejected explicitly.
    pub number_range: Option<Vec<i64>>,
    /// `[startHash, endHash]`.
    pub hash_range: Option<Vec<String>>,
}

/// Select a page of blocks around an anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagedBlockArgs {
    pub number: Option<u64>,
    pub hash: Option<String>,
    pub tag: Option<String>,
    pub cursor: Option<String>,
    pub before: Option<u64>,
    pub after: Option<u64>,
}

// ─── BlockSelector ────────────────────────────────────────────────────────────

/// A validated description of which block(s) to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockSelector {
    ByNumber(u64),
    ByHash(String),
    ByTag(BlockTag),
    ByNumberOffset(u64, i64),
    ByHashOrTagOffset(BlockRef, i64),
    NumberList(Vec<u64>),
    HashList(Vec<String>),
    NumberRange(u64, u64),
    HashRange(String, String),
    Cursor(String),
}

impl BlockSelector {
    /// Wrap a single reference as the matching selector variant.
    pub fn from_ref(reference: BlockRef) -> Self {
        match reference {
            BlockRef::Number(n) => Self::ByNumber(n),
            BlockRef::Hash(h) => Self::ByHash(h),
            BlockRef::Tag(t) => Self::ByTag(t),
        }
    }

    /// The single block reference this selector names, if it names exactly one.
    pub fn single_ref(&self) -> Option<BlockRef> {
        match self {
            Self::ByNumber(n) => Some(BlockRef::Number(*n)),
            Self::ByHash(h) => Some(BlockRef::Hash(h.clone())),
            Self::ByTag(t) => Some(BlockRef::Tag(*t)),
            _ => None,
        }
    }
}

/// A validated paged query: an anchor plus a direction.
///
/// The anchor is always one of `ByNumber`, `ByHash`, `ByTag` or `Cursor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedSelector {
    pub anchor: BlockSelector,
    pub direction: PageDirection,
}

// ─── Normalization helpers ────────────────────────────────────────────────────

fn normalize_hash(hash: Option<&String>) -> Option<String> {
    hash.map(|h| h.trim()).filter(|h| !h.is_empty()).map(str::to_string)
}

fn normalize_tag(tag: Option<&String>) -> Option<String> {
    tag.map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
}

/// Collect whichever of number/hash/tag are present, normalized.
fn present_refs(
    number: Option<u64>,
    hash: Option<&String>,
    tag: Option<&String>,
) -> Vec<Result<BlockRef, QueryError>> {
    let mut refs = Vec::with_capacity(3);
    if let Some(n) = number {
        refs.push(Ok(BlockRef::Number(n)));
    }
    if let Some(h) = normalize_hash(hash) {
        refs.push(Ok(BlockRef::Hash(h)));
    }
    if let Some(t) = normalize_tag(tag) {
        refs.push(t.parse::<BlockTag>().map(BlockRef::Tag));
    }
    refs
}

fn exactly_one_ref(
    number: Option<u64>,
    hash: Option<&String>,
    tag: Option<&String>,
) -> Result<BlockRef, QueryError> {
    let mut refs = present_refs(number, hash, tag);
    match refs.len() {
        0 => Err(QueryError::argument("expected exactly one of number/hash/tag")),
        1 => refs.remove(0),
        _ => Err(QueryError::argument(
            "expected exactly one of number/hash/tag, got several",
        )),
    }
}

fn check_len(len: usize, config: &QueryConfig) -> Result<(), QueryError> {
    if len as u64 > config.query_max_size {
        return Err(config.too_large());
    }
    Ok(())
}

// ─── Validation per query shape ───────────────────────────────────────────────

/// Single block: exactly one of number, hash or tag.
pub fn validate_block(args: &BlockArgs) -> Result<BlockSelector, QueryError> {
    exactly_one_ref(args.number, args.hash.as_ref(), args.tag.as_ref()).map(BlockSelector::from_ref)
}

/// Single block plus offset: the offset must be present (zero allowed) and
/// exactly one of number, hash or tag set.
pub fn validate_block_offset(args: &BlockOffsetArgs) -> Result<BlockSelector, QueryError> {
    let refs = present_refs(args.number, args.hash.as_ref(), args.tag.as_ref());
    let offset = match args.offset {
        Some(offset) if !refs.is_empty() => offset,
        _ => {
            return Err(QueryError::argument(
                "expected one of number/hash/tag together with an offset",
            ))
        }
    };
    match exactly_one_ref(args.number, args.hash.as_ref(), args.tag.as_ref())? {
        BlockRef::Number(n) => Ok(BlockSelector::ByNumberOffset(n, offset)),
        other => Ok(BlockSelector::ByHashOrTagOffset(other, offset)),
    }
}

/// Explicit list: exactly one of numbers or hashes, non-empty, within the
/// configured maximum.
pub fn validate_blocks(args: &BlocksArgs, config: &QueryConfig) -> Result<BlockSelector, QueryError> {
    match (&args.numbers, &args.hashes) {
        (Some(_), Some(_)) => Err(QueryError::argument(
            "exactly one of numbers/hashes must be provided, got both",
        )),
        (None, None) => Err(QueryError::argument(
            "exactly one of numbers/hashes must be provided",
        )),
        (Some(numbers), None) => {
            if numbers.is_empty() {
                return Err(QueryError::argument("numbers must not be empty"));
            }
            check_len(numbers.len(), config)?;
            Ok(BlockSelector::NumberList(numbers.clone()))
        }
        (None, Some(hashes)) => {
            let hashes: Vec<String> = hashes.iter().map(|h| h.trim().to_string()).collect();
            if hashes.is_empty() || hashes.iter().any(String::is_empty) {
                return Err(QueryError::argument("hashes must not be empty"));
            }
            check_len(hashes.len(), config)?;
            Ok(BlockSelector::HashList(hashes))
        }
    }
}

/// Inclusive range: exactly one of a number range or a hash range, each with
/// exactly two elements.
///
/// Number ranges are fully checked here (non-negative, ordered, within the
/// maximum). Hash ranges can only be ordered and sized once both ends have
/// been resolved, which the resolver does.
pub fn validate_blocks_range(
    args: &BlocksRangeArgs,
    config: &QueryConfig,
) -> Result<BlockSelector, QueryError> {
    match (&args.number_range, &args.hash_range) {
        (Some(_), Some(_)) => Err(QueryError::argument(
            "exactly one of numberRange/hashRange must be provided, got both",
        )),
        (None, None) => Err(QueryError::argument(
            "expected either a number range or a hash range",
        )),
        (Some(range), None) => {
            let (start, end) = match range.as_slice() {
                [start, end] => (*start, *end),
                _ => {
                    return Err(QueryError::argument(
                        "exactly two elements were expected: the start and end blocks",
                    ))
                }
            };
            if start < 0 || end < 0 {
                return Err(QueryError::argument("invalid block number provided"));
            }
            let (start, end) = (start as u64, end as u64);
            check_range(start, end, config)?;
            Ok(BlockSelector::NumberRange(start, end))
        }
        (None, Some(range)) => match range.as_slice() {
            [start, end] => {
                let (start, end) = (start.trim(), end.trim());
                if start.is_empty() || end.is_empty() {
                    return Err(QueryError::argument("hash range ends must not be empty"));
                }
                Ok(BlockSelector::HashRange(start.to_string(), end.to_string()))
            }
            _ => Err(QueryError::argument(
                "exactly two elements were expected: the start and end blocks",
            )),
        },
    }
}

/// Ordering and size checks shared by number ranges and resolved hash ranges.
pub fn check_range(start: u64, end: u64, config: &QueryConfig) -> Result<(), QueryError> {
    if start > end {
        return Err(QueryError::argument("invalid range: start must precede end"));
    }
    if end - start >= config.query_max_size {
        return Err(config.too_large());
    }
    Ok(())
}

/// Paged query: exactly one of cursor, number, hash or tag, and exactly one
/// of before or after.
pub fn validate_paged(
    args: &PagedBlockArgs,
    config: &QueryConfig,
) -> Result<PagedSelector, QueryError> {
    let cursor = args
        .cursor
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let refs = present_refs(args.number, args.hash.as_ref(), args.tag.as_ref());

    let anchor = match (cursor, refs.len()) {
        (None, 0) => {
            return Err(QueryError::argument(
                "expected exactly one of cursor/number/hash/tag",
            ))
        }
        (Some(c), 0) => BlockSelector::Cursor(c.to_string()),
        (None, 1) => BlockSelector::from_ref(exactly_one_ref(
            args.number,
            args.hash.as_ref(),
            args.tag.as_ref(),
        )?),
        _ => {
            return Err(QueryError::argument(
                "expected exactly one of cursor/number/hash/tag, got several",
            ))
        }
    };

    let direction = PageDirection::from_counts(args.before, args.after)?;
    if direction.len() > config.query_max_size {
        return Err(config.too_large());
    }

    Ok(PagedSelector { anchor, direction })
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max: u64) -> QueryConfig {
        QueryConfig::new(max)
    }

    fn is_argument_error<T: std::fmt::Debug>(r: Result<T, QueryError>) -> bool {
        matches!(r, Err(QueryError::Argument(_)))
    }

    #[test]
    fn single_block_exclusivity() {
        assert!(is_argument_error(validate_block(&BlockArgs::default())));
        assert!(is_argument_error(validate_block(&BlockArgs {
            number: Some(1),
            hash: Some("0xabc".into()),
            tag: None,
        })));
        assert!(is_argument_error(validate_block(&BlockArgs {
            number: Some(1),
            hash: Some("0xabc".into()),
            tag: Some("latest".into()),
        })));
        assert!(is_argument_error(validate_block(&BlockArgs {
            number: None,
            hash: Some("0xabc".into()),
            tag: Some("latest".into()),
        })));
    }

    #[test]
    fn single_block_normalizes() {
        let sel = validate_block(&BlockArgs {
            tag: Some("  LATEST ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sel, BlockSelector::ByTag(BlockTag::Latest));

        let sel = validate_block(&BlockArgs {
            hash: Some(" 0xabc\n".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sel, BlockSelector::ByHash("0xabc".into()));

        // a blank hash does not count as supplied
        let sel = validate_block(&BlockArgs {
            number: Some(5),
            hash: Some("   ".into()),
            tag: None,
        })
        .unwrap();
        assert_eq!(sel, BlockSelector::ByNumber(5));
    }

    #[test]
    fn unknown_tag_is_argument_error() {
        assert!(is_argument_error(validate_block(&BlockArgs {
            tag: Some("newest".into()),
            ..Default::default()
        })));
    }

    #[test]
    fn offset_zero_is_valid() {
        let sel = validate_block_offset(&BlockOffsetArgs {
            number: Some(10),
            offset: Some(0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sel, BlockSelector::ByNumberOffset(10, 0));
    }

    #[test]
    fn offset_requires_offset_and_reference() {
        assert!(is_argument_error(validate_block_offset(&BlockOffsetArgs {
            number: Some(10),
            ..Default::default()
        })));
        assert!(is_argument_error(validate_block_offset(&BlockOffsetArgs {
            offset: Some(3),
            ..Default::default()
        })));
        assert!(is_argument_error(validate_block_offset(&BlockOffsetArgs {
            number: Some(10),
            tag: Some("latest".into()),
            offset: Some(3),
            ..Default::default()
        })));
    }

    #[test]
    fn offset_from_tag() {
        let sel = validate_block_offset(&BlockOffsetArgs {
            tag: Some("Latest".into()),
            offset: Some(-2),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            sel,
            BlockSelector::ByHashOrTagOffset(BlockRef::Tag(BlockTag::Latest), -2)
        );
    }

    #[test]
    fn list_size_bound() {
        let too_many = BlocksArgs {
            numbers: Some(vec![1, 2, 3]),
            hashes: None,
        };
        assert!(is_argument_error(validate_blocks(&too_many, &cfg(2))));

        let ok = BlocksArgs {
            numbers: Some(vec![1, 2]),
            hashes: None,
        };
        assert_eq!(
            validate_blocks(&ok, &cfg(2)).unwrap(),
            BlockSelector::NumberList(vec![1, 2])
        );
    }

    #[test]
    fn list_exclusivity_and_emptiness() {
        assert!(is_argument_error(validate_blocks(&BlocksArgs::default(), &cfg(10))));
        assert!(is_argument_error(validate_blocks(
            &BlocksArgs {
                numbers: Some(vec![1]),
                hashes: Some(vec!["0xa".into()]),
            },
            &cfg(10)
        )));
        assert!(is_argument_error(validate_blocks(
            &BlocksArgs {
                numbers: Some(vec![]),
                hashes: None,
            },
            &cfg(10)
        )));
    }

    #[test]
    fn hash_list_is_trimmed() {
        let sel = validate_blocks(
            &BlocksArgs {
                numbers: None,
                hashes: Some(vec![" 0xa".into(), "0xb ".into()]),
            },
            &cfg(10),
        )
        .unwrap();
        assert_eq!(sel, BlockSelector::HashList(vec!["0xa".into(), "0xb".into()]));
    }

    #[test]
    fn number_range_checks() {
        let range = |v: Vec<i64>| BlocksRangeArgs {
            number_range: Some(v),
            hash_range: None,
        };

        assert_eq!(
            validate_blocks_range(&range(vec![3, 5]), &cfg(10)).unwrap(),
            BlockSelector::NumberRange(3, 5)
        );
        match validate_blocks_range(&range(vec![5, 3]), &cfg(10)) {
            Err(QueryError::Argument(msg)) => assert!(msg.contains("start must precede end")),
            other => panic!("expected argument error, got {other:?}"),
        }
        assert!(is_argument_error(validate_blocks_range(&range(vec![-1, 3]), &cfg(10))));
        assert!(is_argument_error(validate_blocks_range(&range(vec![1]), &cfg(10))));
        assert!(is_argument_error(validate_blocks_range(&range(vec![1, 2, 3]), &cfg(10))));
        // 3 blocks with a max of 2
        assert!(is_argument_error(validate_blocks_range(&range(vec![1, 3]), &cfg(2))));
        assert!(validate_blocks_range(&range(vec![1, 2]), &cfg(2)).is_ok());
    }

    #[test]
    fn range_exclusivity() {
        assert!(is_argument_error(validate_blocks_range(
            &BlocksRangeArgs::default(),
            &cfg(10)
        )));
        assert!(is_argument_error(validate_blocks_range(
            &BlocksRangeArgs {
                number_range: Some(vec![1, 2]),
                hash_range: Some(vec!["0xa".into(), "0xb".into()]),
            },
            &cfg(10)
        )));
    }

    #[test]
    fn hash_range_defers_ordering() {
        let sel = validate_blocks_range(
            &BlocksRangeArgs {
                number_range: None,
                hash_range: Some(vec!["0xb".into(), " 0xa ".into()]),
            },
            &cfg(10),
        )
        .unwrap();
        assert_eq!(sel, BlockSelector::HashRange("0xb".into(), "0xa".into()));
    }

    #[test]
    fn paged_anchor_exclusivity() {
        let base = PagedBlockArgs {
            after: Some(10),
            ..Default::default()
        };
        assert!(is_argument_error(validate_paged(&base, &cfg(100))));

        let two = PagedBlockArgs {
            cursor: Some("QmxvY2svMTA=".into()),
            number: Some(10),
            ..base.clone()
        };
        assert!(is_argument_error(validate_paged(&two, &cfg(100))));

        let cursor = PagedBlockArgs {
            cursor: Some("QmxvY2svMTA=".into()),
            ..base.clone()
        };
        let sel = validate_paged(&cursor, &cfg(100)).unwrap();
        assert_eq!(sel.anchor, BlockSelector::Cursor("QmxvY2svMTA=".into()));
        assert_eq!(sel.direction, PageDirection::Forward(10));
    }

    #[test]
    fn paged_direction_exclusivity() {
        let both = PagedBlockArgs {
            number: Some(10),
            before: Some(5),
            after: Some(5),
            ..Default::default()
        };
        assert!(is_argument_error(validate_paged(&both, &cfg(100))));

        let neither = PagedBlockArgs {
            number: Some(10),
            ..Default::default()
        };
        assert!(is_argument_error(validate_paged(&neither, &cfg(100))));

        let back = PagedBlockArgs {
            tag: Some("LATEST".into()),
            before: Some(5),
            ..Default::default()
        };
        let sel = validate_paged(&back, &cfg(100)).unwrap();
        assert_eq!(sel.anchor, BlockSelector::ByTag(BlockTag::Latest));
        assert_eq!(sel.direction, PageDirection::Backward(5));
    }

    #[test]
    fn paged_size_bound() {
        let args = PagedBlockArgs {
            number: Some(10),
            after: Some(11),
            ..Default::default()
        };
        assert!(is_argument_error(validate_paged(&args, &cfg(10))));
    }

    #[test]
    fn args_deserialize_camel_case() {
        let args: BlocksRangeArgs = serde_json::from_str(r#"{"numberRange":[100,104]}"#).unwrap();
        assert_eq!(args.number_range, Some(vec![100, 104]));
        let args: PagedBlockArgs = serde_json::from_str(r#"{"tag":"latest","before":3}"#).unwrap();
        assert_eq!(args.before, Some(3));
        assert_eq!(args.after, None);
    }
}
