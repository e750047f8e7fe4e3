//! blockquery CLI — inspect page cursors and run block queries from the terminal.
//!
//! Usage:
//! ```bash
//! # Encode / decode a page cursor
//! blockquery encode Block 20
//! blockquery decode QmxvY2svMjA=
//!
//! # Page through a synthetic in-memory chain
//! blockquery page 10 --after 10 --chain-len 100
//! blockquery page QmxvY2svMjA= --after 10
//! blockquery page latest --before 5
//! blockquery range 3 5
//! ```
//!
//! Set `RUST_LOG=blockquery_evm=debug` to trace query resolution.

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tracing_subscriber::EnvFilter;

use blockquery_core::config::{QueryConfig, DEFAULT_QUERY_MAX_SIZE};
use blockquery_core::cursor;
use blockquery_core::selector::{BlocksRangeArgs, PagedBlockArgs};
use blockquery_core::types::{BlockTag, FetchHints};
use blockquery_evm::{BlockQuery, QueryBuilder};
use blockquery_storage::InMemoryBlockSource;

const DEFAULT_CHAIN_LEN: u64 = 100;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "info" => {
            cmd_info();
            Ok(())
        }
        "encode" => cmd_encode(&args[2..]),
        "decode" => cmd_decode(&args[2..]),
        "page" => cmd_page(&args[2..]).await,
        "range" => cmd_range(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("blockquery {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("blockquery {}", env!("CARGO_PKG_VERSION"));
    println!("Block selectors and cursor pagination over a chain of blocks\n");
    println!("USAGE:");
    println!("    blockquery <COMMAND>\n");
    println!("COMMANDS:");
    println!("    info                         Show default query limits");
    println!("    encode <kind> <number>       Encode a page cursor");
    println!("    decode <cursor>              Decode a page cursor");
    println!("    page <anchor> --after N      Page forward from a number, tag or cursor");
    println!("    page <anchor> --before N     Page backward from a number, tag or cursor");
    println!("    range <start> <end>          Fetch an inclusive number range");
    println!("    version                      Print version");
    println!("    help                         Print this help\n");
    println!("QUERY FLAGS:");
    println!("    --chain-len <L>   Length of the synthetic chain  [default: {DEFAULT_CHAIN_LEN}]");
    println!("    --max <N>         Maximum selection length       [default: {DEFAULT_QUERY_MAX_SIZE}]");
}

fn cmd_info() {
    println!("BlockQuery v{}", env!("CARGO_PKG_VERSION"));
    println!("  Default max selection: {DEFAULT_QUERY_MAX_SIZE} blocks");
    println!("  Selectors: number, hash, tag (earliest/latest/pending/safe/finalized)");
    println!("  Queries: block, blockOffset, blocks, blocksRange, pageBlocks");
    println!("  Sources: in-memory, EVM JSON-RPC");
}

fn cmd_encode(args: &[String]) -> Result<()> {
    let (kind, number) = match args {
        [kind, number, ..] => (kind, number),
        _ => bail!("usage: blockquery encode <kind> <number>"),
    };
    let number: u64 = number
        .parse()
        .with_context(|| format!("invalid block number: {number}"))?;
    println!("{}", cursor::encode_parts(kind, &number.to_string())?);
    Ok(())
}

fn cmd_decode(args: &[String]) -> Result<()> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow!("usage: blockquery decode <cursor>"))?;
    let (kind, reference) = cursor::decode(raw)?;
    let out = serde_json::json!({ "kind": kind, "reference": reference });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn cmd_page(args: &[String]) -> Result<()> {
    let anchor = args
        .first()
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow!("usage: blockquery page <anchor> --after N | --before N"))?;

    let mut paged = PagedBlockArgs {
        before: parse_number_flag(args, "--before")?,
        after: parse_number_flag(args, "--after")?,
        ..Default::default()
    };
    set_anchor(&mut paged, anchor);

    let query = build_query(args)?;
    let page = query.page_blocks(&paged, &FetchHints::default()).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

async fn cmd_range(args: &[String]) -> Result<()> {
    let (start, end) = match args {
        [start, end, ..] => (start, end),
        _ => bail!("usage: blockquery range <start> <end>"),
    };
    let range = BlocksRangeArgs {
        number_range: Some(vec![
            start.parse().with_context(|| format!("invalid start block: {start}"))?,
            end.parse().with_context(|| format!("invalid end block: {end}"))?,
        ]),
        hash_range: None,
    };

    let query = build_query(args)?;
    let blocks = query.blocks_range(&range, &FetchHints::default()).await?;
    println!("{}", serde_json::to_string_pretty(&blocks)?);
    Ok(())
}

/// A page anchor is a block number, a block tag, or otherwise a cursor.
fn set_anchor(paged: &mut PagedBlockArgs, anchor: &str) {
    if let Ok(n) = anchor.parse::<u64>() {
        paged.number = Some(n);
    } else if anchor.parse::<BlockTag>().is_ok() {
        paged.tag = Some(anchor.to_string());
    } else {
        paged.cursor = Some(anchor.to_string());
    }
}

fn build_query(args: &[String]) -> Result<BlockQuery<Arc<InMemoryBlockSource>>> {
    let chain_len = parse_number_flag(args, "--chain-len")?.unwrap_or(DEFAULT_CHAIN_LEN);
    let max = parse_number_flag(args, "--max")?.unwrap_or(DEFAULT_QUERY_MAX_SIZE);

    tracing::debug!(chain_len, max, "building in-memory chain");
    let source = Arc::new(InMemoryBlockSource::with_chain(chain_len));
    let query = QueryBuilder::with_config(QueryConfig::new(max)).build(source)?;
    Ok(query)
}

fn parse_number_flag(args: &[String], flag: &str) -> Result<Option<u64>> {
    parse_flag(args, flag)
        .map(|v| {
            v.parse::<u64>()
                .with_context(|| format!("{flag} expects a number, got {v}"))
        })
        .transpose()
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored(anchor: &str) -> PagedBlockArgs {
        let mut paged = PagedBlockArgs::default();
        set_anchor(&mut paged, anchor);
        paged
    }

    #[test]
    fn anchor_number_tag_or_cursor() {
        assert_eq!(anchored("10").number, Some(10));
        assert_eq!(anchored("latest").tag.as_deref(), Some("latest"));
        assert_eq!(anchored("Finalized").tag.as_deref(), Some("Finalized"));
        assert_eq!(anchored("QmxvY2svMjA=").cursor.as_deref(), Some("QmxvY2svMjA="));
    }

    #[tokio::test]
    async fn page_backward_from_tag() {
        let args: Vec<String> = ["latest", "--before", "5", "--chain-len", "30"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut paged = PagedBlockArgs {
            before: parse_number_flag(&args, "--before").unwrap(),
            ..Default::default()
        };
        set_anchor(&mut paged, &args[0]);

        let query = build_query(&args).unwrap();
        let page = query.page_blocks(&paged, &FetchHints::default()).await.unwrap();
        let numbers: Vec<u64> = page.items.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![24, 25, 26, 27, 28]);
    }
}
