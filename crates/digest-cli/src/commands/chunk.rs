//! Chunk command for splitting text into message-sized parts.

use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use clap::Args;

use digest_core::split_message;

use crate::Config;

/// Line printed between chunks.
pub const SEPARATOR: &str = "---";

#[derive(Debug, Args)]
pub struct ChunkArgs {
    /// Maximum characters per chunk (defaults to `message_ceiling`).
    #[arg(long)]
    pub ceiling: Option<usize>,

    /// Characters before the ceiling searched for a line break
    /// (defaults to `message_lookback`).
    #[arg(long)]
    pub lookback: Option<usize>,
}

pub fn run<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    args: &ChunkArgs,
    config: &Config,
) -> Result<()> {
    let ceiling = args.ceiling.unwrap_or(config.message_ceiling);
    let lookback = args.lookback.unwrap_or(config.message_lookback);
    if ceiling == 0 {
        bail!("ceiling must be positive");
    }

    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .context("failed to read stdin")?;
    let text = String::from_utf8_lossy(&bytes);

    write_chunks(writer, &split_message(&text, ceiling, lookback))
}

/// Prints chunks in order with a separator line between them.
pub fn write_chunks<W: Write>(writer: &mut W, chunks: &[String]) -> Result<()> {
    for (index, chunk) in chunks.iter().enumerate() {
        if index > 0 {
            writeln!(writer, "{SEPARATOR}")?;
        }
        write!(writer, "{chunk}")?;
        if !chunk.ends_with('\n') {
            writeln!(writer)?;
        }
    }
    Ok(())
}
