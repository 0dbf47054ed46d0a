//! Onetime command for the instruction used by the next summary only.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use digest_db::Database;

use super::util::is_clear_marker;

#[derive(Debug, Args)]
pub struct OnetimeArgs {
    /// Instruction text; omit or pass `.` to clear.
    pub text: Option<String>,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    conversation: &str,
    args: &OnetimeArgs,
) -> Result<()> {
    let text = args
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !is_clear_marker(text));

    db.set_onetime_instruction(conversation, text)?;
    match text {
        Some(text) => writeln!(writer, "One-time instruction set: {text}")?,
        None => writeln!(writer, "One-time instruction cleared.")?,
    }
    Ok(())
}
