//! Current command for showing a conversation's settings.

use std::io::Write;

use anyhow::Result;

use digest_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, conversation: &str) -> Result<()> {
    let settings = db.settings(conversation)?;

    writeln!(writer, "Conversation: {conversation}")?;
    writeln!(writer, "Time window: {}", settings.window)?;

    if settings.instructions.is_empty() {
        writeln!(writer, "Instructions: none")?;
    } else {
        writeln!(writer, "Instructions:")?;
        for (index, text) in settings.instructions.iter().enumerate() {
            writeln!(writer, "{index}: {text}")?;
        }
    }

    match settings.onetime_instruction {
        Some(text) => writeln!(writer, "One-time instruction: {text}")?,
        None => writeln!(writer, "One-time instruction: none")?,
    }
    Ok(())
}
