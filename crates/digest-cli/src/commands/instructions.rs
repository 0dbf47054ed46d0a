//! Instructions command for managing standing summarizer instructions.

use std::io::Write;

use anyhow::Result;
use clap::Subcommand;

use digest_db::Database;

use super::util::is_clear_marker;

#[derive(Debug, Subcommand)]
pub enum InstructionsAction {
    /// List standing instructions with their indices.
    List,
    /// Append an instruction.
    Add {
        /// Instruction text.
        text: String,
    },
    /// Replace the instruction at INDEX; `.` removes it.
    Set {
        /// Zero-based index from `instructions list`.
        index: usize,
        /// Replacement text.
        text: String,
    },
    /// Remove the instruction at INDEX.
    Remove {
        /// Zero-based index from `instructions list`.
        index: usize,
    },
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    conversation: &str,
    action: &InstructionsAction,
) -> Result<()> {
    match action {
        InstructionsAction::List => {
            let instructions = db.instructions(conversation)?;
            if instructions.is_empty() {
                writeln!(writer, "No instructions.")?;
            }
            for (index, text) in instructions.iter().enumerate() {
                writeln!(writer, "{index}: {text}")?;
            }
        }
        InstructionsAction::Add { text } => {
            let text = text.trim();
            if is_clear_marker(text) {
                anyhow::bail!("instruction is too short");
            }
            db.add_instruction(conversation, text)?;
            writeln!(writer, "Instruction added.")?;
        }
        InstructionsAction::Set { index, text } => {
            let text = text.trim();
            if is_clear_marker(text) {
                db.remove_instruction(conversation, *index)?;
                writeln!(writer, "Instruction {index} removed.")?;
            } else {
                db.replace_instruction(conversation, *index, text)?;
                writeln!(writer, "Instruction {index} updated.")?;
            }
        }
        InstructionsAction::Remove { index } => {
            db.remove_instruction(conversation, *index)?;
            writeln!(writer, "Instruction {index} removed.")?;
        }
    }
    Ok(())
}
