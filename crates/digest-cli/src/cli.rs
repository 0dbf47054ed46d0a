//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::chunk::ChunkArgs;
use crate::commands::instructions::InstructionsAction;
use crate::commands::onetime::OnetimeArgs;
use crate::commands::summarize::SummarizeArgs;
use crate::commands::time::TimeArgs;

/// Chat transcript digests.
///
/// Summarizes only the part of an exported chat transcript that is new since
/// the last summary, even when the export's timestamps are out of order or
/// ambiguous.
#[derive(Debug, Parser)]
#[command(name = "digest", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Conversation whose settings and cursors are used.
    #[arg(long, global = true, default_value = "default")]
    pub conversation: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize the new part of one or more exported transcripts.
    Summarize(SummarizeArgs),

    /// Show or set the summary time window.
    Time(TimeArgs),

    /// Manage standing instructions for the summarizer.
    #[command(subcommand)]
    Instructions(InstructionsAction),

    /// Set or clear the instruction used for the next summary only.
    Onetime(OnetimeArgs),

    /// Show the current settings.
    Current,

    /// Split stdin into message-sized chunks.
    Chunk(ChunkArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn conversation_defaults_and_is_global() {
        let cli = Cli::parse_from(["digest", "current"]);
        assert_eq!(cli.conversation, "default");

        let cli = Cli::parse_from(["digest", "time", "--conversation", "family"]);
        assert_eq!(cli.conversation, "family");
        assert!(matches!(cli.command, Some(Commands::Time(_))));
    }
}
