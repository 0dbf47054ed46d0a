//! Summarize command: reconstruct, filter, summarize, advance the cursor.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::Args;

use digest_core::{
    Cutoff, chat_name_from_file, describe_cutoff, next_cursor, reconstruct_and_filter,
    split_message,
};
use digest_db::Database;
use digest_llm::{Client, PromptPlan, TOO_LARGE_REPLY, build_system_prompt, plan_prompt};

use super::chunk::write_chunks;
use super::util::parse_instant;
use crate::Config;

/// Reply when the window holds no new lines.
pub const NO_NEW_MESSAGES: &str = "No new messages to summarize.";

/// Cursor key for transcripts whose file name carries no chat name.
const UNNAMED_CHAT: &str = "";

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// Exported transcript files, joined in the given order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Chat name for the header and cursor (defaults to the export's name).
    #[arg(long)]
    pub chat: Option<String>,

    /// Print the selected lines instead of summarizing them.
    #[arg(long)]
    pub print_window: bool,

    /// Treat this instant as the current time.
    #[arg(long)]
    pub now: Option<String>,

    /// Use this cutoff instead of the stored window and cursor.
    #[arg(long)]
    pub since: Option<String>,
}

/// What the summarizer produced and whether it counts as delivered.
struct Reply {
    text: String,
    delivered: bool,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    conversation: &str,
    args: &SummarizeArgs,
    config: &Config,
) -> Result<()> {
    let clock = Local::now().naive_local();
    let now = match args.now.as_deref() {
        Some(value) => parse_instant(value, clock)?,
        None => clock,
    };

    let raw = read_transcripts(&args.files)?;
    let chat = args.chat.clone().or_else(|| chat_from_paths(&args.files));
    let cursor_key = chat.as_deref().unwrap_or(UNNAMED_CHAT);

    let settings = db.settings(conversation)?;
    let cutoff = match args.since.as_deref() {
        Some(value) => Cutoff::Since(parse_instant(value, now)?),
        None => settings
            .window
            .cutoff(now, db.cursor(conversation, cursor_key)?),
    };
    tracing::debug!(?cutoff, window = %settings.window, chat = cursor_key, "computed cutoff");

    let filtered = reconstruct_and_filter(&raw, cutoff, &config.reconstruct()?)
        .inspect_err(|err| tracing::warn!(%err, "rejected transcript"))?;

    if args.print_window {
        if filtered.is_empty() {
            writeln!(writer, "{NO_NEW_MESSAGES}")?;
        } else {
            writeln!(writer, "{}", filtered.text)?;
        }
        return Ok(());
    }

    let reply = if filtered.is_empty() {
        Reply {
            text: NO_NEW_MESSAGES.to_string(),
            delivered: true,
        }
    } else {
        let mut instructions = settings.instructions;
        instructions.extend(settings.onetime_instruction);
        let reply = summarize(now, &instructions, &filtered.text, config)?;
        if reply.delivered {
            db.take_onetime_instruction(conversation)?;
        }
        reply
    };

    if reply.delivered {
        db.store_cursor(conversation, cursor_key, next_cursor(now, filtered.cursor))?;
    }

    let since = describe_cutoff(now, cutoff.instant());
    let header = match chat.as_deref() {
        Some(chat) => format!("{chat}\nsince {since}"),
        None => format!("Since {since}"),
    };
    let message = format!("{header}\n\n{}", reply.text);
    let chunks = split_message(&message, config.message_ceiling.max(1), config.message_lookback);
    write_chunks(writer, &chunks)
}

fn summarize(
    now: NaiveDateTime,
    instructions: &[String],
    transcript: &str,
    config: &Config,
) -> Result<Reply> {
    let plan = plan_prompt(instructions, transcript, config.token_limit)
        .context("failed to count prompt tokens")?;
    let user_prompt = match plan {
        PromptPlan::Ready { user_prompt } => user_prompt,
        PromptPlan::TooLarge { .. } => {
            return Ok(Reply {
                text: TOO_LARGE_REPLY.to_string(),
                delivered: false,
            });
        }
    };
    let system_prompt = build_system_prompt(&now.format("%d %B, %Y").to_string());

    if config.dry_run {
        return Ok(Reply {
            text: format!("{system_prompt}\n\n{user_prompt}"),
            delivered: true,
        });
    }

    let api_key = config
        .api_key()
        .ok_or_else(|| anyhow::anyhow!("missing API key (set DIGEST_API_KEY or config.toml)"))?;
    let client = Client::new(api_key, config.api_base_url.as_str())
        .context("failed to create LLM client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let text = runtime
        .block_on(client.summarize(&config.model, &system_prompt, &user_prompt))
        .context("failed to summarize transcript")?;

    Ok(Reply {
        text,
        delivered: true,
    })
}

/// Reads and joins transcript files, replacing invalid UTF-8.
fn read_transcripts(files: &[PathBuf]) -> Result<String> {
    let parts = files
        .iter()
        .map(|path| {
            std::fs::read(path)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .with_context(|| format!("failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("\n"))
}

fn chat_from_paths(files: &[PathBuf]) -> Option<String> {
    files
        .iter()
        .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
        .find_map(chat_name_from_file)
        .map(str::to_string)
}
