use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use digest_cli::commands::{chunk, current, instructions, onetime, summarize, time, util};
use digest_cli::{Cli, Commands, Config};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let conversation = cli.conversation.as_str();

    match command {
        Commands::Chunk(args) => chunk::run(&mut io::stdin().lock(), &mut out, args, &config)?,
        Commands::Summarize(args) => {
            let mut db = util::open_database(&config)?;
            summarize::run(&mut out, &mut db, conversation, args, &config)?;
        }
        Commands::Time(args) => {
            let db = util::open_database(&config)?;
            time::run(&mut out, &db, conversation, args)?;
        }
        Commands::Instructions(action) => {
            let db = util::open_database(&config)?;
            instructions::run(&mut out, &db, conversation, action)?;
        }
        Commands::Onetime(args) => {
            let db = util::open_database(&config)?;
            onetime::run(&mut out, &db, conversation, args)?;
        }
        Commands::Current => {
            let db = util::open_database(&config)?;
            current::run(&mut out, &db, conversation)?;
        }
    }

    Ok(())
}
