//! CLI subcommand implementations.

pub mod chunk;
pub mod current;
pub mod instructions;
pub mod onetime;
pub mod summarize;
pub mod time;
pub mod util;
