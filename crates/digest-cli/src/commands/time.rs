//! Time command for showing or choosing the summary window.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use digest_core::TimeWindow;
use digest_db::Database;

#[derive(Debug, Args)]
pub struct TimeArgs {
    /// New window, e.g. `1-day`, `2-weeks`, `all-time`, `auto`.
    pub window: Option<TimeWindow>,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    conversation: &str,
    args: &TimeArgs,
) -> Result<()> {
    if let Some(window) = args.window {
        db.set_window(conversation, window)?;
        writeln!(writer, "Time window set to {window}")?;
        return Ok(());
    }

    let current = db.settings(conversation)?.window;
    writeln!(writer, "Current time window: {current}")?;
    writeln!(writer, "Available:")?;
    for window in TimeWindow::ALL {
        let marker = if window == current { "*" } else { "-" };
        writeln!(writer, "{marker} {window}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn time_lists_windows_and_marks_current() {
        let db = Database::open_in_memory().unwrap();
        db.set_window("default", TimeWindow::Week).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, "default", &TimeArgs { window: None }).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Current time window: 1 week
        Available:
        - 1 day
        - 3 days
        * 1 week
        - 2 weeks
        - 1 month
        - 2 months
        - 3 months
        - 6 months
        - 1 year
        - 2 years
        - all time
        - auto
        ");
    }

    #[test]
    fn time_sets_window() {
        let db = Database::open_in_memory().unwrap();
        let args = TimeArgs {
            window: Some(TimeWindow::AllTime),
        };

        let mut output = Vec::new();
        run(&mut output, &db, "family", &args).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "Time window set to all time\n");
        assert_eq!(db.settings("family").unwrap().window, TimeWindow::AllTime);
        assert_eq!(db.settings("default").unwrap().window, TimeWindow::Auto);
    }
}
