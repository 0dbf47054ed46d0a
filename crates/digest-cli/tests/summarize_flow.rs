//! End-to-end tests driving the `digest` binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::{NamedTempFile, TempDir};

const EXPORT: &str = "\u{feff}[14/01/2023, 09:00:00] Alice: Trip on Saturday?\n\
                      [15/01/2023, 10:00:00] Bob: I'll bring snacks\n\
                      [15/01/2023, 09:58:00] Carol: synced late from another phone\n\
                      [16/01/2023, 11:30:00] Alice: Meet at 8";

struct Fixture {
    dir: TempDir,
    config: NamedTempFile,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("digest.db");

        let mut config = NamedTempFile::new().unwrap();
        writeln!(config, "database_path = {:?}", db_path.to_string_lossy()).unwrap();
        writeln!(config, "dry_run = true").unwrap();
        config.flush().unwrap();

        Self { dir, config }
    }

    fn export(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_digest"));
        command.arg("--config").arg(self.config.path());
        command
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("Failed to run digest")
    }

    fn summarize(&self, export: &Path) -> Output {
        self.command()
            .arg("summarize")
            .arg(export)
            .args(["--now", "2023-01-20T00:00:00"])
            .output()
            .expect("Failed to run digest summarize")
    }
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "digest failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn second_summary_of_same_export_has_nothing_new() {
    let fixture = Fixture::new();
    let export = fixture.export("WhatsApp Chat with Family.txt", EXPORT);

    let first = stdout(&fixture.summarize(&export));
    assert!(first.starts_with("Family\nsince 2022-10-20 00:00:00\n\n"), "{first}");
    assert!(first.contains("Carol: synced late from another phone"));
    assert!(first.ends_with("Alice: Meet at 8\n"));

    let second = stdout(&fixture.summarize(&export));
    assert_eq!(
        second,
        "Family\nsince 2023-01-16 11:30:00\n\nNo new messages to summarize.\n"
    );
}

#[test]
fn appended_lines_are_the_only_new_part() {
    let fixture = Fixture::new();
    let export = fixture.export("WhatsApp Chat with Family.txt", EXPORT);
    stdout(&fixture.summarize(&export));

    let longer = format!("{EXPORT}\n[17/01/2023, 08:15:00] Bob: Running late");
    let export = fixture.export("WhatsApp Chat with Family.txt", &longer);
    let window = stdout(
        &fixture
            .command()
            .arg("summarize")
            .arg(&export)
            .args(["--now", "2023-01-20T00:00:00", "--print-window"])
            .output()
            .unwrap(),
    );
    assert_eq!(window, "[17/01/2023, 08:15:00] Bob: Running late\n");
}

#[test]
fn undated_transcript_is_rejected() {
    let fixture = Fixture::new();
    let export = fixture.export("notes.txt", "just some notes\nwithout timestamps");

    let output = fixture.summarize(&export);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: invalid format"), "{stderr}");
}

#[test]
fn settings_are_scoped_per_conversation() {
    let fixture = Fixture::new();

    stdout(&fixture.run(&["--conversation", "family", "time", "1-week"]));
    stdout(&fixture.run(&[
        "--conversation",
        "family",
        "instructions",
        "add",
        "Keep it short",
    ]));

    let family = stdout(&fixture.run(&["--conversation", "family", "current"]));
    assert_eq!(
        family,
        "Conversation: family\nTime window: 1 week\nInstructions:\n0: Keep it short\nOne-time instruction: none\n"
    );

    let default = stdout(&fixture.run(&["current"]));
    assert!(default.contains("Time window: auto"));
    assert!(default.contains("Instructions: none"));
}

#[test]
fn chunk_reads_stdin() {
    let fixture = Fixture::new();
    let mut child = fixture
        .command()
        .args(["chunk", "--ceiling", "14", "--lookback", "6"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn digest chunk");

    {
        let stdin = child.stdin.as_mut().unwrap();
        stdin
            .write_all(b"alpha beta\ngamma delta\nepsilon")
            .unwrap();
    }

    let output = child.wait_with_output().unwrap();
    assert_eq!(
        stdout(&output),
        "alpha beta\n---\ngamma delta\n---\nepsilon\n"
    );
}
