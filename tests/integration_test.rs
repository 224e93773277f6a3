use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use anyhow::{anyhow, Result};
use tempfile::TempDir;

const LUNCH: &str = "2024-03-01\nLunch\nexpenses:food\n12.50 USD\nassets:cash\n.\n\n";

fn run(arguments: &[&str], stdin: &str) -> Result<Output> {
    let binary_path = env!("CARGO_BIN_EXE_ledger-scribe");

    let mut child = Command::new(binary_path)
        .args(arguments)
        .env_remove("LEDGER_FILE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    child.stdin.take()
        .ok_or_else(|| anyhow!("stdin not captured"))?
        .write_all(stdin.as_bytes())?;

    Ok(child.wait_with_output()?)
}

fn write_config(directory: &Path, json: &str) -> Result<String> {
    let path = directory.join("config.json");
    fs::write(&path, json)?;
    Ok(path.display().to_string())
}

#[test]
fn test_dry_run_prints_aligned_transaction_without_writing() -> Result<()> {
    let directory = TempDir::new()?;
    let config = write_config(directory.path(), "{}")?;
    let journal = directory.path().join("ledger.journal");
    let journal_arg = journal.display().to_string();

    let output = run(&["--config", &config, "add", "--dry-run", "-f", &journal_arg], LUNCH)?;

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains(&format!("Adding this following transaction to {journal_arg}:")));
    assert!(stdout.contains("\n2024-03-01 Lunch\n"));
    assert!(stdout.contains(&format!("    {:<40} 12.50 USD\n", "expenses:food")));
    assert!(stdout.contains(&format!("    {:<39} -12.50 USD\n", "assets:cash")));
    assert!(!journal.exists());

    Ok(())
}

#[test]
fn test_amount_column_comes_from_config() -> Result<()> {
    let directory = TempDir::new()?;
    let config = write_config(directory.path(), r#"{ "amount_column": 20 }"#)?;
    let journal = directory.path().join("ledger.journal").display().to_string();

    let output = run(&["--config", &config, "add", "--dry-run", "-f", &journal], LUNCH)?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains(&format!("    {:<20} 12.50 USD\n", "expenses:food")));
    assert!(stdout.contains(&format!("    {:<19} -12.50 USD\n", "assets:cash")));

    Ok(())
}

#[test]
fn test_config_command_prints_and_creates_the_config_file() -> Result<()> {
    let directory = TempDir::new()?;
    let config = directory.path().join("scribe").join("config.json");
    let config_arg = config.display().to_string();

    let output = run(&["--config", &config_arg, "config"], "")?;

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?.trim(), config_arg);
    assert!(fs::read_to_string(&config)?.contains("equity:conversion"));

    Ok(())
}

#[test]
fn test_add_without_any_journal_fails() -> Result<()> {
    let directory = TempDir::new()?;
    let config = write_config(directory.path(), "{}")?;

    let output = run(&["--config", &config, "add"], LUNCH)?;

    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("No ledger file specified"));

    Ok(())
}

#[test]
fn test_empty_date_aborts_without_output() -> Result<()> {
    let directory = TempDir::new()?;
    let config = write_config(directory.path(), "{}")?;
    let journal = directory.path().join("ledger.journal").display().to_string();

    let output = run(&["--config", &config, "add", "-f", &journal], "\n")?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert!(stdout.contains("Abort."));
    assert!(!stdout.contains("Adding this following transaction"));

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_confirmed_transaction_is_appended_when_validation_passes() -> Result<()> {
    let directory = TempDir::new()?;
    let config = write_config(directory.path(), r#"{ "hledger": { "binary": "true" } }"#)?;
    let journal = directory.path().join("ledger.journal");
    fs::write(&journal, "; existing\n")?;
    let journal_arg = journal.display().to_string();

    let output = run(&["--config", &config, "add", "-f", &journal_arg], &format!("{LUNCH}y\n"))?;

    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("Transaction added successfully."));

    let content = fs::read_to_string(&journal)?;

    assert!(content.starts_with("; existing\n\n2024-03-01 Lunch\n"));
    assert!(content.contains("assets:cash"));

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_rejected_transaction_can_be_reverted() -> Result<()> {
    let directory = TempDir::new()?;
    let config = write_config(directory.path(), r#"{ "hledger": { "binary": "false" } }"#)?;
    let journal = directory.path().join("ledger.journal");
    fs::write(&journal, "; existing\n")?;
    let journal_arg = journal.display().to_string();

    let output = run(&["--config", &config, "add", "-f", &journal_arg], &format!("{LUNCH}\ny\n"))?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert!(stdout.contains("Error validating ledger:"));
    assert!(stdout.contains("Changes reverted."));
    assert_eq!(fs::read_to_string(&journal)?, "; existing\n");

    Ok(())
}

#[test]
fn test_discarded_transaction_leaves_journal_untouched() -> Result<()> {
    let directory = TempDir::new()?;
    let config = write_config(directory.path(), "{}")?;
    let journal = directory.path().join("ledger.journal");
    fs::write(&journal, "")?;
    let journal_arg = journal.display().to_string();

    let output = run(&["--config", &config, "add", "-f", &journal_arg], &format!("{LUNCH}n\n"))?;

    assert!(String::from_utf8(output.stdout)?.contains("Transaction discarded."));
    assert_eq!(fs::read_to_string(&journal)?, "");

    Ok(())
}
