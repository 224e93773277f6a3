use super::{confirm, drive, ForeignLeg, InputSource, Session, SessionError, State, Step, TerminalInput};

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use crate::engine::{ConversionAccounts, ConversionError, CurrencyConverter};
use crate::journal::JournalLocator;
use crate::models::{BalanceSnapshot, Comment, Line, Posting};
use crate::providers::{BalanceProvider, BalanceQuery, ProviderError, RecordKind, RecordSearch};
use crate::types::Amount;

#[derive(Default)]
struct StubServices {
    accounts: Vec<String>,
    notes: Vec<String>,
    snapshot: Option<BalanceSnapshot>,
    search_fails: bool
}

impl BalanceProvider for StubServices {
    async fn balance(&self, _query: &BalanceQuery) -> Result<Option<BalanceSnapshot>, ProviderError> {
        Ok(self.snapshot)
    }
}

impl RecordSearch for StubServices {
    async fn search(&self, kind: RecordKind, term: &str) -> Result<Vec<String>, ProviderError> {
        if self.search_fails {
            return Err(ProviderError::Timeout {
                program: "hledger".to_string(),
                timeout: Duration::from_secs(10)
            });
        }

        let records = match kind {
            RecordKind::Accounts => &self.accounts,
            RecordKind::Notes => &self.notes
        };

        Ok(records.iter().filter(|record| record.contains(term)).cloned().collect())
    }
}

struct ScriptedInput {
    answers: VecDeque<String>,
    questions: Vec<String>
}

impl ScriptedInput {
    fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(ToString::to_string).collect(),
            questions: Vec::new()
        }
    }
}

impl InputSource for ScriptedInput {
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        self.questions.push(question.to_string());
        Ok(self.answers.pop_front())
    }
}

fn today() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 3, 15).ok_or_else(|| anyhow!("invalid fixture date"))
}

fn converter() -> CurrencyConverter {
    CurrencyConverter::new(ConversionAccounts {
        conversion: "equity:conversion".to_string(),
        fx_gain: "income:fx gain".to_string(),
        fx_loss: "expenses:fx loss".to_string()
    })
}

fn fixed_locator() -> JournalLocator {
    JournalLocator::Fixed(PathBuf::from("ledger.journal"))
}

fn services_with_accounts() -> StubServices {
    StubServices {
        accounts: vec!["assets:cash".to_string(), "assets:eur".to_string(), "expenses:food".to_string()],
        notes: vec!["Lunch".to_string(), "Groceries".to_string()],
        ..StubServices::default()
    }
}

async fn feed_all<S: BalanceProvider + RecordSearch>(session: &mut Session<'_, S>, answers: &[&str]) -> Result<Step> {
    let mut step = Step::Continue;
    for answer in answers {
        step = session.feed(answer).await?;
    }
    Ok(step)
}

fn postings(lines: &[Line]) -> Vec<(String, String)> {
    lines.iter()
        .filter_map(|line| match line {
            Line::Posting(Posting { account, amount: Some(amount) }) => Some((account.clone(), amount.to_string())),
            _ => None
        })
        .collect()
}

#[tokio::test]
async fn test_session_composes_and_balances_a_transaction() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    let step = feed_all(&mut session, &["2024-03-01", "Lunch", "expenses:food", "12.50 USD", "assets:cash", ".", ""]).await?;

    assert_eq!(step, Step::Finished);

    let draft = session.finish().ok_or_else(|| anyhow!("session should have a draft"))?;

    assert_eq!(draft.journal, PathBuf::from("ledger.journal"));
    assert_eq!(draft.transaction.header().map(|header| header.note.as_str()), Some("Lunch"));
    assert_eq!(postings(draft.transaction.lines()), vec![
        ("expenses:food".to_string(), "12.50 USD".to_string()),
        ("assets:cash".to_string(), "-12.50 USD".to_string()),
    ]);

    Ok(())
}

#[tokio::test]
async fn test_empty_date_aborts() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    assert_eq!(session.feed("").await?, Step::Aborted);
    assert_eq!(session.state(), &State::Done);
    assert!(session.finish().is_none());

    Ok(())
}

#[tokio::test]
async fn test_date_shorthand_is_relative_to_today() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &[".y", "Coffee"]).await?;

    assert_eq!(session.transaction.date(), NaiveDate::from_ymd_opt(2024, 3, 14));

    Ok(())
}

#[tokio::test]
async fn test_invalid_date_keeps_asking_for_a_date() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    let result = session.feed("03/01/2024").await;

    assert!(matches!(result, Err(SessionError::Date(_))));
    assert_eq!(session.state(), &State::AwaitDate);
    assert_eq!(session.prompt(), "Date?");

    Ok(())
}

#[tokio::test]
async fn test_uninitialized_year_keeps_asking_for_a_date() -> Result<()> {
    let root = TempDir::new()?;
    let locator = JournalLocator::Sharded { root: root.path().to_path_buf() };
    let (converter, services) = (converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    let result = session.feed("2031-01-01").await;

    assert!(matches!(result, Err(SessionError::Journal(_))));
    assert_eq!(session.state(), &State::AwaitDate);
    assert!(session.journal.is_none());

    Ok(())
}

#[tokio::test]
async fn test_comments_keep_their_delimiter_and_placement() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["#", "imported", "2024-03-01", "Lunch", ";", "split with Sam", "#", "receipt lost"]).await?;

    let comments: Vec<&Comment> = session.transaction.lines().iter()
        .filter_map(|line| match line {
            Line::Comment(comment) => Some(comment),
            _ => None
        })
        .collect();

    assert!(matches!(session.transaction.lines().first(), Some(Line::Comment(_))));
    assert_eq!(comments.len(), 3);
    assert_eq!((comments[0].text.as_str(), comments[0].indented), ("# imported", false));
    assert_eq!((comments[1].text.as_str(), comments[1].indented), ("; split with Sam", true));
    assert_eq!((comments[2].text.as_str(), comments[2].indented), ("# receipt lost", false));
    assert_eq!(session.state(), &State::AwaitAccount);

    Ok(())
}

#[tokio::test]
async fn test_amount_is_required() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["2024-03-01", "Lunch", "expenses:food"]).await?;
    let result = session.feed("").await;

    assert!(matches!(result, Err(SessionError::AmountRequired)));
    assert_eq!(session.state(), &State::AwaitAmount { account: "expenses:food".to_string() });

    Ok(())
}

#[tokio::test]
async fn test_failed_auto_balance_keeps_asking_for_the_amount() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["2024-03-01", "Trip", "assets:eur", "100 EUR", "assets:cash", "-110 USD", "expenses:misc"]).await?;
    let before = session.transaction.clone();

    let result = session.feed(".").await;

    assert!(matches!(result, Err(SessionError::Balance(_))));
    assert_eq!(&session.transaction, &before);
    assert_eq!(session.state(), &State::AwaitAmount { account: "expenses:misc".to_string() });

    Ok(())
}

#[tokio::test]
async fn test_invalid_amount_is_rejected() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["2024-03-01", "Lunch", "expenses:food"]).await?;

    assert!(matches!(session.feed("12.50").await, Err(SessionError::Amount(_))));
    assert!(matches!(session.feed("twelve USD").await, Err(SessionError::Amount(_))));
    assert_eq!(session.feed("12.50 USD").await?, Step::Continue);

    Ok(())
}

#[tokio::test]
async fn test_account_search_selects_by_index_or_free_text() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), services_with_accounts());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["2024-03-01", "Lunch", ".assets"]).await?;

    assert_eq!(session.prompt(), "Select account (type index or full name):");
    assert!(matches!(session.state(), State::AwaitSelection { candidates, .. } if candidates.len() == 2));

    session.feed("2").await?;
    assert_eq!(session.state(), &State::AwaitAmount { account: "assets:eur".to_string() });

    feed_all(&mut session, &["5 EUR", ".", "liabilities:card"]).await?;
    assert_eq!(session.state(), &State::AwaitAmount { account: "liabilities:card".to_string() });

    Ok(())
}

#[tokio::test]
async fn test_empty_selection_returns_to_the_question() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), services_with_accounts());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["2024-03-01", "Lunch", ".", ""]).await?;

    assert_eq!(session.state(), &State::AwaitAccount);

    Ok(())
}

#[tokio::test]
async fn test_note_search_fills_the_header() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), services_with_accounts());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["2024-03-01", ".Gro", "1"]).await?;

    assert_eq!(session.transaction.header().map(|header| header.note.as_str()), Some("Groceries"));
    assert_eq!(session.state(), &State::AwaitAccount);

    Ok(())
}

#[tokio::test]
async fn test_search_without_results_or_with_failure_stays_put() -> Result<()> {
    let (locator, converter) = (fixed_locator(), converter());
    let empty = services_with_accounts();
    let failing = StubServices { search_fails: true, ..StubServices::default() };

    let mut session = Session::new(today()?, &locator, &converter, &empty);
    feed_all(&mut session, &["2024-03-01", "Lunch"]).await?;
    let result = session.feed(".income").await;
    assert!(matches!(result, Err(SessionError::NoRecords { kind: RecordKind::Accounts })));
    assert_eq!(session.state(), &State::AwaitAccount);

    let mut session = Session::new(today()?, &locator, &converter, &failing);
    feed_all(&mut session, &["2024-03-01"]).await?;
    let result = session.feed(".").await;
    assert!(matches!(result, Err(SessionError::Search { kind: RecordKind::Notes, .. })));
    assert_eq!(session.state(), &State::AwaitNote);

    Ok(())
}

#[tokio::test]
async fn test_foreign_leg_acquisition_finishes_the_transaction() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    let step = feed_all(&mut session, &["2024-03-01", "Exchange", "$assets:eur", "100 EUR", "assets:cash", "-110 USD"]).await?;

    assert_eq!(step, Step::Finished);
    assert_eq!(postings(session.transaction.lines()), vec![
        ("assets:eur".to_string(), "100 EUR @@ 110 USD".to_string()),
        ("assets:cash".to_string(), "-110 USD".to_string()),
        ("equity:conversion".to_string(), "-100 EUR".to_string()),
        ("equity:conversion".to_string(), "110 USD".to_string()),
    ]);

    Ok(())
}

#[tokio::test]
async fn test_acquisition_with_incoming_local_amount_is_refused() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["2024-03-01", "Exchange", "$assets:eur", "100 EUR", "assets:cash"]).await?;
    let result = session.feed("110 USD").await;

    assert!(matches!(result, Err(SessionError::Conversion(ConversionError::LocalLegNotNegative { .. }))));
    assert!(matches!(session.state(), State::AwaitForeignLeg(ForeignLeg::LocalAmount { .. })));
    assert_eq!(session.transaction.postings().count(), 0);

    assert_eq!(session.feed("-110 USD").await?, Step::Finished);

    Ok(())
}

#[tokio::test]
async fn test_foreign_leg_disposal_realizes_gain() -> Result<()> {
    let services = StubServices {
        snapshot: Some(BalanceSnapshot::new(dec!(200), dec!(220))),
        ..services_with_accounts()
    };
    let (locator, converter) = (fixed_locator(), converter());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    let step = feed_all(&mut session, &["2024-03-01", "Exchange", "$assets:eur", "-50 EUR", ".cash", "1", "58 USD"]).await?;

    assert_eq!(step, Step::Finished);

    let lines = postings(session.transaction.lines());

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], ("assets:cash".to_string(), "58 USD".to_string()));
    assert_eq!(lines[2], ("income:fx gain".to_string(), "-3.00 USD".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_foreign_leg_can_be_cancelled_and_requires_a_local_account() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["2024-03-01", "Exchange", "$assets:eur"]).await?;
    assert_eq!(session.state(), &State::AwaitForeignLeg(ForeignLeg::Amount { account: "assets:eur".to_string() }));

    session.feed("").await?;
    assert_eq!(session.state(), &State::AwaitAccount);

    feed_all(&mut session, &["$assets:eur", "100 EUR"]).await?;
    assert!(matches!(session.feed("").await, Err(SessionError::LocalAccountRequired)));
    assert!(matches!(session.state(), State::AwaitForeignLeg(ForeignLeg::LocalAccount { .. })));

    feed_all(&mut session, &["assets:cash", ""]).await?;
    assert_eq!(session.state(), &State::AwaitAccount);
    assert_eq!(session.transaction.postings().count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_failed_conversion_keeps_asking_for_the_local_amount() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let mut session = Session::new(today()?, &locator, &converter, &services);

    feed_all(&mut session, &["2024-03-01", "Exchange", "$assets:eur", "-50 EUR", "assets:cash"]).await?;
    let result = session.feed("58 USD").await;

    assert!(matches!(result, Err(SessionError::Conversion(_))));
    assert!(matches!(session.state(), State::AwaitForeignLeg(ForeignLeg::LocalAmount { .. })));
    assert_eq!(session.transaction.postings().count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_drive_reports_errors_and_returns_the_draft() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), services_with_accounts());
    let session = Session::new(today()?, &locator, &converter, &services);
    let mut input = ScriptedInput::new(&["yesterday", ".", "Lunch", ".food", "1", "", "9.90 USD", "assets:cash", ".", ""]);
    let mut output = Vec::new();

    let draft = drive(session, &mut input, &mut output).await?
        .ok_or_else(|| anyhow!("drive should return a draft"))?;
    let printed = String::from_utf8(output)?;

    assert!(printed.contains("Invalid date format [yesterday]"));
    assert!(printed.contains("Following accounts found:\n  1) expenses:food\n"));
    assert!(printed.contains("Amount must be specified"));
    assert_eq!(input.questions.first().map(String::as_str), Some("Date?"));
    assert_eq!(draft.transaction.postings().last().and_then(|posting| posting.amount.clone()), Some(Amount::new(dec!(-9.90), "USD")));

    Ok(())
}

#[tokio::test]
async fn test_drive_returns_nothing_when_input_runs_out() -> Result<()> {
    let (locator, converter, services) = (fixed_locator(), converter(), StubServices::default());
    let session = Session::new(today()?, &locator, &converter, &services);
    let mut input = ScriptedInput::new(&["2024-03-01", "Lunch", "expenses:food"]);
    let mut output = Vec::new();

    assert!(drive(session, &mut input, &mut output).await?.is_none());

    let session = Session::new(today()?, &locator, &converter, &services);
    let mut input = ScriptedInput::new(&[""]);

    assert!(drive(session, &mut input, &mut output).await?.is_none());
    assert!(String::from_utf8(output)?.contains("Abort."));

    Ok(())
}

#[test]
fn test_confirm_defaults_to_yes() -> Result<()> {
    let mut input = ScriptedInput::new(&["", "Y", "yes", "n", "nope"]);

    assert!(confirm(&mut input, "Is this correct")?);
    assert!(confirm(&mut input, "Is this correct")?);
    assert!(confirm(&mut input, "Is this correct")?);
    assert!(!confirm(&mut input, "Is this correct")?);
    assert!(!confirm(&mut input, "Is this correct")?);
    assert!(!confirm(&mut input, "Is this correct")?);
    assert_eq!(input.questions[0], "Is this correct (Y/n)?");

    Ok(())
}

#[test]
fn test_terminal_input_trims_answers_and_detects_the_end() -> Result<()> {
    let mut input = TerminalInput::new(io::Cursor::new("  2024-03-01  \n\n"));

    assert_eq!(input.ask("Date?")?, Some("2024-03-01".to_string()));
    assert_eq!(input.ask("Note?")?, Some(String::new()));
    assert_eq!(input.ask("Account?")?, None);

    Ok(())
}
