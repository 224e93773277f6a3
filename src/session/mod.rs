mod errors;
mod input;
#[cfg(test)]
mod tests;

use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::engine::{compute_balancing_amount, Conversion, ConversionRequest, CurrencyConverter};
use crate::journal::JournalLocator;
use crate::models::{Line, Posting, Transaction};
use crate::providers::{BalanceProvider, RecordKind, RecordSearch};
use crate::types::{parse_date, AccountName, Amount};

pub use errors::SessionError;
pub use input::{confirm, InputSource, TerminalInput};

const SEARCH_PREFIX: char = '.';
const FOREIGN_PREFIX: char = '$';
const AUTO_BALANCE: &str = ".";

/// Steps of a currency conversion entered after a `$account` line.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ForeignLeg {
    Amount {
        account: AccountName
    },
    LocalAccount {
        account: AccountName,
        amount: String
    },
    LocalAmount {
        account: AccountName,
        amount: String,
        local_account: AccountName
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum State {
    AwaitDate,
    AwaitNote,
    AwaitAccount,
    AwaitAmount {
        account: AccountName
    },
    AwaitForeignLeg(ForeignLeg),
    AwaitComment {
        delimiter: char,
        indented: bool,
        resume: Box<State>
    },
    AwaitSelection {
        kind: RecordKind,
        candidates: Vec<String>,
        resume: Box<State>
    },
    Done
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Step {
    Continue,
    Finished,
    Aborted
}

/// A completed transaction and the journal it should be appended to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Draft {
    pub transaction: Transaction,
    pub journal: PathBuf
}

/// Composes one transaction from line-by-line answers.
///
/// Every answer goes through [`Session::feed`]. A rejected answer leaves the
/// session in the state it was in, so the same question can be asked again.
pub struct Session<'a, S> {
    state: State,
    transaction: Transaction,
    date: Option<NaiveDate>,
    journal: Option<PathBuf>,
    today: NaiveDate,
    locator: &'a JournalLocator,
    converter: &'a CurrencyConverter,
    services: &'a S
}

impl<'a, S: BalanceProvider + RecordSearch> Session<'a, S> {
    pub fn new(today: NaiveDate, locator: &'a JournalLocator, converter: &'a CurrencyConverter, services: &'a S) -> Self {
        Self {
            state: State::AwaitDate,
            transaction: Transaction::new(),
            date: None,
            journal: None,
            today,
            locator,
            converter,
            services
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn prompt(&self) -> String {
        match &self.state {
            State::AwaitDate => "Date?".to_string(),
            State::AwaitNote => "Note?".to_string(),
            State::AwaitAccount | State::AwaitForeignLeg(ForeignLeg::LocalAccount { .. }) => "Account?".to_string(),
            State::AwaitAmount { .. } | State::AwaitForeignLeg(_) => "Amount?".to_string(),
            State::AwaitComment { .. } => "Comment?".to_string(),
            State::AwaitSelection { kind, .. } => format!("Select {} (type index or full name):", kind.singular()),
            State::Done => String::new()
        }
    }

    pub async fn feed(&mut self, input: &str) -> Result<Step, SessionError> {
        let input = input.trim();

        match self.state.clone() {
            State::AwaitDate => self.on_date(input),
            State::AwaitNote => self.on_note(input).await,
            State::AwaitAccount => self.on_account(input).await,
            State::AwaitAmount { account } => self.on_amount(account, input),
            State::AwaitForeignLeg(leg) => self.on_foreign_leg(leg, input).await,
            State::AwaitComment { delimiter, indented, resume } => {
                self.transaction.append(Line::comment(comment_text(delimiter, input), indented));
                self.state = *resume;
                Ok(Step::Continue)
            }
            State::AwaitSelection { candidates, resume, .. } => Ok(self.on_selection(&candidates, *resume, input)),
            State::Done => Ok(self.outcome())
        }
    }

    /// The composed transaction, unless the session was aborted.
    pub fn finish(self) -> Option<Draft> {
        let journal = self.journal?;
        self.transaction.header()?;

        Some(Draft {
            transaction: self.transaction,
            journal
        })
    }

    fn outcome(&self) -> Step {
        if self.journal.is_some() && self.transaction.header().is_some() {
            Step::Finished
        } else {
            Step::Aborted
        }
    }

    fn on_date(&mut self, input: &str) -> Result<Step, SessionError> {
        match input {
            "" => {
                self.state = State::Done;
                Ok(Step::Aborted)
            }
            ";" | "#" => Ok(self.await_comment(input, false, State::AwaitDate)),
            _ => {
                let date = parse_date(input, self.today)?;
                let journal = self.locator.locate(date)?;

                debug!("Transaction dated [{date}] goes to [{}]", journal.display());

                self.date = Some(date);
                self.journal = Some(journal);
                self.state = State::AwaitNote;
                Ok(Step::Continue)
            }
        }
    }

    async fn on_note(&mut self, input: &str) -> Result<Step, SessionError> {
        match input.strip_prefix(SEARCH_PREFIX) {
            Some(term) => self.search(RecordKind::Notes, term, State::AwaitNote).await,
            None => Ok(self.accept_note(input))
        }
    }

    fn accept_note(&mut self, note: &str) -> Step {
        let Some(date) = self.date else {
            self.state = State::AwaitDate;
            return Step::Continue;
        };

        self.transaction.append(Line::header(date, note));
        self.state = State::AwaitAccount;
        Step::Continue
    }

    async fn on_account(&mut self, input: &str) -> Result<Step, SessionError> {
        match input {
            "" => {
                self.state = State::Done;
                Ok(Step::Finished)
            }
            ";" | "#" => Ok(self.await_comment(input, input == ";", State::AwaitAccount)),
            _ => match input.strip_prefix(SEARCH_PREFIX) {
                Some(term) => self.search(RecordKind::Accounts, term, State::AwaitAccount).await,
                None => Ok(self.accept_account(input))
            }
        }
    }

    fn accept_account(&mut self, account: &str) -> Step {
        self.state = match account.strip_prefix(FOREIGN_PREFIX) {
            Some(foreign) => State::AwaitForeignLeg(ForeignLeg::Amount { account: foreign.trim().to_string() }),
            None => State::AwaitAmount { account: account.to_string() }
        };
        Step::Continue
    }

    fn on_amount(&mut self, account: AccountName, input: &str) -> Result<Step, SessionError> {
        let amount = match input {
            "" => return Err(SessionError::AmountRequired),
            AUTO_BALANCE => {
                let mut pending = self.transaction.clone();
                pending.append(Posting::pending(account.as_str()));
                compute_balancing_amount(&pending)?
            }
            _ => Amount::from_str(input)?
        };

        debug!("Posting [{account}] [{amount}] added");

        self.transaction.append(Posting::new(account, amount));
        self.state = State::AwaitAccount;
        Ok(Step::Continue)
    }

    async fn on_foreign_leg(&mut self, leg: ForeignLeg, input: &str) -> Result<Step, SessionError> {
        match leg {
            ForeignLeg::Amount { account } => {
                if input.is_empty() {
                    self.state = State::AwaitAccount;
                    return Ok(Step::Continue);
                }

                Amount::parse_plain(input)?;
                self.state = State::AwaitForeignLeg(ForeignLeg::LocalAccount { account, amount: input.to_string() });
                Ok(Step::Continue)
            }
            ForeignLeg::LocalAccount { account, amount } => {
                let resume = State::AwaitForeignLeg(ForeignLeg::LocalAccount { account: account.clone(), amount: amount.clone() });

                match input {
                    "" => Err(SessionError::LocalAccountRequired),
                    ";" | "#" => Ok(self.await_comment(input, input == ";", resume)),
                    _ => match input.strip_prefix(SEARCH_PREFIX) {
                        Some(term) => self.search(RecordKind::Accounts, term, resume).await,
                        None => {
                            self.state = State::AwaitForeignLeg(ForeignLeg::LocalAmount { account, amount, local_account: input.to_string() });
                            Ok(Step::Continue)
                        }
                    }
                }
            }
            ForeignLeg::LocalAmount { account, amount, local_account } => {
                if input.is_empty() {
                    self.state = State::AwaitAccount;
                    return Ok(Step::Continue);
                }

                let request = ConversionRequest {
                    foreign_account: &account,
                    foreign_amount: &amount,
                    local_account: &local_account,
                    local_amount: input,
                    file_scope: self.journal.as_deref()
                };

                let conversion = self.converter.convert(&mut self.transaction, &request, self.services).await?;

                match conversion {
                    Conversion::Acquisition => info!("Acquisition into [{account}] paid from [{local_account}] recorded"),
                    Conversion::Disposal(disposal) => info!(
                        "Disposal from [{account}] valued at {} (whole holding: {}), {} routed to [{}]",
                        disposal.disposed_value, disposal.full, disposal.gain_loss, disposal.gain_loss_account
                    )
                }

                self.state = State::Done;
                Ok(Step::Finished)
            }
        }
    }

    fn on_selection(&mut self, candidates: &[String], resume: State, input: &str) -> Step {
        if input.is_empty() {
            self.state = resume;
            return Step::Continue;
        }

        let choice = input.parse::<usize>().ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| candidates.get(index))
            .map_or(input, String::as_str)
            .to_string();

        match resume {
            State::AwaitNote => self.accept_note(&choice),
            State::AwaitAccount => self.accept_account(&choice),
            State::AwaitForeignLeg(ForeignLeg::LocalAccount { account, amount }) => {
                self.state = State::AwaitForeignLeg(ForeignLeg::LocalAmount { account, amount, local_account: choice });
                Step::Continue
            }
            other => {
                self.state = other;
                Step::Continue
            }
        }
    }

    async fn search(&mut self, kind: RecordKind, term: &str, resume: State) -> Result<Step, SessionError> {
        let candidates = self.services.search(kind, term.trim()).await
            .map_err(|error| SessionError::search(kind, error))?;

        if candidates.is_empty() {
            return Err(SessionError::NoRecords { kind });
        }

        self.state = State::AwaitSelection {
            kind,
            candidates,
            resume: Box::new(resume)
        };
        Ok(Step::Continue)
    }

    fn await_comment(&mut self, delimiter: &str, indented: bool, resume: State) -> Step {
        self.state = State::AwaitComment {
            delimiter: delimiter.chars().next().unwrap_or(';'),
            indented,
            resume: Box::new(resume)
        };
        Step::Continue
    }
}

fn comment_text(delimiter: char, text: &str) -> String {
    if text.is_empty() {
        delimiter.to_string()
    } else {
        format!("{delimiter} {text}")
    }
}

/// Asks questions from `input` until the session finishes.
///
/// Rejected answers are reported on `output` and the question is asked again.
/// Returns `None` if the session was aborted or the input ran out.
pub async fn drive<S, I, W>(mut session: Session<'_, S>, input: &mut I, output: &mut W) -> io::Result<Option<Draft>>
where
    S: BalanceProvider + RecordSearch,
    I: InputSource,
    W: Write
{
    loop {
        if let State::AwaitSelection { kind, candidates, .. } = session.state() {
            writeln!(output, "Following {} found:", kind.command())?;
            for (index, candidate) in candidates.iter().enumerate() {
                writeln!(output, "  {}) {candidate}", index + 1)?;
            }
        }

        let Some(answer) = input.ask(&session.prompt())? else {
            debug!("Input closed before the transaction was finished");
            return Ok(None);
        };

        match session.feed(&answer).await {
            Ok(Step::Continue) => {}
            Ok(Step::Finished) => return Ok(session.finish()),
            Ok(Step::Aborted) => {
                writeln!(output, "Abort.")?;
                return Ok(None);
            }
            Err(error) => {
                debug!("Answer [{answer}] rejected: {error:?}");
                writeln!(output, "{error}")?;
            }
        }
    }
}
