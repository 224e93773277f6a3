use chrono::NaiveDate;

use crate::types::{AccountName, Amount};

/// Opens a transaction: `<date> <note>`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Header {
    pub date: NaiveDate,
    pub note: String
}

/// A single account/amount line.
///
/// `amount` is `None` only while the posting is waiting for its amount to be
/// inferred by auto-balancing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Posting {
    pub account: AccountName,
    pub amount: Option<Amount>
}

impl Posting {
    pub fn new(account: impl Into<AccountName>, amount: Amount) -> Self {
        Self {
            account: account.into(),
            amount: Some(amount)
        }
    }

    pub fn pending(account: impl Into<AccountName>) -> Self {
        Self {
            account: account.into(),
            amount: None
        }
    }
}

/// Free-form annotation. The delimiter (`;` or `#`) is part of `text`.
///
/// Indented comments belong to the posting above them, the others to the
/// transaction as a whole.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Comment {
    pub text: String,
    pub indented: bool
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Line {
    Header(Header),
    Posting(Posting),
    Comment(Comment)
}

impl Line {
    pub fn header(date: NaiveDate, note: impl Into<String>) -> Self {
        Line::Header(Header { date, note: note.into() })
    }

    pub fn comment(text: impl Into<String>, indented: bool) -> Self {
        Line::Comment(Comment { text: text.into(), indented })
    }
}

impl From<Posting> for Line {
    fn from(posting: Posting) -> Self {
        Line::Posting(posting)
    }
}
