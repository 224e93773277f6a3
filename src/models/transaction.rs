use chrono::NaiveDate;

use crate::models::{Header, Line, Posting};

/// A transaction under composition.
///
/// Lines are only ever appended. Cross-line rules (a single leading header,
/// resolved amounts) are checked by the calculators and the renderer when
/// they inspect the sequence, never at append time.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Transaction {
    lines: Vec<Line>
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: impl Into<Line>) {
        self.lines.push(line.into());
    }

    pub fn extend<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: Into<Line>
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn postings(&self) -> impl Iterator<Item = &Posting> {
        self.lines.iter().filter_map(|line| match line {
            Line::Posting(posting) => Some(posting),
            _ => None
        })
    }

    pub fn header(&self) -> Option<&Header> {
        self.lines.iter().find_map(|line| match line {
            Line::Header(header) => Some(header),
            _ => None
        })
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.header().map(|header| header.date)
    }
}
