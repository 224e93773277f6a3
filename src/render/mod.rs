
use crate::models::{Comment, Header, Line, Posting, Transaction};
use crate::types::DATE_FORMAT;

const INDENT: &str = "    ";
pub const DEFAULT_AMOUNT_COLUMN: usize = 40;

/// Turns a transaction into journal text.
///
/// Account names are padded to `amount_column` so amounts line up. Negative
/// amounts get one column less, putting their minus sign just left of the
/// column where positive amounts start.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Renderer {
    amount_column: usize
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_AMOUNT_COLUMN)
    }
}

impl Renderer {
    pub fn new(amount_column: usize) -> Self {
        Self { amount_column }
    }

    /// Renders `transaction` preceded by one blank line, so it can be appended
    /// straight after existing journal content.
    pub fn render(&self, transaction: &Transaction) -> String {
        let mut content = String::from("\n");

        for line in transaction.lines() {
            match line {
                Line::Header(header) => self.render_header(&mut content, header),
                Line::Posting(posting) => self.render_posting(&mut content, posting),
                Line::Comment(comment) => self.render_comment(&mut content, comment)
            }
            content.push('\n');
        }

        content
    }

    fn render_header(&self, content: &mut String, header: &Header) {
        content.push_str(&format!("{} {}", header.date.format(DATE_FORMAT), header.note));
    }

    fn render_comment(&self, content: &mut String, comment: &Comment) {
        if comment.indented {
            content.push_str(INDENT);
        }
        content.push_str(&comment.text);
    }

    fn render_posting(&self, content: &mut String, posting: &Posting) {
        content.push_str(INDENT);

        //NOTE: An unresolved posting is written bare, which hledger reads as an amount to infer
        let Some(amount) = &posting.amount else {
            content.push_str(&posting.account);
            return;
        };

        let column = if amount.is_negative() {
            self.amount_column.saturating_sub(1)
        } else {
            self.amount_column
        };

        content.push_str(&format!("{:<column$} {}", posting.account, amount));
    }
}
