use std::io::{self, BufRead, Write};

/// Where answers to the session's questions come from.
pub trait InputSource {
    /// Asks `question` and returns the trimmed answer, or `None` once the
    /// input is exhausted.
    fn ask(&mut self, question: &str) -> io::Result<Option<String>>;
}

/// Reads answers from standard input, printing each question on stdout.
pub struct TerminalInput<R> {
    reader: R
}

impl TerminalInput<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> TerminalInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> InputSource for TerminalInput<R> {
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        let mut output = io::stdout().lock();
        write!(output, "{question} ")?;
        output.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(None);
        }

        Ok(Some(line.trim().to_string()))
    }
}

/// Yes/no question where an empty answer means yes.
pub fn confirm<I: InputSource>(input: &mut I, question: &str) -> io::Result<bool> {
    let answer = input.ask(&format!("{question} (Y/n)?"))?;

    Ok(matches!(answer.map(|answer| answer.to_lowercase()).as_deref(), Some("" | "y" | "yes")))
}
