use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Could not run [{program}]: {source}")]
    Spawn {
        program: String,
        source: io::Error
    },
    #[error("[{program}] did not answer within {timeout:?}")]
    Timeout {
        program: String,
        timeout: Duration
    },
    #[error("[{program} {arguments}] failed:\n{output}")]
    CommandFailed {
        program: String,
        arguments: String,
        output: String
    },
    #[error("Unreadable balance report: {0}")]
    Report(#[from] csv::Error),
    #[error("Unreadable amount [{input}] in balance report")]
    ReportAmount {
        input: String
    }
}
