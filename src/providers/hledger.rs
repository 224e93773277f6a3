use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Days;
use moka::future::Cache;
use rust_decimal::Decimal;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::journal::Validator;
use crate::models::BalanceSnapshot;
use crate::providers::report::sum_commodity;
use crate::providers::{BalanceProvider, BalanceQuery, ProviderError, RecordKind, RecordSearch};
use crate::types::DATE_FORMAT;

const RECORD_CACHE_CAPACITY: u64 = 256;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Delegates balance lookups, record searches and journal checks to the
/// hledger command line tool.
pub struct Hledger {
    binary: PathBuf,
    main_file: Option<PathBuf>,
    timeout: Duration,
    records: Cache<(RecordKind, String), Arc<Vec<String>>>
}

impl Hledger {
    pub fn new(binary: impl Into<PathBuf>, main_file: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            main_file,
            timeout,
            records: Self::record_cache(DEFAULT_CACHE_TTL)
        }
    }

    /// Search results older than `ttl` are fetched again.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.records = Self::record_cache(ttl);
        self
    }

    fn record_cache(ttl: Duration) -> Cache<(RecordKind, String), Arc<Vec<String>>> {
        Cache::builder()
            .max_capacity(RECORD_CACHE_CAPACITY)
            .time_to_live(ttl)
            .build()
    }

    /// Runs hledger with `arguments` and returns its standard output.
    ///
    /// The child is killed when the deadline passes or the future is dropped.
    async fn run(&self, arguments: &[String]) -> Result<String, ProviderError> {
        let program = self.binary.display().to_string();
        debug!("Running [{program} {}]", arguments.join(" "));

        let mut command = Command::new(&self.binary);
        command.args(arguments).kill_on_drop(true);

        let output = timeout(self.timeout, command.output()).await
            .map_err(|_| ProviderError::Timeout { program: program.clone(), timeout: self.timeout })?
            .map_err(|source| ProviderError::Spawn { program: program.clone(), source })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));

            warn!("[{program}] exited with {}", output.status);

            return Err(ProviderError::CommandFailed {
                program,
                arguments: arguments.join(" "),
                output: combined
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn balance_report(&self, query: &BalanceQuery, file: Option<&Path>, extra: &[String]) -> Result<String, ProviderError> {
        //NOTE: hledger end dates are exclusive, so the day after includes postings on the transaction date
        let end = query.as_of.checked_add_days(Days::new(1)).unwrap_or(query.as_of);

        let mut arguments = vec![
            "balance".to_string(),
            query.account.clone(),
            "--no-total".to_string(),
            "-e".to_string(),
            end.format(DATE_FORMAT).to_string(),
            "-O".to_string(),
            "csv".to_string(),
        ];
        arguments.extend(file_arguments(file));
        arguments.extend_from_slice(extra);

        self.run(&arguments).await
    }
}

fn file_arguments(file: Option<&Path>) -> Vec<String> {
    match file {
        Some(path) => vec!["-f".to_string(), path.display().to_string()],
        None => Vec::new()
    }
}

impl BalanceProvider for Hledger {
    async fn balance(&self, query: &BalanceQuery) -> Result<Option<BalanceSnapshot>, ProviderError> {
        let quantity_scope = query.file_scope.as_deref().or(self.main_file.as_deref());
        let value_scope = self.main_file.as_deref().or(query.file_scope.as_deref());

        let report = self.balance_report(query, quantity_scope, &[]).await?;
        let Some(quantity) = sum_commodity(&report, &query.commodity)? else {
            debug!("[{}] has no [{}] balance", query.account, query.commodity);
            return Ok(None);
        };

        let valuation = [
            "--cost".to_string(),
            format!("--value=then,{}", query.valuation),
        ];
        let report = self.balance_report(query, value_scope, &valuation).await?;
        let value_at_cost = sum_commodity(&report, &query.valuation)?.unwrap_or(Decimal::ZERO);

        debug!("[{}] holds {quantity} {} valued at {value_at_cost} {}", query.account, query.commodity, query.valuation);

        Ok(Some(BalanceSnapshot::new(quantity, value_at_cost)))
    }
}

impl RecordSearch for Hledger {
    async fn search(&self, kind: RecordKind, term: &str) -> Result<Vec<String>, ProviderError> {
        let key = (kind, term.to_string());

        if let Some(records) = self.records.get(&key).await {
            debug!("Serving {} matching [{term}] from cache", kind.command());
            return Ok(records.as_ref().clone());
        }

        let mut arguments = vec![kind.command().to_string()];
        if !term.is_empty() {
            arguments.push(term.to_string());
        }
        arguments.extend(file_arguments(self.main_file.as_deref()));

        let output = self.run(&arguments).await?;
        let records: Vec<String> = output.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        self.records.insert(key, Arc::new(records.clone())).await;

        Ok(records)
    }
}

impl Validator for Hledger {
    async fn check(&self, path: &Path) -> Result<(), ProviderError> {
        let mut arguments = vec!["check".to_string()];
        arguments.extend(file_arguments(Some(path)));

        self.run(&arguments).await.map(|_| ())
    }
}
