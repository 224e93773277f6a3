mod errors;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::ConversionAccounts;
use crate::render::DEFAULT_AMOUNT_COLUMN;

pub use errors::ConfigError;

const APPLICATION_DIRECTORY: &str = "ledger-scribe";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub amount_column: usize,
    pub accounts: AccountsConfig,
    pub efficient_file_structure: FileStructureConfig,
    pub hledger: HledgerConfig
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AccountsConfig {
    pub conversion: String,
    pub fx_gain: String,
    pub fx_loss: String
}

/// Per-period journals under `files_root/<year>/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileStructureConfig {
    #[serde(rename = "enable")]
    pub enabled: bool,
    pub files_root: String
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HledgerConfig {
    pub binary: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            amount_column: DEFAULT_AMOUNT_COLUMN,
            accounts: AccountsConfig::default(),
            efficient_file_structure: FileStructureConfig::default(),
            hledger: HledgerConfig::default()
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            conversion: "equity:conversion".into(),
            fx_gain: "income:fx gain".into(),
            fx_loss: "expenses:fx loss".into()
        }
    }
}

impl Default for FileStructureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            files_root: "~/finance/".into()
        }
    }
}

impl Default for HledgerConfig {
    fn default() -> Self {
        Self {
            binary: "hledger".into(),
            timeout_secs: 10,
            cache_ttl_secs: 300
        }
    }
}

impl Config {
    /// `<user config dir>/ledger-scribe/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDirectory)?;
        Ok(base.join(APPLICATION_DIRECTORY).join(CONFIG_FILE))
    }

    /// Reads the config at `path`, writing the defaults there first if the
    /// file does not exist yet.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            info!("No config file found. Creating config file in: {}", path.display());
            config.save(path)?;
            return Ok(config);
        }

        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

        serde_json::from_str(&data).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

        fs::write(path, json).map_err(io_error)
    }

    pub fn conversion_accounts(&self) -> ConversionAccounts {
        ConversionAccounts {
            conversion: self.accounts.conversion.clone(),
            fx_gain: self.accounts.fx_gain.clone(),
            fx_loss: self.accounts.fx_loss.clone()
        }
    }

    /// Root of the per-period journals, with a leading `~` expanded.
    pub fn files_root(&self) -> PathBuf {
        expand_home(&self.efficient_file_structure.files_root)
    }

    pub fn hledger_timeout(&self) -> Duration {
        Duration::from_secs(self.hledger.timeout_secs)
    }

    pub fn hledger_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.hledger.cache_ttl_secs)
    }
}

pub fn expand_home(raw: &str) -> PathBuf {
    let home = dirs::home_dir();

    match (raw.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(raw)
    }
}
