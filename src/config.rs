// Process-wide client configuration: an INI file with a `[client]`
// section, overridable from the environment.

use config::{Config, ConfigError, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "blueseave-app-client-config.ini";
pub const ENV_PREFIX: &str = "BLUESEAVE";

#[cfg(feature = "raster")]
pub const DEFAULT_CHART_FILE: &str = "budget_vs_spending.png";
#[cfg(not(feature = "raster"))]
pub const DEFAULT_CHART_FILE: &str = "budget_vs_spending.html";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the budget service, if configured.
    pub webservice: Option<String>,
    /// Request timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
    pub chart_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            webservice: None,
            timeout: None,
            chart_file: PathBuf::from(DEFAULT_CHART_FILE),
        }
    }
}

impl ClientConfig {
    /// Read `path` (if it exists) and `BLUESEAVE_CLIENT__*` variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_sources(path, ENV_PREFIX)
    }

    fn from_sources(path: &Path, env_prefix: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini).required(false))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let webservice = optional(settings.get_string("client.webservice"))?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let timeout = optional(settings.get_int("client.timeout_secs"))?
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64));
        let chart_file = optional(settings.get_string("client.chart_file"))?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_FILE));

        Ok(Self {
            webservice,
            timeout,
            chart_file,
        })
    }
}

fn optional<T>(value: Result<T, ConfigError>) -> Result<Option<T>, ConfigError> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
