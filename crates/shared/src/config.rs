//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Response normalizer configuration.
    pub normalizer: NormalizerConfig,
    /// Chart of accounts keyword overrides.
    pub chart: ChartConfig,
    /// Reconciliation configuration.
    pub reconciliation: ReconciliationConfig,
}

/// Response normalizer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizerConfig {
    /// Clarification shown when a follow-up response carries none.
    #[serde(default = "default_clarification")]
    pub default_clarification: String,
    /// Message shown when an error response carries no usable message.
    #[serde(default = "default_generic_error")]
    pub generic_error: String,
}

fn default_clarification() -> String {
    "More information is needed to prepare this entry.".to_string()
}

fn default_generic_error() -> String {
    "Something went wrong while processing the request.".to_string()
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            default_clarification: default_clarification(),
            generic_error: default_generic_error(),
        }
    }
}

/// Chart of accounts keyword overrides.
///
/// Each list replaces the built-in keywords for its bucket. Lists left unset
/// keep the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Income keywords.
    pub income: Option<Vec<String>>,
    /// Expense keywords.
    pub expenses: Option<Vec<String>>,
    /// Asset keywords.
    pub assets: Option<Vec<String>>,
    /// Liability keywords.
    pub liabilities: Option<Vec<String>>,
    /// Equity keywords.
    pub equity: Option<Vec<String>>,
}

/// Reconciliation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Decimal places represented by one minor unit (2 for cents).
    #[serde(default = "default_minor_unit_scale")]
    pub minor_unit_scale: u32,
}

fn default_minor_unit_scale() -> u32 {
    2
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            minor_unit_scale: default_minor_unit_scale(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLYBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
