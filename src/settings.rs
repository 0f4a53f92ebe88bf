//! Layered configuration: built-in defaults, then an optional
//! `expense-tracker.toml` (or the file given with `--config`), then
//! `EXPENSES_*` environment variables, then command-line flags.

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::application::AppError;

/// Config file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "expense-tracker";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SQLite database file
    pub database: String,
    /// Default tracing level for this crate
    pub log_level: String,
    /// Label printed in front of amounts
    pub currency: String,
    /// strftime pattern used to display dates
    pub date_format: String,
}

/// Values given on the command line. They win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<String>,
    pub log_level: Option<String>,
}

impl Settings {
    pub fn load(config_file: Option<&str>, overrides: Overrides) -> Result<Self, AppError> {
        let file = match config_file {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .set_default("database", "expenses.db")?
            .set_default("log_level", "warn")?
            .set_default("currency", "NT$")?
            .set_default("date_format", "%Y/%m/%d")?
            .add_source(file)
            .add_source(Environment::with_prefix("EXPENSES"))
            .set_override_option("database", overrides.database)?
            .set_override_option("log_level", overrides.log_level)?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Message(format!(
                "invalid date_format '{}'",
                self.date_format
            )));
        }
        Ok(())
    }

    /// Format a calendar date for display.
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }
}
