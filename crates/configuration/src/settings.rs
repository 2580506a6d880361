use crate::error::ConfigError;
use core_types::Currency;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionSettings,
    pub reducer: ReducerSettings,
    pub logging: LoggingSettings,
}

impl Config {
    /// Checks the values that deserialization alone cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.session.currency_balances {
            if !seen.insert(entry.currency) {
                return Err(ConfigError::ValidationError(format!(
                    "currency {} is listed more than once",
                    entry.currency
                )));
            }
            if entry.balance < Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "starting balance for {} must not be negative",
                    entry.currency
                )));
            }
        }

        let mut seen = HashSet::new();
        for entry in &self.session.instrument_balances {
            if !seen.insert(entry.figi.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "instrument {} is listed more than once",
                    entry.figi
                )));
            }
            if entry.balance < Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "starting balance for {} must not be negative",
                    entry.figi
                )));
            }
        }

        if self.logging.file_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.file_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Starting account state for a trading session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// The currency the tracked instrument is priced and settled in.
    pub settlement_currency: Currency,
    pub currency_balances: Vec<CurrencyBalance>,
    pub instrument_balances: Vec<InstrumentBalance>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            settlement_currency: Currency::RUB,
            currency_balances: Vec::new(),
            instrument_balances: Vec::new(),
        }
    }
}

impl SessionSettings {
    pub fn currency_map(&self) -> HashMap<Currency, Decimal> {
        self.currency_balances
            .iter()
            .map(|entry| (entry.currency, entry.balance))
            .collect()
    }

    pub fn instrument_map(&self) -> HashMap<String, Decimal> {
        self.instrument_balances
            .iter()
            .map(|entry| (entry.figi.clone(), entry.balance))
            .collect()
    }
}

// Balances are lists rather than tables keyed by currency or figi, because
// table keys do not survive the config loader with their case intact.

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyBalance {
    pub currency: Currency,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentBalance {
    pub figi: String,
    pub balance: Decimal,
}

/// How the reducer releases reservations when an instrument stops trading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum InstrumentReleaseMode {
    /// Releases `price × executed lots × lot` for Buy orders on the currency
    /// side and `executed lots × lot` for Buy orders on the instrument side.
    #[default]
    AsObserved,
    /// Releases the unfilled part of Buy orders on the currency side and the
    /// unfilled part of Sell orders on the instrument side.
    Corrected,
}

/// Which orders survive a cancellation event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum CancelFilter {
    /// Keeps only the orders whose id matches the cancelled one.
    #[default]
    AsObserved,
    /// Drops the orders whose id matches the cancelled one.
    Corrected,
}

/// What happens when a transition drives a balance or reserve below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum UnderflowPolicy {
    Ignore,
    #[default]
    Warn,
    Reject,
}

/// Parameters controlling the state reducer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReducerSettings {
    pub release_mode: InstrumentReleaseMode,
    pub cancel_filter: CancelFilter,
    pub underflow: UnderflowPolicy,
    /// Wrap the reducer in the order-lifecycle validation layer.
    pub strict: bool,
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Directory for the rolling log files.
    pub directory: PathBuf,
    pub file_prefix: String,
    /// Also log to stdout.
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: PathBuf::from("logs"),
            file_prefix: "automata.log".to_string(),
            console: true,
        }
    }
}
