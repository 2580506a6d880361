use crate::error::ConfigError;
use core_types::CandleInterval;

/// The instruments and candle intervals a session subscribes to, together with
/// the API credentials used by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingParameters {
    pub sso_token: String,
    pub tickers: Vec<String>,
    pub candle_intervals: Vec<CandleInterval>,
    pub sandbox_mode: bool,
}

impl TradingParameters {
    /// Builds the parameters from the raw program arguments.
    ///
    /// `tickers` and `candle_intervals` are comma-separated lists and must have
    /// the same number of entries: the n-th interval belongs to the n-th ticker.
    /// Any sandbox flag other than a case-insensitive `true` means live trading.
    pub fn from_program_args(
        sso_token: &str,
        tickers: &str,
        candle_intervals: &str,
        sandbox_mode: &str,
    ) -> Result<Self, ConfigError> {
        if sso_token.trim().is_empty() {
            return Err(ConfigError::InvalidParameters(
                "the authorization token is empty".to_string(),
            ));
        }

        let tickers: Vec<String> = tickers
            .split(',')
            .map(|ticker| ticker.trim().to_string())
            .collect();
        if tickers.iter().any(|ticker| ticker.is_empty()) {
            return Err(ConfigError::InvalidParameters(
                "ticker list contains an empty entry".to_string(),
            ));
        }

        let candle_intervals = candle_intervals
            .split(',')
            .map(|raw| {
                raw.trim()
                    .parse::<CandleInterval>()
                    .map_err(|e| ConfigError::InvalidParameters(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if candle_intervals.len() != tickers.len() {
            return Err(ConfigError::InvalidParameters(format!(
                "{} candle intervals given for {} tickers",
                candle_intervals.len(),
                tickers.len()
            )));
        }

        Ok(Self {
            sso_token: sso_token.to_string(),
            tickers,
            candle_intervals,
            sandbox_mode: sandbox_mode.trim().eq_ignore_ascii_case("true"),
        })
    }

    /// Pairs each ticker with its candle interval.
    pub fn subscriptions(&self) -> impl Iterator<Item = (&str, CandleInterval)> {
        self.tickers
            .iter()
            .map(String::as_str)
            .zip(self.candle_intervals.iter().copied())
    }

    /// The token with everything but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let visible: String = self
            .sso_token
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{}", visible)
    }
}
