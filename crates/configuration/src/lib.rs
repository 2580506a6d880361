use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod parameters;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use parameters::TradingParameters;
pub use settings::{
    CancelFilter, Config, CurrencyBalance, InstrumentBalance, InstrumentReleaseMode,
    LoggingSettings, ReducerSettings, SessionSettings, UnderflowPolicy,
};

/// The file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "automata";

/// Loads the application configuration.
///
/// With `path` set, that file must exist. Without it, `automata.toml` in the
/// working directory is used if present and built-in defaults otherwise.
/// Environment variables prefixed with `AUTOMATA__` override file values, e.g.
/// `AUTOMATA__REDUCER__UNDERFLOW=reject`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("AUTOMATA")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
