//! Error types surfaced by registration, configuration and persistence.
//! Gate failures are not errors: they are reported as [`crate::dispatch::Dispatch`] values.
use std::path::PathBuf;
use thiserror::Error;

/// A malformed command descriptor. Fatal to the registration call only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error(
        "invalid command id `{id}`: expected 3-64 characters of [A-Za-z0-9_ ] without leading or trailing space"
    )]
    InvalidId { id: String },

    #[error("cool down of `{id}` is {cool_down}s, must be between 0 and {max}s")]
    InvalidCoolDown { id: String, cool_down: u32, max: u32 },

    #[error("`{id}` must extend `{parent}` by exactly one name")]
    InvalidNesting { id: String, parent: String },

    #[error("published command `{id}` has no `src` payload")]
    MissingSource { id: String },

    #[error("command `{id}` is already registered")]
    Duplicate { id: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DataMapError {
    #[error("invalid data map name `{0}`")]
    InvalidName(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("stored value is not valid for this data map")]
    Decode(#[from] serde_json::Error),
}
