//! Error taxonomy for the deck. Nothing here is fatal to the process: every variant
//! degrades to a visible message (gateway payload, widget error text) or a silent skip.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeckError>;

#[derive(Debug, Error)]
pub enum DeckError {
    /// Missing or unusable configuration (e.g. the completion API credential).
    #[error("{0}")]
    Configuration(String),

    /// The completion API call failed or returned an error status.
    #[error("{0}")]
    Upstream(String),

    /// Persisted data could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The illustrative export image could not be loaded.
    #[error("asset load failed: {0}")]
    AssetLoad(String),

    /// Client-side transport failure or non-success status from the gateway.
    #[error("{0}")]
    Network(String),

    /// Transcript store (sled) failure.
    #[error("transcript store: {0}")]
    Storage(#[from] sled::Error),

    /// Document rendering failure.
    #[error("render failed: {0}")]
    Render(String),

    /// A control was triggered while its operation is already in flight.
    #[error("busy: {0} already in progress")]
    Busy(&'static str),

    /// Option id outside the offered catalog.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("config: {0}")]
    Config(#[from] config::ConfigError),
}
