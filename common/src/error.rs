// Error taxonomy for the aggregator, shared by the engine and the HTTP surface.
use thiserror::Error;

/// Engine-internal error. Variants map 1:1 to the taxonomy the HTTP layer
/// translates into a status code; that translation happens in exactly one
/// place (`api-server::error`), never here.
#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown token: {0}")]
    UnknownToken(String),

    #[error("no liquidity available for this pair")]
    NoLiquidity,

    #[error("request deadline exceeded")]
    Timeout,

    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AggregatorError {
    /// Short, stable label for the `kind` field on the `aggregator_errors_total`
    /// metric; never changes shape with the variant's message contents.
    pub fn kind(&self) -> &'static str {
        match self {
            AggregatorError::InvalidInput(_) => "invalid_input",
            AggregatorError::UnknownToken(_) => "unknown_token",
            AggregatorError::NoLiquidity => "no_liquidity",
            AggregatorError::Timeout => "timeout",
            AggregatorError::Config(_) => "config",
            AggregatorError::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
