// Ambient stack shared by `aggregator-core` and `api-server`: error
// taxonomy, startup configuration, and tracing bootstrap.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, V2VenueConfig, V3VenueConfig};
pub use error::{AggregatorError, Result};
