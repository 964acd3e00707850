//! Chain-agnostic aggregation engine: token/venue modeling, pluggable
//! venue adapters, fan-out aggregation and route-building math. No HTTP or
//! process bootstrap lives here; that belongs to `api-server` (spec.md
//! §1 "the engine does not own HTTP").

pub mod adapter;
pub mod adapters;
pub mod aggregator;
pub mod chain_reader;
pub mod numerics;
pub mod route;
pub mod token;
pub mod venue;

pub use adapter::VenueAdapter;
pub use aggregator::{Aggregator, AggregatedQuote, Savings};
pub use chain_reader::ChainReader;
pub use route::{ApprovalDescriptor, RouteArtifact};
pub use token::{Token, TokenRegistry};
pub use venue::{Protocol, VenueConfig, VenueQuote, FEE_TIERS};
