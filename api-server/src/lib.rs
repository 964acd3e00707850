//! HTTP surface for the DEX quote aggregator: axum routing, request
//! validation/DTO shaping, and the one place engine errors become HTTP
//! status codes (spec.md §6, §7). The aggregation engine itself lives in
//! `aggregator-core`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;
