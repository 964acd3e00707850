//! Concrete `VenueAdapter` implementations, one per protocol (spec.md §4.5, §4.6).

pub mod v2;
pub mod v3;
