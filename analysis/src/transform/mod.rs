//! Transformation stages.
//!
//! - Clean: raw rows to typed records, drops reported
//! - Scope: region exclusion, time window, coverage check
//! - Split: retail / wholesale partition
//! - Aggregate: baskets and inflation per entity
//! - Rank: ordering to surface extremes
//! - Pipeline: everything above, in order

pub mod aggregate;
pub mod clean;
pub mod pipeline;
pub mod rank;
pub mod scope;
pub mod split;

pub use aggregate::{aggregate, average_by_entity, inflation_table, price_baskets, InflationTable, InflationWindow};
pub use clean::{check_unit_semantics, load_and_clean, CleanOutcome, UnitViolation};
pub use pipeline::*;
pub use rank::{bottom_n, rank, rankings, top_n, RankField, Rankable, Rankings};
pub use scope::{restrict_scope, ScopeOutcome};
pub use split::{split_by_method, wholesale_coverage, MethodSplit, WholesaleCoverage};
