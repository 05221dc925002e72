//! Splitter: partition records by price collection method.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{CleanedRecord, PriceMethod};

/// Records partitioned by [`PriceMethod`]
#[derive(Debug, Clone, Default)]
pub struct MethodSplit {
    pub retail: Vec<CleanedRecord>,
    pub wholesale: Vec<CleanedRecord>,
}

impl MethodSplit {
    pub fn get(&self, method: PriceMethod) -> &[CleanedRecord] {
        match method {
            PriceMethod::Retail => &self.retail,
            PriceMethod::Wholesale => &self.wholesale,
        }
    }
}

/// Partition on the price method field only.
pub fn split_by_method(records: &[CleanedRecord]) -> MethodSplit {
    let (retail, wholesale): (Vec<CleanedRecord>, Vec<CleanedRecord>) = records
        .iter()
        .cloned()
        .partition(|r| r.method == PriceMethod::Retail);
    MethodSplit { retail, wholesale }
}

/// How much of the region set the wholesale split covers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WholesaleCoverage {
    /// Distinct regions across both splits
    pub total_regions: usize,
    /// Regions with at least one wholesale record
    pub wholesale_regions: Vec<String>,
    pub share: f64,
    pub min_share: f64,
    pub usable: bool,
}

/// Decide whether the wholesale split covers enough regions to analyze.
pub fn wholesale_coverage(split: &MethodSplit, min_share: f64) -> WholesaleCoverage {
    let all: BTreeSet<&str> = split
        .retail
        .iter()
        .chain(split.wholesale.iter())
        .map(|r| r.region.as_str())
        .collect();
    let wholesale: BTreeSet<&str> = split.wholesale.iter().map(|r| r.region.as_str()).collect();

    let share = if all.is_empty() {
        0.0
    } else {
        wholesale.len() as f64 / all.len() as f64
    };

    WholesaleCoverage {
        total_regions: all.len(),
        wholesale_regions: wholesale.iter().map(|r| r.to_string()).collect(),
        share,
        min_share,
        usable: !wholesale.is_empty() && share >= min_share,
    }
}
