//! Input and output documents for the two solvers.
//!
//! JSON maps deserialize into `BTreeMap` so every derived listing iterates
//! in one well-defined order regardless of how the document was written.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn one() -> f64 {
    1.0
}

/// A transformation consuming and producing items in fixed ratios at a
/// machine.
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub machine: String,
    pub base_crafts_per_min: f64,
    #[serde(default)]
    pub inputs: BTreeMap<String, f64>,
    #[serde(default)]
    pub outputs: BTreeMap<String, f64>,
    #[serde(default = "one")]
    pub speed_multiplier: f64,
    #[serde(default = "one")]
    pub productivity_multiplier: f64,
}

impl Recipe {
    /// Crafts per minute at full utilization. Zero disables the recipe.
    pub fn effective_rate(&self) -> f64 {
        self.base_crafts_per_min * self.speed_multiplier
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    pub item: String,
    pub rate_per_min: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactoryInput {
    pub recipes: Vec<Recipe>,
    /// Cap on concurrent machines per machine type; absent types are
    /// uncapped.
    #[serde(default)]
    pub machines: BTreeMap<String, f64>,
    /// Rate-per-minute cap per raw item. An item is raw exactly when it
    /// appears here.
    #[serde(default)]
    pub raw_supply: BTreeMap<String, f64>,
    pub target: Target,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FactoryOutput {
    Ok {
        crafts_per_min: BTreeMap<String, f64>,
        machines_used: BTreeMap<String, f64>,
        production: BTreeMap<String, f64>,
    },
    Infeasible {
        reason: String,
        max_rate: f64,
        bottlenecks: Vec<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeltNode {
    pub id: String,
    /// Throughput cap; absent or null means unbounded.
    #[serde(default)]
    pub cap: Option<f64>,
    /// Positive = source, negative = sink, zero = transshipment.
    #[serde(default)]
    pub supply: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeltEdge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub lo: f64,
    pub hi: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeltsInput {
    pub nodes: Vec<BeltNode>,
    pub edges: Vec<BeltEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeFlow {
    pub from: String,
    pub to: String,
    pub flow: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeEndpoints {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BeltsOutput {
    Ok {
        flows: Vec<EdgeFlow>,
    },
    Infeasible {
        cut_reachable: Vec<String>,
        tight_nodes: Vec<String>,
        tight_edges: Vec<EdgeEndpoints>,
        deficit: f64,
    },
}
