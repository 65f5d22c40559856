use serde::{Deserialize, Serialize};

use crate::models::{ImpactPoint, TradeDirection};
use crate::utils::LooseNum;

/// Already-grouped indexer row: buy and sell impact at one trade size.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupedImpactRow {
    pub trade_size: Option<LooseNum>,
    pub buy_impact: Option<LooseNum>,
    pub sell_impact: Option<LooseNum>,
}

/// Flattened indexer row: a single impact figure tagged by direction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedImpactRow {
    pub trade_size: Option<LooseNum>,
    pub impact: Option<LooseNum>,
    pub direction: TradeDirection,
}

/// The two input shapes the summary endpoint can produce.
#[derive(Debug, Clone)]
pub enum ImpactInput {
    Grouped(Vec<GroupedImpactRow>),
    Tagged(Vec<TaggedImpactRow>),
}

/// Plotting-ready price-impact curve plus derived domain and labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysis {
    /// Points at the canonical trade sizes, plus up to one extrapolated
    /// endpoint and up to one `is_limit` crossing point.
    pub curve: Vec<ImpactPoint>,
    /// Chart y-axis ceiling with whole-percent headroom over the curve.
    pub y_max: f64,
    /// Trade size at which impact first crosses the inefficiency threshold.
    pub breaking_point: Option<f64>,
    pub x_axis_ticks: Vec<f64>,
    /// Visual domain upper bound; the extended ceiling when the crossing
    /// sits deep in the canonical range.
    pub domain_max: f64,
}

impl ImpactAnalysis {
    /// Largest impact plotted on either side of the curve.
    pub fn max_impact(&self) -> f64 {
        self.curve
            .iter()
            .map(|p| p.buy_impact.max(p.sell_impact))
            .fold(0.0, f64::max)
    }
}
