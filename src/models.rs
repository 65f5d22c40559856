//! Shared data structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// One normalized (relative price %, liquidity) observation. Ephemeral:
/// built fresh from the raw payload on every transform call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLiquiditySample {
    pub relative_price_pct: f64,
    pub liquidity: f64,
}

/// Distance-from-price band of a histogram bucket, used by the chart layer
/// for bar coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Efficient,
    Moderate,
    Sparse,
}

impl Band {
    /// Fixed percentage thresholds: within ±1% is efficient, within ±5% is
    /// moderate, everything further out is sparse.
    pub fn classify(pct: f64) -> Self {
        if pct.abs() <= 1.0 {
            Band::Efficient
        } else if pct.abs() <= 5.0 {
            Band::Moderate
        } else {
            Band::Sparse
        }
    }
}

/// One cell of the liquidity histogram, snapped to the fixed bucket grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityBucket {
    pub pct: f64,
    pub liquidity: f64,
    pub band: Band,
}

/// Chart-ready liquidity histogram with derived bounds and skew.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityProfile {
    /// Buckets sorted ascending by `pct`, evenly spaced by the bucket width.
    pub points: Vec<LiquidityBucket>,
    /// True left edge of the liquidity range, independent of padding buckets.
    pub left_bound: f64,
    /// True right edge of the liquidity range, independent of padding buckets.
    pub right_bound: f64,
    /// Liquidity-weighted mean of `pct`; 0 when there is no liquidity.
    pub weighted_center: f64,
    pub current_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_liquidity_usd: Option<f64>,
}

impl LiquidityProfile {
    /// Sum of bucket liquidity over all points (padding buckets are zero).
    pub fn total_liquidity(&self) -> f64 {
        self.points.iter().map(|b| b.liquidity).sum()
    }
}

/// Side of the book a flattened impact row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// Buy/sell price impact observed (or interpolated) at one trade size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactSample {
    pub trade_size: f64,
    pub buy_impact: f64,
    /// Stored as a magnitude; the indexer reports sell impact signed.
    pub sell_impact: f64,
}

/// One plotted point of the price-impact curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactPoint {
    pub trade_size: f64,
    pub buy_impact: f64,
    pub sell_impact: f64,
    /// Marks the synthetic threshold-crossing point; at most one per curve.
    pub is_limit: bool,
}
