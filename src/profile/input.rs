use serde::Deserialize;
use tracing::warn;

use crate::models::RawLiquiditySample;
use crate::utils::{LooseNum, parse_loose_f64};

/// Raw profile payload as the indexer's details endpoint returns it.
///
/// Numeric fields arrive both as JSON numbers and as strings, so every one of
/// them goes through [`LooseNum`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProfilePayload {
    pub current_price: Option<LooseNum>,
    pub samples: Option<Vec<RawSampleRow>>,
    pub ticks: Option<Vec<RawTickRow>>,
}

/// One pre-computed (relative price %, liquidity) row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSampleRow {
    pub relative_pct: Option<LooseNum>,
    pub liquidity: Option<LooseNum>,
}

/// One (tick price, liquidity) row; the relative percentage is derived from
/// the current price at normalization time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTickRow {
    pub price: Option<LooseNum>,
    pub liquidity: Option<LooseNum>,
}

/// The two payload variants, resolved once at the transform entry by an
/// explicit discriminant check instead of per-field probing downstream.
#[derive(Debug, Clone, Copy)]
pub enum ProfileInput<'a> {
    Flat(&'a [RawSampleRow]),
    TickList(&'a [RawTickRow]),
}

impl RawProfilePayload {
    /// Pick the input variant: a non-empty `samples` array wins, otherwise a
    /// non-empty `ticks` array; `None` when neither is usable.
    pub fn resolve(&self) -> Option<ProfileInput<'_>> {
        match (&self.samples, &self.ticks) {
            (Some(samples), _) if !samples.is_empty() => Some(ProfileInput::Flat(samples)),
            (_, Some(ticks)) if !ticks.is_empty() => Some(ProfileInput::TickList(ticks)),
            _ => None,
        }
    }
}

/// Normalize either payload variant into plain samples.
///
/// Rows without a parseable x-coordinate are dropped with a warning;
/// unparseable liquidity degrades to 0 so the row still widens the grid.
pub fn normalize_samples(input: ProfileInput<'_>, current_price: f64) -> Vec<RawLiquiditySample> {
    match input {
        ProfileInput::Flat(rows) => rows
            .iter()
            .filter_map(|row| {
                let Some(pct) = parse_loose_f64(row.relative_pct.as_ref()) else {
                    warn!(row = ?row, "[PROFILE] sample without parseable relativePct dropped");
                    return None;
                };
                Some(RawLiquiditySample {
                    relative_price_pct: pct,
                    liquidity: liquidity_or_zero(row.liquidity.as_ref()),
                })
            })
            .collect(),
        ProfileInput::TickList(rows) => rows
            .iter()
            .filter_map(|row| {
                let Some(price) = parse_loose_f64(row.price.as_ref()) else {
                    warn!(row = ?row, "[PROFILE] tick without parseable price dropped");
                    return None;
                };
                Some(RawLiquiditySample {
                    relative_price_pct: (price - current_price) / current_price * 100.0,
                    liquidity: liquidity_or_zero(row.liquidity.as_ref()),
                })
            })
            .collect(),
    }
}

fn liquidity_or_zero(raw: Option<&LooseNum>) -> f64 {
    parse_loose_f64(raw).unwrap_or(0.0)
}
