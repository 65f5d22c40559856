//! Price-impact curve builder.
//!
//! Resamples a handful of observed impact figures onto the canonical
//! trade-size grid, locates the inefficiency breaking point and decides
//! whether the chart domain needs widening. Interpolation happens in
//! (ln trade size, impact) space throughout, matching the log x-axis of the
//! chart this feeds.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ImpactConfig;
use crate::models::{ImpactPoint, ImpactSample, TradeDirection};
use crate::utils::parse_loose_f64;

use super::types::{ImpactAnalysis, ImpactInput};

/// Side selector shared by the resampling and crossing helpers.
#[derive(Clone, Copy)]
enum Side {
    Buy,
    Sell,
}

impl Side {
    fn of(self, s: &ImpactSample) -> f64 {
        match self {
            Side::Buy => s.buy_impact,
            Side::Sell => s.sell_impact,
        }
    }
}

/// Threshold crossing located between two adjacent curve points.
struct Crossing {
    /// Interpolated trade size at which impact reaches the threshold.
    size: f64,
    /// Upper sample of the crossing pair, the first canonical size at or
    /// above the threshold; drives the domain-extension decision.
    upper: f64,
}

/// Build the plotting-ready curve for one summary payload.
///
/// Returns `None` when fewer than two distinct trade sizes survive
/// normalization; callers render their "unavailable" state. Everything else
/// degrades gracefully to pass-through or zero-filled values.
pub fn build_curve(
    input: &ImpactInput,
    inefficiency_threshold: f64,
    cfg: &ImpactConfig,
) -> Option<ImpactAnalysis> {
    let samples = normalize(input);
    if samples.len() < 2 {
        return None;
    }
    let canonical_max = *cfg.canonical_trade_sizes.last()?;

    // Resample onto the canonical grid.
    let mut curve: Vec<ImpactSample> = cfg
        .canonical_trade_sizes
        .iter()
        .map(|&size| ImpactSample {
            trade_size: size,
            buy_impact: impact_at(&samples, size, Side::Buy),
            sell_impact: impact_at(&samples, size, Side::Sell),
        })
        .collect();

    // Earliest threshold crossing across both sides.
    let buy_cross = find_crossing(&curve, inefficiency_threshold, Side::Buy);
    let sell_cross = find_crossing(&curve, inefficiency_threshold, Side::Sell);
    let cross = match (buy_cross, sell_cross) {
        (Some(b), Some(s)) => Some(if b.size <= s.size { b } else { s }),
        (b, s) => b.or(s),
    };

    let mut ticks = cfg.canonical_trade_sizes.clone();
    let mut domain_max = canonical_max;

    // A crossing deep in the range leaves most of the chart sub-threshold;
    // widen the domain and extrapolate one endpoint so the curve does not
    // stop mid-air.
    if let Some(c) = &cross {
        if c.upper > cfg.extension_cutoff * canonical_max && curve.len() >= 2 {
            let endpoint = extrapolate(&curve, cfg.extended_domain_max);
            curve.push(endpoint);
            ticks.push(cfg.extended_domain_max);
            domain_max = cfg.extended_domain_max;
        }
    }

    // Insert the crossing as its own point unless it already sits on a tick.
    let mut limit_size = None;
    if let Some(c) = &cross {
        let near_tick = ticks
            .iter()
            .any(|&t| (c.size - t).abs() / t <= cfg.tick_proximity);
        if c.size <= domain_max && !near_tick {
            curve.push(ImpactSample {
                trade_size: c.size,
                buy_impact: impact_at(&samples, c.size, Side::Buy),
                sell_impact: impact_at(&samples, c.size, Side::Sell),
            });
            curve.sort_by(|a, b| a.trade_size.total_cmp(&b.trade_size));
            ticks.push(c.size);
            ticks.sort_by(f64::total_cmp);
            limit_size = Some(c.size);
        }
    }

    let points: Vec<ImpactPoint> = curve
        .iter()
        .map(|s| ImpactPoint {
            trade_size: s.trade_size,
            buy_impact: s.buy_impact,
            sell_impact: s.sell_impact,
            is_limit: limit_size == Some(s.trade_size),
        })
        .collect();

    // Whole-percent ceiling that clears the curve maximum with headroom of
    // at least one point (or 20% of the rounded-up maximum) and never drops
    // below the threshold itself.
    let max_impact = points
        .iter()
        .map(|p| p.buy_impact.max(p.sell_impact))
        .fold(0.0, f64::max);
    let rounded = max_impact.ceil();
    let headroom = (rounded * 0.2).ceil().max(1.0);
    let y_max = (rounded + headroom).max(inefficiency_threshold);

    let breaking_point = cross.map(|c| c.size);
    debug!(
        points = points.len(),
        breaking_point, domain_max, y_max, "[IMPACT] curve built"
    );

    Some(ImpactAnalysis {
        curve: points,
        y_max,
        breaking_point,
        x_axis_ticks: ticks,
        domain_max,
    })
}

/// Collapse either input shape into one sample per distinct trade size,
/// ascending. Keyed by the raw bit pattern: for positive finite floats bit
/// order matches numeric order. Sell impact is stored as a magnitude; NaN
/// and non-positive sizes are unusable on a log axis and are skipped.
fn normalize(input: &ImpactInput) -> Vec<ImpactSample> {
    let mut by_size: BTreeMap<u64, ImpactSample> = BTreeMap::new();
    let empty_at = |size: f64| ImpactSample {
        trade_size: size,
        buy_impact: 0.0,
        sell_impact: 0.0,
    };
    match input {
        ImpactInput::Grouped(rows) => {
            for row in rows {
                let Some(size) = parse_loose_f64(row.trade_size.as_ref()).filter(|s| *s > 0.0)
                else {
                    continue;
                };
                let sample = by_size.entry(size.to_bits()).or_insert_with(|| empty_at(size));
                if let Some(buy) = parse_loose_f64(row.buy_impact.as_ref()) {
                    sample.buy_impact = buy;
                }
                if let Some(sell) = parse_loose_f64(row.sell_impact.as_ref()) {
                    sample.sell_impact = sell.abs();
                }
            }
        }
        ImpactInput::Tagged(rows) => {
            for row in rows {
                let Some(size) = parse_loose_f64(row.trade_size.as_ref()).filter(|s| *s > 0.0)
                else {
                    continue;
                };
                let impact = parse_loose_f64(row.impact.as_ref()).unwrap_or(0.0);
                let sample = by_size.entry(size.to_bits()).or_insert_with(|| empty_at(size));
                match row.direction {
                    TradeDirection::Buy => sample.buy_impact = impact,
                    TradeDirection::Sell => sample.sell_impact = impact.abs(),
                }
            }
        }
    }
    by_size.into_values().collect()
}

/// Impact at an arbitrary size, linearly interpolated in (ln trade size,
/// impact) space; sizes outside the sampled range take the nearest sample's
/// value rather than extrapolating.
fn impact_at(samples: &[ImpactSample], size: f64, side: Side) -> f64 {
    let first = &samples[0];
    if size <= first.trade_size {
        return side.of(first);
    }
    let last = &samples[samples.len() - 1];
    if size >= last.trade_size {
        return side.of(last);
    }
    for pair in samples.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        if size >= lo.trade_size && size <= hi.trade_size {
            let span = hi.trade_size.ln() - lo.trade_size.ln();
            if span <= 0.0 {
                return side.of(lo);
            }
            let t = (size.ln() - lo.trade_size.ln()) / span;
            return side.of(lo) + t * (side.of(hi) - side.of(lo));
        }
    }
    side.of(last)
}

/// First adjacent pair crossing the threshold from below. The crossing size
/// is log-linear interpolated as trade size in function of impact.
fn find_crossing(curve: &[ImpactSample], threshold: f64, side: Side) -> Option<Crossing> {
    for pair in curve.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        let (a, b) = (side.of(lo), side.of(hi));
        if a < threshold && b >= threshold {
            // b > a is guaranteed here, the ratio is well defined.
            let t = (threshold - a) / (b - a);
            let size =
                (lo.trade_size.ln() + t * (hi.trade_size.ln() - lo.trade_size.ln())).exp();
            return Some(Crossing {
                size,
                upper: hi.trade_size,
            });
        }
    }
    None
}

/// Extend the curve to `size` along the slope of its last two points in
/// (ln trade size, impact) space, clamped non-negative.
fn extrapolate(curve: &[ImpactSample], size: f64) -> ImpactSample {
    let hi = &curve[curve.len() - 1];
    let lo = &curve[curve.len() - 2];
    let span = hi.trade_size.ln() - lo.trade_size.ln();
    let project = |a: f64, b: f64| -> f64 {
        if span <= 0.0 {
            return b;
        }
        let slope = (b - a) / span;
        (b + slope * (size.ln() - hi.trade_size.ln())).max(0.0)
    };
    ImpactSample {
        trade_size: size,
        buy_impact: project(lo.buy_impact, hi.buy_impact),
        sell_impact: project(lo.sell_impact, hi.sell_impact),
    }
}
