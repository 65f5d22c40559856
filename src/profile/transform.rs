//! Bucketing pipeline that turns raw samples into the histogram.
//!
//! Pipeline order matters and is kept as explicit passes: bucketize, capture
//! the real (pre-smoothing) edges, denoise, repair the edges, pad for the
//! chart, then optionally rescale to USD. Bounds and skew are derived from
//! the pre-smoothing mass so the filters can never move them.

use tracing::debug;

use crate::config::ProfileConfig;
use crate::errors::{ProfileError, Result};
use crate::models::{Band, LiquidityBucket, LiquidityProfile, RawLiquiditySample};
use crate::profile::filter::{gaussian_smooth, median_filter};
use crate::profile::input::{RawProfilePayload, normalize_samples};

/// Continuous bucket grid over the relative-price axis.
///
/// `liquidity[k]` belongs to the bucket at `(min_idx + k) * width`; the grid
/// is contiguous by construction, zero-filled where no sample landed.
struct Grid {
    width: f64,
    min_idx: i64,
    liquidity: Vec<f64>,
}

impl Grid {
    /// Materialize every bucket between the expanded sample extremes and
    /// accumulate each sample into its nearest bucket. Zero-liquidity samples
    /// still widen the span. Mass is conserved by this step.
    fn from_samples(samples: &[RawLiquiditySample], width: f64) -> Self {
        let mut min_pct = f64::INFINITY;
        let mut max_pct = f64::NEG_INFINITY;
        for s in samples {
            min_pct = min_pct.min(s.relative_price_pct);
            max_pct = max_pct.max(s.relative_price_pct);
        }
        let min_idx = (min_pct / width).floor() as i64;
        let max_idx = (max_pct / width).ceil() as i64;
        let mut liquidity = vec![0.0; (max_idx - min_idx + 1) as usize];
        for s in samples {
            let key = (s.relative_price_pct / width).round() as i64;
            liquidity[(key - min_idx) as usize] += s.liquidity;
        }
        Self {
            width,
            min_idx,
            liquidity,
        }
    }

    fn pct_at(&self, pos: usize) -> f64 {
        (self.min_idx + pos as i64) as f64 * self.width
    }

    /// Zero-fill outward so the grid covers `[left_idx, right_idx]`.
    /// Never shrinks.
    fn extend_to(&mut self, left_idx: i64, right_idx: i64) {
        if left_idx < self.min_idx {
            let pad = (self.min_idx - left_idx) as usize;
            let mut padded = vec![0.0; pad];
            padded.extend_from_slice(&self.liquidity);
            self.liquidity = padded;
            self.min_idx = left_idx;
        }
        let target_len = (right_idx - self.min_idx + 1).max(0) as usize;
        if target_len > self.liquidity.len() {
            self.liquidity.resize(target_len, 0.0);
        }
    }

    fn first_non_zero_pct(&self) -> Option<f64> {
        self.liquidity
            .iter()
            .position(|&l| l > 0.0)
            .map(|p| self.pct_at(p))
    }

    fn last_non_zero_pct(&self) -> Option<f64> {
        self.liquidity
            .iter()
            .rposition(|&l| l > 0.0)
            .map(|p| self.pct_at(p))
    }

    fn total(&self) -> f64 {
        self.liquidity.iter().sum()
    }

    /// Liquidity-weighted mean of the bucket positions; 0 without liquidity.
    fn weighted_center(&self) -> f64 {
        let total: f64 = self.liquidity.iter().filter(|l| **l > 0.0).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = self
            .liquidity
            .iter()
            .enumerate()
            .filter(|(_, l)| **l > 0.0)
            .map(|(i, l)| self.pct_at(i) * *l)
            .sum();
        weighted / total
    }
}

/// Min/max relative percentage among samples with strictly positive
/// liquidity; `(0, 0)` when there are none.
fn real_edges(samples: &[RawLiquiditySample]) -> (f64, f64) {
    let mut left = f64::INFINITY;
    let mut right = f64::NEG_INFINITY;
    for s in samples {
        if s.liquidity > 0.0 {
            left = left.min(s.relative_price_pct);
            right = right.max(s.relative_price_pct);
        }
    }
    if left.is_finite() {
        (left, right)
    } else {
        (0.0, 0.0)
    }
}

/// Transform one raw indexer payload into a chart-ready liquidity profile.
///
/// `tvl_usd`, when positive, rescales the final bucket liquidity so the total
/// equals the vault's USD TVL. Every failure mode is a recoverable data-shape
/// problem; see [`ProfileError`].
pub fn transform_profile(
    raw: Option<&RawProfilePayload>,
    tvl_usd: Option<f64>,
    cfg: &ProfileConfig,
) -> Result<LiquidityProfile> {
    let raw = raw.ok_or(ProfileError::NoRawData)?;

    let current_price = match &raw.current_price {
        None => return Err(ProfileError::NoCurrentPrice { value: None }),
        Some(v) => match v.as_f64() {
            Some(p) if p > 0.0 => p,
            _ => {
                return Err(ProfileError::NoCurrentPrice {
                    value: Some(v.raw()),
                });
            }
        },
    };

    let input = raw.resolve().ok_or(ProfileError::NoDataPoints)?;
    let samples = normalize_samples(input, current_price);
    if samples.is_empty() {
        return Err(ProfileError::NoDataPoints);
    }

    let width = cfg.bucket_width_pct;
    let mut grid = Grid::from_samples(&samples, width);

    // Real edges come from the samples themselves; bounds and skew are fixed
    // here, before the filters can move mass around.
    let (real_left, real_right) = real_edges(&samples);
    let (left_bound, right_bound) = match (grid.first_non_zero_pct(), grid.last_non_zero_pct()) {
        (Some(first), Some(last)) => (real_left.min(first), real_right.max(last)),
        _ => (real_left, real_right),
    };
    let weighted_center = grid.weighted_center();

    // Denoise: order-statistic pass, then convolution over its output.
    grid.liquidity = median_filter(&grid.liquidity, cfg.median_window);
    grid.liquidity = gaussian_smooth(&grid.liquidity, cfg.gaussian_kernel);

    // Edge repair: the smoothed grid must still reach the real edges.
    let real_left_idx = (real_left / width).floor() as i64;
    let real_right_idx = (real_right / width).ceil() as i64;
    grid.extend_to(real_left_idx, real_right_idx);

    // Visual padding past the real edges; bounds above are already fixed.
    grid.extend_to(
        real_left_idx - cfg.edge_padding_buckets,
        real_right_idx + cfg.edge_padding_buckets,
    );

    // Optional USD rescale: one constant factor, proportions preserved.
    let mut total_liquidity_usd = None;
    if let Some(tvl) = tvl_usd {
        let total = grid.total();
        if tvl > 0.0 && total > 0.0 {
            let factor = tvl / total;
            for l in &mut grid.liquidity {
                *l *= factor;
            }
            total_liquidity_usd = Some(tvl);
        }
    }

    let points: Vec<LiquidityBucket> = grid
        .liquidity
        .iter()
        .enumerate()
        .map(|(i, &liquidity)| {
            let pct = grid.pct_at(i);
            LiquidityBucket {
                pct,
                liquidity,
                band: Band::classify(pct),
            }
        })
        .collect();

    debug!(
        buckets = points.len(),
        left_bound,
        right_bound,
        weighted_center,
        "[PROFILE] transform complete"
    );

    Ok(LiquidityProfile {
        points,
        left_bound,
        right_bound,
        weighted_center,
        current_price,
        total_liquidity_usd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(samples: &[(f64, f64)], price: f64) -> RawProfilePayload {
        let rows: Vec<serde_json::Value> = samples
            .iter()
            .map(|&(pct, liq)| serde_json::json!({"relativePct": pct, "liquidity": liq}))
            .collect();
        serde_json::from_value(serde_json::json!({
            "currentPrice": price,
            "samples": rows,
        }))
        .expect("payload should deserialize")
    }

    fn assert_contiguous(points: &[LiquidityBucket], width: f64) {
        for pair in points.windows(2) {
            assert!(
                (pair[1].pct - pair[0].pct - width).abs() < 1e-9,
                "buckets not evenly spaced: {} -> {}",
                pair[0].pct,
                pair[1].pct
            );
        }
    }

    #[test]
    fn example_scenario_bounds_peak_and_spread() {
        let raw = payload(
            &[
                (-10.0, 0.0),
                (-3.0, 100.0),
                (0.0, 500.0),
                (3.0, 120.0),
                (10.0, 0.0),
            ],
            10.0,
        );
        let profile =
            transform_profile(Some(&raw), None, &ProfileConfig::default()).expect("should transform");

        assert_contiguous(&profile.points, 3.0);
        // Zero-liquidity samples widen the span to at least -12..12.
        let first = profile.points.first().expect("non-empty");
        let last = profile.points.last().expect("non-empty");
        assert!(first.pct <= -12.0);
        assert!(last.pct >= 12.0);

        // Bounds track the real liquidity edges, not the padded grid.
        assert!((profile.left_bound + 3.0).abs() < 1e-9);
        assert!((profile.right_bound - 3.0).abs() < 1e-9);
        assert!((profile.current_price - 10.0).abs() < 1e-9);

        // Skewed toward the heavier right side but well inside the bounds.
        assert!(profile.weighted_center > 0.0);
        assert!(profile.weighted_center < 3.0);

        // Peak stays at the center bucket.
        let peak = profile
            .points
            .iter()
            .max_by(|a, b| a.liquidity.total_cmp(&b.liquidity))
            .expect("non-empty");
        assert_eq!(peak.pct, 0.0);

        // Smoothing spread mass into a bucket that had none.
        let spread = profile
            .points
            .iter()
            .find(|b| b.pct == -6.0)
            .expect("bucket at -6 exists");
        assert!(spread.liquidity > 0.0);
    }

    #[test]
    fn bucketing_conserves_mass_before_smoothing() {
        let samples = [
            RawLiquiditySample {
                relative_price_pct: -7.2,
                liquidity: 10.0,
            },
            RawLiquiditySample {
                relative_price_pct: -1.0,
                liquidity: 40.0,
            },
            RawLiquiditySample {
                relative_price_pct: 0.5,
                liquidity: 25.0,
            },
            RawLiquiditySample {
                relative_price_pct: 8.9,
                liquidity: 5.0,
            },
        ];
        let grid = Grid::from_samples(&samples, 3.0);
        assert!((grid.total() - 80.0).abs() < 1e-9);

        // Contiguous span from the floored minimum to the ceiled maximum.
        assert_eq!(grid.min_idx, -3);
        assert_eq!(grid.liquidity.len(), 7); // -9..=9 in steps of 3
    }

    #[test]
    fn bounds_extend_past_bucket_centers_when_samples_do() {
        // A tick at +10% lands in the bucket at 9, but the real edge is 10;
        // conversely -5 lands in the bucket at -6 which sticks out further.
        let raw: RawProfilePayload = serde_json::from_value(serde_json::json!({
            "currentPrice": 10,
            "ticks": [
                {"price": 11, "liquidity": 100},
                {"price": "9.5", "liquidity": "50"}
            ],
        }))
        .expect("payload should deserialize");
        let profile =
            transform_profile(Some(&raw), None, &ProfileConfig::default()).expect("should transform");

        assert!((profile.left_bound + 6.0).abs() < 1e-9);
        assert!((profile.right_bound - 10.0).abs() < 1e-9);
        assert!(profile.weighted_center >= profile.left_bound);
        assert!(profile.weighted_center <= profile.right_bound);
    }

    #[test]
    fn all_zero_liquidity_falls_back_to_zero_bounds() {
        let raw = payload(&[(-3.0, 0.0), (3.0, 0.0)], 10.0);
        let profile =
            transform_profile(Some(&raw), None, &ProfileConfig::default()).expect("should transform");

        assert_eq!(profile.left_bound, 0.0);
        assert_eq!(profile.right_bound, 0.0);
        assert_eq!(profile.weighted_center, 0.0);
        assert!(profile.points.iter().all(|b| b.liquidity == 0.0));
        assert_contiguous(&profile.points, 3.0);
    }

    #[test]
    fn usd_scaling_is_one_constant_factor() {
        let samples = [(-3.0, 100.0), (0.0, 500.0), (3.0, 120.0)];
        let base = transform_profile(Some(&payload(&samples, 10.0)), None, &ProfileConfig::default())
            .expect("should transform");
        let scaled = transform_profile(
            Some(&payload(&samples, 10.0)),
            Some(1_000_000.0),
            &ProfileConfig::default(),
        )
        .expect("should transform");

        assert_eq!(scaled.total_liquidity_usd, Some(1_000_000.0));
        assert!((scaled.total_liquidity() - 1_000_000.0).abs() < 1e-3);
        assert_eq!(base.points.len(), scaled.points.len());

        // Pairwise ratios survive the rescale.
        for (a, b) in base.points.iter().zip(scaled.points.iter()) {
            for (c, d) in base.points.iter().zip(scaled.points.iter()) {
                assert!(
                    (a.liquidity * d.liquidity - c.liquidity * b.liquidity).abs() < 1e-3,
                    "ratio changed between buckets {} and {}",
                    a.pct,
                    c.pct
                );
            }
        }

        // Bounds and skew are unit-independent.
        assert_eq!(base.left_bound, scaled.left_bound);
        assert_eq!(base.right_bound, scaled.right_bound);
        assert!((base.weighted_center - scaled.weighted_center).abs() < 1e-9);
    }

    #[test]
    fn non_positive_tvl_skips_scaling() {
        let samples = [(0.0, 500.0)];
        let base = transform_profile(Some(&payload(&samples, 10.0)), None, &ProfileConfig::default())
            .expect("should transform");
        let zero = transform_profile(
            Some(&payload(&samples, 10.0)),
            Some(0.0),
            &ProfileConfig::default(),
        )
        .expect("should transform");
        assert_eq!(zero.total_liquidity_usd, None);
        assert_eq!(base, zero);
    }

    #[test]
    fn transform_is_idempotent() {
        let raw = payload(&[(-3.0, 100.0), (0.0, 500.0), (3.0, 120.0)], 10.0);
        let a = transform_profile(Some(&raw), Some(5_000.0), &ProfileConfig::default())
            .expect("should transform");
        let b = transform_profile(Some(&raw), Some(5_000.0), &ProfileConfig::default())
            .expect("should transform");
        assert_eq!(a, b);
    }

    #[test]
    fn missing_payload_reports_no_raw_data() {
        let err = transform_profile(None, None, &ProfileConfig::default())
            .expect_err("should fail");
        assert_eq!(err, ProfileError::NoRawData);
    }

    #[test]
    fn unparseable_price_reports_no_current_price_with_value() {
        let raw: RawProfilePayload = serde_json::from_value(serde_json::json!({
            "currentPrice": "abc",
            "samples": [{"relativePct": 0, "liquidity": 1}],
        }))
        .expect("payload should deserialize");
        let err = transform_profile(Some(&raw), None, &ProfileConfig::default())
            .expect_err("should fail");
        assert_eq!(
            err,
            ProfileError::NoCurrentPrice {
                value: Some("abc".to_string())
            }
        );
    }

    #[test]
    fn zero_or_missing_price_reports_no_current_price() {
        let zero: RawProfilePayload = serde_json::from_value(serde_json::json!({
            "currentPrice": 0,
            "samples": [{"relativePct": 0, "liquidity": 1}],
        }))
        .expect("payload should deserialize");
        let err =
            transform_profile(Some(&zero), None, &ProfileConfig::default()).expect_err("should fail");
        assert!(matches!(err, ProfileError::NoCurrentPrice { value: Some(_) }));

        let missing: RawProfilePayload = serde_json::from_value(serde_json::json!({
            "samples": [{"relativePct": 0, "liquidity": 1}],
        }))
        .expect("payload should deserialize");
        let err = transform_profile(Some(&missing), None, &ProfileConfig::default())
            .expect_err("should fail");
        assert_eq!(err, ProfileError::NoCurrentPrice { value: None });
    }

    #[test]
    fn payload_without_points_reports_no_data_points() {
        let empty: RawProfilePayload =
            serde_json::from_value(serde_json::json!({"currentPrice": 10}))
                .expect("payload should deserialize");
        let err = transform_profile(Some(&empty), None, &ProfileConfig::default())
            .expect_err("should fail");
        assert_eq!(err, ProfileError::NoDataPoints);

        // Rows exist but none carries a usable coordinate.
        let junk: RawProfilePayload = serde_json::from_value(serde_json::json!({
            "currentPrice": 10,
            "samples": [{"liquidity": 5}, {"relativePct": "junk", "liquidity": 5}],
        }))
        .expect("payload should deserialize");
        let err =
            transform_profile(Some(&junk), None, &ProfileConfig::default()).expect_err("should fail");
        assert_eq!(err, ProfileError::NoDataPoints);
    }
}
