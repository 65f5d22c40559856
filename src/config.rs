//! Transform settings and defaults.
//!
//! All tuning knobs are plain structs passed at call time; there is no
//! environment or file based configuration in this crate.

/// Tuning knobs for the liquidity profile transform.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Width of one histogram bucket, in percentage points.
    pub bucket_width_pct: f64,
    /// Sliding window of the order-statistic (median) filter; odd.
    pub median_window: usize,
    /// Discrete Gaussian kernel size; sigma is half the kernel.
    pub gaussian_kernel: usize,
    /// Zero-liquidity buckets materialized beyond each real edge so charts
    /// show liquidity tapering off instead of stopping abruptly.
    pub edge_padding_buckets: i64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            bucket_width_pct: 3.0,
            median_window: 5,
            gaussian_kernel: 5,
            edge_padding_buckets: 5,
        }
    }
}

/// Tuning knobs for the price-impact curve builder.
#[derive(Debug, Clone)]
pub struct ImpactConfig {
    /// Fixed reference trade sizes the curve is always evaluated at,
    /// ascending and roughly log-spaced.
    pub canonical_trade_sizes: Vec<f64>,
    /// Widened visual ceiling, the next step of the same log spacing.
    pub extended_domain_max: f64,
    /// Fraction of the canonical maximum past which the domain is widened.
    pub extension_cutoff: f64,
    /// Relative distance under which a crossing counts as sitting on an
    /// existing tick and is not inserted separately.
    pub tick_proximity: f64,
    /// Default inefficiency threshold, in percent.
    pub default_threshold_pct: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            canonical_trade_sizes: vec![
                1_000.0, 2_500.0, 6_300.0, 15_800.0, 39_800.0, 100_000.0,
            ],
            extended_domain_max: 251_000.0,
            extension_cutoff: 0.6,
            tick_proximity: 0.08,
            default_threshold_pct: 2.0,
        }
    }
}
