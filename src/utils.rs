//! Miscellaneous helper utilities.

use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// A numeric field as the indexer actually sends it: a JSON number, a
/// string-encoded number, or occasionally something else entirely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseNum {
    Num(f64),
    Str(String),
    Other(serde_json::Value),
}

impl LooseNum {
    /// Coerce to a finite `f64`; `None` when the field is not a usable number.
    pub fn as_f64(&self) -> Option<f64> {
        let parsed = match self {
            LooseNum::Num(n) => Some(*n),
            LooseNum::Str(s) => s.trim().parse::<f64>().ok(),
            LooseNum::Other(_) => None,
        };
        parsed.filter(|v| v.is_finite())
    }

    /// Raw textual form, kept for error diagnostics.
    pub fn raw(&self) -> String {
        match self {
            LooseNum::Num(n) => n.to_string(),
            LooseNum::Str(s) => s.clone(),
            LooseNum::Other(v) => v.to_string(),
        }
    }
}

/// Coerce an optional loose field to a finite `f64`.
pub fn parse_loose_f64(raw: Option<&LooseNum>) -> Option<f64> {
    raw.and_then(LooseNum::as_f64)
}
