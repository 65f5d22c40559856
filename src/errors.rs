use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfileError>;

/// Recoverable data-shape problems reported by the liquidity profile
/// transform. The set is closed: every malformed payload maps onto one of
/// these variants, nothing panics across the transform boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("raw profile payload is absent")]
    NoRawData,

    #[error("current price is missing, unparseable or zero: {value:?}")]
    NoCurrentPrice {
        /// Offending raw value, kept for caller-side display.
        value: Option<String>,
    },

    #[error("payload contains neither samples nor ticks")]
    NoDataPoints,
}
