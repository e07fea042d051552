use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages on a 0-100 scale (10.5 = 10.5%). Never as fractions.
pub type Percentage = Decimal;

/// Multiples of paid-in capital (e.g., 2.5x TVPI)
pub type Multiple = Decimal;

pub type FundId = i64;
pub type CompanyId = i64;
pub type InvestmentId = i64;
pub type SnapshotId = i64;

/// Fractional digits kept on every reported ratio.
pub const RATIO_DECIMAL_PLACES: u32 = 4;

/// Round a ratio to four places with banker's rounding.
///
/// The result is rescaled so whole multiples keep their trailing zeros
/// (`2` is reported as `2.0000`).
pub fn round_ratio(value: Decimal) -> Multiple {
    let mut rounded =
        value.round_dp_with_strategy(RATIO_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(RATIO_DECIMAL_PLACES);
    rounded
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
