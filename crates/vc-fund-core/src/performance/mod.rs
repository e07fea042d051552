pub mod investment;
pub mod metrics;
pub mod valuation;

pub use investment::current_value;
pub use metrics::{FundMetrics, FundMetricsCalculator, FundPerformance, InvestmentValuation};
pub use valuation::latest_valuation;
