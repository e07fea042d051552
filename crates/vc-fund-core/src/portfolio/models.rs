use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VcFundError;
use crate::types::{CompanyId, FundId, InvestmentId, Money, Percentage, SnapshotId};

// ---------------------------------------------------------------------------
// Fund
// ---------------------------------------------------------------------------

/// A venture capital fund. Paid-in capital is deliberately absent: it is
/// always derived from the fund's investments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    pub id: FundId,
    pub name: String,
    /// Target fund size
    pub target_size: Money,
    /// LP commitments raised so far
    #[serde(default)]
    pub committed_capital: Money,
    pub vintage_year: i32,
}

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

/// A portfolio company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    /// Exchange ticker, public companies only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker_symbol: Option<String>,
}

// ---------------------------------------------------------------------------
// Investment
// ---------------------------------------------------------------------------

/// Lifecycle status of an investment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentStatus {
    #[default]
    Active,
    Exited,
    #[serde(rename = "Write-off", alias = "WriteOff")]
    WriteOff,
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestmentStatus::Active => write!(f, "Active"),
            InvestmentStatus::Exited => write!(f, "Exited"),
            InvestmentStatus::WriteOff => write!(f, "Write-off"),
        }
    }
}

impl FromStr for InvestmentStatus {
    type Err = VcFundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(InvestmentStatus::Active),
            "exited" => Ok(InvestmentStatus::Exited),
            "write-off" | "writeoff" | "write_off" => Ok(InvestmentStatus::WriteOff),
            other => Err(VcFundError::InvalidInput {
                field: "status".into(),
                reason: format!("unknown investment status '{other}'"),
            }),
        }
    }
}

/// A single fund's stake in a portfolio company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: InvestmentId,
    pub fund_id: FundId,
    pub company_id: CompanyId,
    pub investment_date: NaiveDate,
    /// Capital deployed into the company
    pub amount_invested: Money,
    /// Equity acquired on a 0-100 scale (10.5 = 10.5%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity_percentage: Option<Percentage>,
    /// Post-money valuation of the company at entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_at_investment: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_date: Option<NaiveDate>,
    /// Realised proceeds returned to the fund
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_amount: Option<Money>,
    #[serde(default)]
    pub status: InvestmentStatus,
}

impl Investment {
    pub fn is_active(&self) -> bool {
        self.status == InvestmentStatus::Active
    }

    /// Equity stake as a fraction (10 -> 0.10).
    pub fn equity_fraction(&self) -> Option<Decimal> {
        self.equity_percentage
            .map(|pct| pct / Decimal::ONE_HUNDRED)
    }
}

// ---------------------------------------------------------------------------
// Financial snapshot
// ---------------------------------------------------------------------------

/// Point-in-time financials for a company. At most one per (company, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub id: SnapshotId,
    pub company_id: CompanyId,
    pub snapshot_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_income: Option<Money>,
    /// Total company value as of `snapshot_date` (market cap for public companies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_price: Option<Decimal>,
}
