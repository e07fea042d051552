use rust_decimal::Decimal;
use tracing::debug;

use crate::error::VcFundError;
use crate::performance::valuation::latest_valuation;
use crate::portfolio::Investment;
use crate::store::PortfolioRepository;
use crate::types::Money;
use crate::VcFundResult;

/// A holding's value together with the company valuation it was marked from.
///
/// `valuation` is `None` whenever the company was not consulted (recorded exit
/// proceeds, or the investment is no longer Active) or had no valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Mark {
    pub value: Money,
    pub valuation: Option<Money>,
}

/// Current attributable value of one investment.
///
/// Precedence:
/// 1. a recorded `exit_amount` is returned as-is, whatever the status;
/// 2. an Exited or Write-off investment without one is worth zero;
/// 3. an Active holding is worth the company's latest valuation times the
///    equity stake (percentage / 100), or zero if either is missing.
///
/// Only a dangling company reference on an Active holding is an error.
pub fn current_value<R: PortfolioRepository + ?Sized>(
    repo: &R,
    investment: &Investment,
) -> VcFundResult<Money> {
    Ok(mark(repo, investment)?.value)
}

/// Same precedence as [`current_value`], also returning the valuation used.
pub(crate) fn mark<R: PortfolioRepository + ?Sized>(
    repo: &R,
    investment: &Investment,
) -> VcFundResult<Mark> {
    if let Some(exit_amount) = investment.exit_amount {
        return Ok(Mark {
            value: exit_amount,
            valuation: None,
        });
    }
    if !investment.is_active() {
        return Ok(Mark {
            value: Decimal::ZERO,
            valuation: None,
        });
    }

    let valuation = latest_valuation(repo, investment.company_id)?;
    let value = match (valuation, investment.equity_fraction()) {
        (Some(valuation), Some(fraction)) => valuation
            .checked_mul(fraction)
            .ok_or_else(|| VcFundError::overflow("investment mark-to-market"))?,
        _ => Decimal::ZERO,
    };

    debug!(
        investment_id = investment.id,
        company_id = investment.company_id,
        valuation = ?valuation,
        %value,
        "valued active investment"
    );
    Ok(Mark { value, valuation })
}
