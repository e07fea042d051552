//! Read contracts the performance engine consumes from the persistence layer.

use crate::portfolio::{Company, FinancialSnapshot, Fund, Investment};
use crate::types::{CompanyId, FundId, InvestmentId};
use crate::VcFundResult;

/// Read-only access to persisted portfolio entities.
///
/// Each call is an independent query. Implementations are not required to
/// give a consistent view across calls, and the engine never relies on one.
pub trait PortfolioRepository: Send + Sync {
    /// Look up a fund by id.
    fn find_fund(&self, id: FundId) -> VcFundResult<Option<Fund>>;

    /// All funds, ordered by id.
    fn list_funds(&self) -> VcFundResult<Vec<Fund>>;

    /// Look up a company by id.
    fn find_company(&self, id: CompanyId) -> VcFundResult<Option<Company>>;

    /// Look up an investment by id.
    fn find_investment(&self, id: InvestmentId) -> VcFundResult<Option<Investment>>;

    /// Every investment belonging to a fund. Order carries no meaning.
    fn find_investments_by_fund(&self, fund_id: FundId) -> VcFundResult<Vec<Investment>>;

    /// The snapshot with the greatest date for a company, if any.
    fn find_latest_snapshot(&self, company_id: CompanyId)
        -> VcFundResult<Option<FinancialSnapshot>>;
}
