use tracing::debug;

use crate::error::VcFundError;
use crate::store::PortfolioRepository;
use crate::types::{CompanyId, Money};
use crate::VcFundResult;

/// Most recent known valuation of a company.
///
/// Reads the snapshot with the greatest date and returns its valuation.
/// `Ok(None)` when the company has no snapshots or the latest one was recorded
/// without a valuation; an unknown company is `NotFound`.
pub fn latest_valuation<R: PortfolioRepository + ?Sized>(
    repo: &R,
    company_id: CompanyId,
) -> VcFundResult<Option<Money>> {
    if repo.find_company(company_id)?.is_none() {
        return Err(VcFundError::not_found("Company", company_id));
    }

    let valuation = repo
        .find_latest_snapshot(company_id)?
        .and_then(|snapshot| {
            debug!(
                company_id,
                snapshot_date = %snapshot.snapshot_date,
                "resolved latest snapshot"
            );
            snapshot.valuation
        });
    Ok(valuation)
}
