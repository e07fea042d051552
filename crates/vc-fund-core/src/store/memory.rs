use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::error::VcFundError;
use crate::portfolio::{Company, FinancialSnapshot, Fund, Investment, InvestmentStatus};
use crate::store::repository::PortfolioRepository;
use crate::types::{CompanyId, FundId, InvestmentId, Money, Percentage, SnapshotId};
use crate::VcFundResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Fields for creating a fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFund {
    pub name: String,
    pub target_size: Money,
    #[serde(default)]
    pub committed_capital: Money,
    pub vintage_year: i32,
}

/// Fields for creating a company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub ticker_symbol: Option<String>,
}

/// Fields for recording a new investment. New investments start Active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvestment {
    pub fund_id: FundId,
    pub company_id: CompanyId,
    pub investment_date: NaiveDate,
    pub amount_invested: Money,
    #[serde(default)]
    pub equity_percentage: Option<Percentage>,
    #[serde(default)]
    pub valuation_at_investment: Option<Money>,
}

/// Fields for a company's financials on a given date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub company_id: CompanyId,
    pub snapshot_date: NaiveDate,
    #[serde(default)]
    pub revenue: Option<Money>,
    #[serde(default)]
    pub net_income: Option<Money>,
    #[serde(default)]
    pub valuation: Option<Money>,
    #[serde(default)]
    pub stock_price: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) funds: BTreeMap<FundId, Fund>,
    pub(crate) companies: BTreeMap<CompanyId, Company>,
    pub(crate) investments: BTreeMap<InvestmentId, Investment>,
    pub(crate) snapshots: BTreeMap<SnapshotId, FinancialSnapshot>,
    next_fund_id: FundId,
    next_company_id: CompanyId,
    next_investment_id: InvestmentId,
    next_snapshot_id: SnapshotId,
}

impl StoreState {
    /// Reset id counters past the highest id already present.
    pub(crate) fn sync_counters(&mut self) {
        self.next_fund_id = self.funds.keys().next_back().copied().unwrap_or(0);
        self.next_company_id = self.companies.keys().next_back().copied().unwrap_or(0);
        self.next_investment_id = self.investments.keys().next_back().copied().unwrap_or(0);
        self.next_snapshot_id = self.snapshots.keys().next_back().copied().unwrap_or(0);
    }

    fn snapshot_on(&self, company_id: CompanyId, date: NaiveDate) -> Option<SnapshotId> {
        self.snapshots
            .values()
            .find(|s| s.company_id == company_id && s.snapshot_date == date)
            .map(|s| s.id)
    }
}

/// Thread-safe in-memory portfolio store.
///
/// Plays the role of the CRUD layer: it owns every entity, validates writes,
/// and serves the read contracts in [`PortfolioRepository`].
#[derive(Debug, Default)]
pub struct InMemoryPortfolioStore {
    state: RwLock<StoreState>,
}

impl InMemoryPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(mut state: StoreState) -> Self {
        state.sync_counters();
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> VcFundResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| VcFundError::Repository("store lock poisoned".into()))
    }

    fn write(&self) -> VcFundResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| VcFundError::Repository("store lock poisoned".into()))
    }

    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&StoreState) -> T) -> VcFundResult<T> {
        let state = self.read()?;
        Ok(f(&state))
    }

    pub fn create_fund(&self, new_fund: NewFund) -> VcFundResult<Fund> {
        if new_fund.name.trim().is_empty() {
            return Err(VcFundError::InvalidInput {
                field: "name".into(),
                reason: "Fund name must not be empty".into(),
            });
        }
        if new_fund.target_size < Decimal::ZERO {
            return Err(VcFundError::InvalidInput {
                field: "target_size".into(),
                reason: "Target size must be non-negative".into(),
            });
        }

        let mut state = self.write()?;
        if state.funds.values().any(|f| f.name == new_fund.name) {
            return Err(VcFundError::Conflict(format!(
                "Fund with name '{}' already exists",
                new_fund.name
            )));
        }
        state.next_fund_id += 1;
        let fund = Fund {
            id: state.next_fund_id,
            name: new_fund.name,
            target_size: new_fund.target_size,
            committed_capital: new_fund.committed_capital,
            vintage_year: new_fund.vintage_year,
        };
        debug!(fund_id = fund.id, name = %fund.name, "created fund");
        state.funds.insert(fund.id, fund.clone());
        Ok(fund)
    }

    pub fn create_company(&self, new_company: NewCompany) -> VcFundResult<Company> {
        if new_company.name.trim().is_empty() {
            return Err(VcFundError::InvalidInput {
                field: "name".into(),
                reason: "Company name must not be empty".into(),
            });
        }

        let mut state = self.write()?;
        if state.companies.values().any(|c| c.name == new_company.name) {
            return Err(VcFundError::Conflict(format!(
                "Company with name '{}' already exists",
                new_company.name
            )));
        }
        state.next_company_id += 1;
        let company = Company {
            id: state.next_company_id,
            name: new_company.name,
            industry: new_company.industry,
            website: new_company.website,
            is_public: new_company.is_public,
            ticker_symbol: new_company.ticker_symbol,
        };
        debug!(company_id = company.id, name = %company.name, "created company");
        state.companies.insert(company.id, company.clone());
        Ok(company)
    }

    pub fn create_investment(&self, new_investment: NewInvestment) -> VcFundResult<Investment> {
        validate_amounts(
            new_investment.amount_invested,
            new_investment.equity_percentage,
            None,
        )?;

        let mut state = self.write()?;
        ensure_references(&state, new_investment.fund_id, new_investment.company_id)?;
        state.next_investment_id += 1;
        let investment = Investment {
            id: state.next_investment_id,
            fund_id: new_investment.fund_id,
            company_id: new_investment.company_id,
            investment_date: new_investment.investment_date,
            amount_invested: new_investment.amount_invested,
            equity_percentage: new_investment.equity_percentage,
            valuation_at_investment: new_investment.valuation_at_investment,
            exit_date: None,
            exit_amount: None,
            status: InvestmentStatus::Active,
        };
        debug!(
            investment_id = investment.id,
            fund_id = investment.fund_id,
            company_id = investment.company_id,
            "created investment"
        );
        state.investments.insert(investment.id, investment.clone());
        Ok(investment)
    }

    /// Replace an existing investment wholesale.
    pub fn update_investment(&self, investment: Investment) -> VcFundResult<Investment> {
        validate_amounts(
            investment.amount_invested,
            investment.equity_percentage,
            investment.exit_amount,
        )?;

        let mut state = self.write()?;
        if !state.investments.contains_key(&investment.id) {
            return Err(VcFundError::not_found("Investment", investment.id));
        }
        ensure_references(&state, investment.fund_id, investment.company_id)?;
        state.investments.insert(investment.id, investment.clone());
        Ok(investment)
    }

    /// Move an investment out of Active status, recording its exit.
    pub fn record_exit(
        &self,
        investment_id: InvestmentId,
        status: InvestmentStatus,
        exit_date: NaiveDate,
        exit_amount: Option<Money>,
    ) -> VcFundResult<Investment> {
        if status == InvestmentStatus::Active {
            return Err(VcFundError::InvalidInput {
                field: "status".into(),
                reason: "An exit must move the investment to Exited or Write-off".into(),
            });
        }
        if matches!(exit_amount, Some(a) if a < Decimal::ZERO) {
            return Err(VcFundError::InvalidInput {
                field: "exit_amount".into(),
                reason: "Exit amount must be non-negative".into(),
            });
        }

        let mut state = self.write()?;
        let investment = state
            .investments
            .get_mut(&investment_id)
            .ok_or_else(|| VcFundError::not_found("Investment", investment_id))?;
        investment.status = status;
        investment.exit_date = Some(exit_date);
        investment.exit_amount = exit_amount;
        debug!(investment_id, %status, "recorded exit");
        Ok(investment.clone())
    }

    /// Insert or update a company's snapshot for a date.
    ///
    /// A snapshot already recorded for the same (company, date) is updated in
    /// place and keeps its id.
    pub fn record_snapshot(&self, new_snapshot: NewSnapshot) -> VcFundResult<FinancialSnapshot> {
        let mut state = self.write()?;
        if !state.companies.contains_key(&new_snapshot.company_id) {
            return Err(VcFundError::not_found("Company", new_snapshot.company_id));
        }

        let id = match state.snapshot_on(new_snapshot.company_id, new_snapshot.snapshot_date) {
            Some(existing) => {
                debug!(
                    company_id = new_snapshot.company_id,
                    date = %new_snapshot.snapshot_date,
                    "snapshot exists for date, updating"
                );
                existing
            }
            None => {
                state.next_snapshot_id += 1;
                state.next_snapshot_id
            }
        };
        let snapshot = FinancialSnapshot {
            id,
            company_id: new_snapshot.company_id,
            snapshot_date: new_snapshot.snapshot_date,
            revenue: new_snapshot.revenue,
            net_income: new_snapshot.net_income,
            valuation: new_snapshot.valuation,
            stock_price: new_snapshot.stock_price,
        };
        state.snapshots.insert(id, snapshot.clone());
        Ok(snapshot)
    }

    pub fn list_companies(&self) -> VcFundResult<Vec<Company>> {
        self.with_state(|s| s.companies.values().cloned().collect())
    }

    pub fn snapshots_for_company(
        &self,
        company_id: CompanyId,
    ) -> VcFundResult<Vec<FinancialSnapshot>> {
        self.with_state(|s| {
            let mut rows: Vec<FinancialSnapshot> = s
                .snapshots
                .values()
                .filter(|snap| snap.company_id == company_id)
                .cloned()
                .collect();
            rows.sort_by_key(|snap| snap.snapshot_date);
            rows
        })
    }
}

impl PortfolioRepository for InMemoryPortfolioStore {
    fn find_fund(&self, id: FundId) -> VcFundResult<Option<Fund>> {
        self.with_state(|s| s.funds.get(&id).cloned())
    }

    fn list_funds(&self) -> VcFundResult<Vec<Fund>> {
        self.with_state(|s| s.funds.values().cloned().collect())
    }

    fn find_company(&self, id: CompanyId) -> VcFundResult<Option<Company>> {
        self.with_state(|s| s.companies.get(&id).cloned())
    }

    fn find_investment(&self, id: InvestmentId) -> VcFundResult<Option<Investment>> {
        self.with_state(|s| s.investments.get(&id).cloned())
    }

    fn find_investments_by_fund(&self, fund_id: FundId) -> VcFundResult<Vec<Investment>> {
        self.with_state(|s| {
            s.investments
                .values()
                .filter(|inv| inv.fund_id == fund_id)
                .cloned()
                .collect()
        })
    }

    fn find_latest_snapshot(
        &self,
        company_id: CompanyId,
    ) -> VcFundResult<Option<FinancialSnapshot>> {
        // Ties on date fall back to the highest id.
        self.with_state(|s| {
            s.snapshots
                .values()
                .filter(|snap| snap.company_id == company_id)
                .max_by_key(|snap| (snap.snapshot_date, snap.id))
                .cloned()
        })
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

pub(crate) fn validate_amounts(
    amount_invested: Money,
    equity_percentage: Option<Percentage>,
    exit_amount: Option<Money>,
) -> VcFundResult<()> {
    if amount_invested < Decimal::ZERO {
        return Err(VcFundError::InvalidInput {
            field: "amount_invested".into(),
            reason: "Amount invested must be non-negative".into(),
        });
    }
    if let Some(pct) = equity_percentage {
        if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(VcFundError::InvalidInput {
                field: "equity_percentage".into(),
                reason: format!("Equity percentage {pct} must be between 0 and 100"),
            });
        }
    }
    if matches!(exit_amount, Some(a) if a < Decimal::ZERO) {
        return Err(VcFundError::InvalidInput {
            field: "exit_amount".into(),
            reason: "Exit amount must be non-negative".into(),
        });
    }
    Ok(())
}

pub(crate) fn ensure_references(
    state: &StoreState,
    fund_id: FundId,
    company_id: CompanyId,
) -> VcFundResult<()> {
    if !state.funds.contains_key(&fund_id) {
        return Err(VcFundError::not_found("Fund", fund_id));
    }
    if !state.companies.contains_key(&company_id) {
        return Err(VcFundError::not_found("Company", company_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> (InMemoryPortfolioStore, Fund, Company) {
        let store = InMemoryPortfolioStore::new();
        let fund = store
            .create_fund(NewFund {
                name: "Fund Alpha".into(),
                target_size: dec!(100_000_000),
                committed_capital: dec!(0),
                vintage_year: 2022,
            })
            .unwrap();
        let company = store
            .create_company(NewCompany {
                name: "Startup X".into(),
                industry: Some("Tech".into()),
                ..Default::default()
            })
            .unwrap();
        (store, fund, company)
    }

    fn new_investment(fund_id: FundId, company_id: CompanyId) -> NewInvestment {
        NewInvestment {
            fund_id,
            company_id,
            investment_date: date(2021, 1, 1),
            amount_invested: dec!(100_000),
            equity_percentage: Some(dec!(10)),
            valuation_at_investment: Some(dec!(1_000_000)),
        }
    }

    #[test]
    fn test_ids_are_assigned_sequentially() {
        let (store, fund, company) = seeded();
        assert_eq!(fund.id, 1);
        assert_eq!(company.id, 1);
        let a = store.create_investment(new_investment(fund.id, company.id)).unwrap();
        let b = store.create_investment(new_investment(fund.id, company.id)).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.status, InvestmentStatus::Active);
    }

    #[test]
    fn test_duplicate_fund_name_conflicts() {
        let (store, _, _) = seeded();
        let err = store
            .create_fund(NewFund {
                name: "Fund Alpha".into(),
                target_size: dec!(1),
                committed_capital: dec!(0),
                vintage_year: 2023,
            })
            .unwrap_err();
        assert!(matches!(err, VcFundError::Conflict(_)));
    }

    #[test]
    fn test_investment_requires_existing_fund_and_company() {
        let (store, fund, company) = seeded();
        let err = store.create_investment(new_investment(99, company.id)).unwrap_err();
        assert!(err.is_not_found());
        let err = store.create_investment(new_investment(fund.id, 99)).unwrap_err();
        assert!(matches!(err, VcFundError::NotFound { ref entity, id: 99 } if entity == "Company"));
    }

    #[test]
    fn test_investment_validation() {
        let (store, fund, company) = seeded();
        let mut negative = new_investment(fund.id, company.id);
        negative.amount_invested = dec!(-1);
        assert!(matches!(
            store.create_investment(negative),
            Err(VcFundError::InvalidInput { ref field, .. }) if field == "amount_invested"
        ));

        let mut too_much_equity = new_investment(fund.id, company.id);
        too_much_equity.equity_percentage = Some(dec!(100.01));
        assert!(matches!(
            store.create_investment(too_much_equity),
            Err(VcFundError::InvalidInput { ref field, .. }) if field == "equity_percentage"
        ));
    }

    #[test]
    fn test_record_snapshot_upserts_same_date() {
        let (store, _, company) = seeded();
        let first = store
            .record_snapshot(NewSnapshot {
                company_id: company.id,
                snapshot_date: date(2024, 6, 30),
                revenue: None,
                net_income: None,
                valuation: Some(dec!(1_000_000)),
                stock_price: None,
            })
            .unwrap();
        let second = store
            .record_snapshot(NewSnapshot {
                company_id: company.id,
                snapshot_date: date(2024, 6, 30),
                revenue: Some(dec!(500_000)),
                net_income: None,
                valuation: Some(dec!(2_000_000)),
                stock_price: None,
            })
            .unwrap();
        assert_eq!(first.id, second.id);
        let rows = store.snapshots_for_company(company.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].valuation, Some(dec!(2_000_000)));
    }

    #[test]
    fn test_latest_snapshot_picks_max_date() {
        let (store, _, company) = seeded();
        for (d, v) in [
            (date(2024, 12, 31), dec!(3_000_000)),
            (date(2023, 12, 31), dec!(1_000_000)),
            (date(2024, 6, 30), dec!(2_000_000)),
        ] {
            store
                .record_snapshot(NewSnapshot {
                    company_id: company.id,
                    snapshot_date: d,
                    revenue: None,
                    net_income: None,
                    valuation: Some(v),
                    stock_price: None,
                })
                .unwrap();
        }
        let latest = store.find_latest_snapshot(company.id).unwrap().unwrap();
        assert_eq!(latest.snapshot_date, date(2024, 12, 31));
        assert_eq!(latest.valuation, Some(dec!(3_000_000)));
        assert!(store.find_latest_snapshot(42).unwrap().is_none());
    }

    #[test]
    fn test_snapshot_for_unknown_company_is_not_found() {
        let (store, _, _) = seeded();
        let err = store
            .record_snapshot(NewSnapshot {
                company_id: 7,
                snapshot_date: date(2024, 1, 1),
                revenue: None,
                net_income: None,
                valuation: None,
                stock_price: None,
            })
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_record_exit() {
        let (store, fund, company) = seeded();
        let inv = store.create_investment(new_investment(fund.id, company.id)).unwrap();

        let err = store
            .record_exit(inv.id, InvestmentStatus::Active, date(2024, 1, 1), None)
            .unwrap_err();
        assert!(matches!(err, VcFundError::InvalidInput { .. }));

        let exited = store
            .record_exit(
                inv.id,
                InvestmentStatus::Exited,
                date(2024, 1, 1),
                Some(dec!(150_000)),
            )
            .unwrap();
        assert_eq!(exited.status, InvestmentStatus::Exited);
        assert_eq!(exited.exit_amount, Some(dec!(150_000)));
        assert_eq!(store.find_investment(inv.id).unwrap().unwrap(), exited);
    }

    #[test]
    fn test_investments_by_fund_filters() {
        let (store, fund, company) = seeded();
        let other = store
            .create_fund(NewFund {
                name: "Fund Beta".into(),
                target_size: dec!(50_000_000),
                committed_capital: dec!(0),
                vintage_year: 2023,
            })
            .unwrap();
        store.create_investment(new_investment(fund.id, company.id)).unwrap();
        store.create_investment(new_investment(other.id, company.id)).unwrap();
        store.create_investment(new_investment(other.id, company.id)).unwrap();
        assert_eq!(store.find_investments_by_fund(fund.id).unwrap().len(), 1);
        assert_eq!(store.find_investments_by_fund(other.id).unwrap().len(), 2);
        assert!(store.find_investments_by_fund(99).unwrap().is_empty());
    }
}
