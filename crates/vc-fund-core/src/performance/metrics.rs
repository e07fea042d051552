use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::VcFundError;
use crate::performance::investment::{current_value, mark, Mark};
use crate::performance::valuation::latest_valuation;
use crate::portfolio::{Company, Fund, Investment, InvestmentStatus};
use crate::store::PortfolioRepository;
use crate::types::{
    round_ratio, with_metadata, CompanyId, ComputationOutput, FundId, InvestmentId, Money,
    Multiple, RATIO_DECIMAL_PLACES,
};
use crate::VcFundResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// The three paid-in ratios, each rounded to four places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundMetrics {
    /// Total value to paid-in: (distributions + remaining value) / paid-in
    pub tvpi: Multiple,
    /// Distributions to paid-in
    pub dpi: Multiple,
    /// Remaining value to paid-in
    pub rvpi: Multiple,
}

impl FundMetrics {
    /// Reported when paid-in capital is zero.
    pub fn zero() -> Self {
        let zero = round_ratio(Decimal::ZERO);
        FundMetrics {
            tvpi: zero,
            dpi: zero,
            rvpi: zero,
        }
    }
}

/// How one investment feeds the fund totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentValuation {
    pub investment_id: InvestmentId,
    pub company_id: CompanyId,
    pub status: InvestmentStatus,
    pub amount_invested: Money,
    /// Recorded exit proceeds counted as distributions
    pub distribution: Money,
    /// Mark-to-market counted as remaining value (Active investments only)
    pub remaining_value: Money,
}

/// Fund-level totals behind the ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundPerformance {
    pub fund_id: FundId,
    pub fund_name: String,
    pub vintage_year: i32,
    pub target_size: Money,
    pub committed_capital: Money,
    pub paid_in: Money,
    pub distributions: Money,
    pub remaining_value: Money,
    pub total_value: Money,
    pub num_investments: u32,
    pub num_active: u32,
    pub num_exited: u32,
    pub num_writeoffs: u32,
    pub metrics: FundMetrics,
    pub investments: Vec<InvestmentValuation>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn add(acc: Money, value: Money, context: &str) -> VcFundResult<Money> {
    acc.checked_add(value)
        .ok_or_else(|| VcFundError::overflow(context))
}

fn ratio(numerator: Money, paid_in: Money, context: &str) -> VcFundResult<Multiple> {
    numerator
        .checked_div(paid_in)
        .map(round_ratio)
        .ok_or_else(|| VcFundError::overflow(context))
}

/// Ratios from unrounded totals. Zero paid-in yields all zeros.
pub fn compute_ratios(
    paid_in: Money,
    distributions: Money,
    remaining_value: Money,
) -> VcFundResult<FundMetrics> {
    if paid_in.is_zero() {
        return Ok(FundMetrics::zero());
    }
    let total_value = add(distributions, remaining_value, "total value")?;
    Ok(FundMetrics {
        tvpi: ratio(total_value, paid_in, "tvpi")?,
        dpi: ratio(distributions, paid_in, "dpi")?,
        rvpi: ratio(remaining_value, paid_in, "rvpi")?,
    })
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Derives fund performance ratios from persisted portfolio state.
///
/// Holds nothing but the repository handle; every call re-reads the store,
/// so it is safe to share across threads and call repeatedly.
#[derive(Clone)]
pub struct FundMetricsCalculator {
    repository: Arc<dyn PortfolioRepository>,
}

impl FundMetricsCalculator {
    pub fn new(repository: Arc<dyn PortfolioRepository>) -> Self {
        Self { repository }
    }

    /// TVPI, DPI and RVPI for a fund. `NotFound` if the fund does not exist.
    pub fn metrics(&self, fund_id: FundId) -> VcFundResult<FundMetrics> {
        Ok(self.evaluate(fund_id)?.0.metrics)
    }

    /// The ratios together with the totals and per-investment contributions.
    pub fn performance(&self, fund_id: FundId) -> VcFundResult<FundPerformance> {
        Ok(self.evaluate(fund_id)?.0)
    }

    /// Performance report wrapped in the standard output envelope, with
    /// warnings for data that looks inconsistent.
    pub fn analyze_fund(
        &self,
        fund_id: FundId,
    ) -> VcFundResult<ComputationOutput<FundPerformance>> {
        let start = Instant::now();
        let (performance, warnings) = self.evaluate(fund_id)?;
        for w in &warnings {
            warn!(fund_id, "{}", w);
        }

        let assumptions = serde_json::json!({
            "ratio_decimal_places": RATIO_DECIMAL_PLACES,
            "rounding": "half-to-even, applied to final ratios only",
            "paid_in": "sum of amount_invested over all investments",
            "distributions": "sum of every recorded exit_amount, regardless of status",
            "remaining_value": "latest valuation x equity % of Active investments",
        });
        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Paid-in multiples (TVPI / DPI / RVPI)",
            &assumptions,
            warnings,
            elapsed,
            performance,
        ))
    }

    /// Performance of every fund in the store, ordered by fund id.
    pub fn all_fund_metrics(&self) -> VcFundResult<Vec<FundPerformance>> {
        self.repository
            .list_funds()?
            .iter()
            .map(|fund| self.performance(fund.id))
            .collect()
    }

    /// The stored fund record. `NotFound` if the fund does not exist.
    pub fn fund(&self, fund_id: FundId) -> VcFundResult<Fund> {
        self.repository
            .find_fund(fund_id)?
            .ok_or_else(|| VcFundError::not_found("Fund", fund_id))
    }

    /// The stored company record. `NotFound` if the company does not exist.
    pub fn company(&self, company_id: CompanyId) -> VcFundResult<Company> {
        self.repository
            .find_company(company_id)?
            .ok_or_else(|| VcFundError::not_found("Company", company_id))
    }

    /// Current value of a single investment.
    pub fn investment_value(&self, investment_id: InvestmentId) -> VcFundResult<Money> {
        let investment = self
            .repository
            .find_investment(investment_id)?
            .ok_or_else(|| VcFundError::not_found("Investment", investment_id))?;
        current_value(self.repository.as_ref(), &investment)
    }

    /// Latest known valuation of a company.
    pub fn company_valuation(&self, company_id: CompanyId) -> VcFundResult<Option<Money>> {
        latest_valuation(self.repository.as_ref(), company_id)
    }

    fn evaluate(&self, fund_id: FundId) -> VcFundResult<(FundPerformance, Vec<String>)> {
        let repo = self.repository.as_ref();
        let fund = self.fund(fund_id)?;

        let mut investments = repo.find_investments_by_fund(fund_id)?;
        investments.sort_by_key(|inv| inv.id);

        let mut warnings: Vec<String> = Vec::new();
        let mut rows: Vec<InvestmentValuation> = Vec::with_capacity(investments.len());
        let mut paid_in = Decimal::ZERO;
        let mut distributions = Decimal::ZERO;
        let mut remaining_value = Decimal::ZERO;
        let (mut num_active, mut num_exited, mut num_writeoffs) = (0u32, 0u32, 0u32);

        for inv in &investments {
            paid_in = add(paid_in, inv.amount_invested, "paid-in capital")?;

            let distribution = inv.exit_amount.unwrap_or(Decimal::ZERO);
            distributions = add(distributions, distribution, "distributions")?;

            let held_value = match inv.status {
                InvestmentStatus::Active => {
                    num_active += 1;
                    let marked = mark(repo, inv)?;
                    check_active(inv, &marked, &mut warnings);
                    marked.value
                }
                InvestmentStatus::Exited => {
                    num_exited += 1;
                    Decimal::ZERO
                }
                InvestmentStatus::WriteOff => {
                    num_writeoffs += 1;
                    Decimal::ZERO
                }
            };
            if !inv.is_active() && inv.exit_amount.is_none() {
                warnings.push(format!(
                    "Investment {} is {} with no exit amount; contributes zero",
                    inv.id, inv.status
                ));
            }
            remaining_value = add(remaining_value, held_value, "remaining value")?;

            rows.push(InvestmentValuation {
                investment_id: inv.id,
                company_id: inv.company_id,
                status: inv.status,
                amount_invested: inv.amount_invested,
                distribution,
                remaining_value: held_value,
            });
        }

        if paid_in.is_zero() {
            warnings.push("Paid-in capital is zero; all ratios reported as zero".into());
        }

        let metrics = compute_ratios(paid_in, distributions, remaining_value)?;
        debug!(
            fund_id,
            %paid_in,
            %distributions,
            %remaining_value,
            tvpi = %metrics.tvpi,
            dpi = %metrics.dpi,
            rvpi = %metrics.rvpi,
            "computed fund metrics"
        );

        let performance = FundPerformance {
            fund_id: fund.id,
            fund_name: fund.name,
            vintage_year: fund.vintage_year,
            target_size: fund.target_size,
            committed_capital: fund.committed_capital,
            paid_in,
            distributions,
            remaining_value,
            total_value: add(distributions, remaining_value, "total value")?,
            num_investments: rows.len() as u32,
            num_active,
            num_exited,
            num_writeoffs,
            metrics,
            investments: rows,
        };
        Ok((performance, warnings))
    }
}

/// Flag Active holdings whose mark looks incomplete.
fn check_active(inv: &Investment, mark: &Mark, warnings: &mut Vec<String>) {
    if inv.exit_amount.is_some() {
        warnings.push(format!(
            "Investment {} is Active but has an exit amount; proceeds counted in both distributions and remaining value",
            inv.id
        ));
        return;
    }
    if inv.equity_percentage.is_none() {
        warnings.push(format!(
            "Investment {} has no equity percentage; marked at zero",
            inv.id
        ));
    } else if mark.valuation.is_none() {
        warnings.push(format!(
            "Company {} has no current valuation; investment {} marked at zero",
            inv.company_id, inv.id
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryPortfolioStore, NewCompany, NewFund, NewInvestment, NewSnapshot};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryPortfolioStore>,
        calc: FundMetricsCalculator,
        fund_id: FundId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryPortfolioStore::new());
        let fund = store
            .create_fund(NewFund {
                name: "Perf Fund".into(),
                target_size: dec!(1_000_000),
                committed_capital: dec!(0),
                vintage_year: 2020,
            })
            .unwrap();
        let calc = FundMetricsCalculator::new(store.clone());
        Fixture {
            store,
            calc,
            fund_id: fund.id,
        }
    }

    fn add_company(store: &InMemoryPortfolioStore, name: &str, valuation: Option<Money>) -> CompanyId {
        let company = store
            .create_company(NewCompany {
                name: name.into(),
                ..Default::default()
            })
            .unwrap();
        if let Some(v) = valuation {
            store
                .record_snapshot(NewSnapshot {
                    company_id: company.id,
                    snapshot_date: date(2024, 6, 30),
                    revenue: None,
                    net_income: None,
                    valuation: Some(v),
                    stock_price: None,
                })
                .unwrap();
        }
        company.id
    }

    fn invest(
        store: &InMemoryPortfolioStore,
        fund_id: FundId,
        company_id: CompanyId,
        amount: Money,
        equity: Option<Money>,
    ) -> InvestmentId {
        store
            .create_investment(NewInvestment {
                fund_id,
                company_id,
                investment_date: date(2021, 1, 1),
                amount_invested: amount,
                equity_percentage: equity,
                valuation_at_investment: None,
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_compute_ratios_zero_paid_in() {
        let m = compute_ratios(Decimal::ZERO, dec!(100), dec!(100)).unwrap();
        assert_eq!(m, FundMetrics::zero());
        assert_eq!(m.tvpi.to_string(), "0.0000");
    }

    #[test]
    fn test_compute_ratios_rounds_each_ratio() {
        let m = compute_ratios(dec!(300), dec!(100), dec!(100)).unwrap();
        assert_eq!(m.dpi, dec!(0.3333));
        assert_eq!(m.rvpi, dec!(0.3333));
        assert_eq!(m.tvpi, dec!(0.6667));
    }

    #[test]
    fn test_unknown_fund_is_not_found() {
        let f = fixture();
        let err = f.calc.metrics(f.fund_id + 1).unwrap_err();
        assert!(matches!(err, VcFundError::NotFound { ref entity, .. } if entity == "Fund"));
    }

    #[test]
    fn test_empty_fund_reports_zero_with_warning() {
        let f = fixture();
        let out = f.calc.analyze_fund(f.fund_id).unwrap();
        assert_eq!(out.result.metrics, FundMetrics::zero());
        assert_eq!(out.result.num_investments, 0);
        assert!(out.warnings.iter().any(|w| w.contains("Paid-in capital is zero")));
    }

    #[test]
    fn test_mixed_portfolio_totals() {
        let f = fixture();
        let a = add_company(&f.store, "A", Some(dec!(2_000_000)));
        let b = add_company(&f.store, "B", Some(dec!(5_000_000)));
        let c = add_company(&f.store, "C", None);

        invest(&f.store, f.fund_id, a, dec!(100_000), Some(dec!(10)));
        let exited = invest(&f.store, f.fund_id, b, dec!(200_000), Some(dec!(5)));
        let dead = invest(&f.store, f.fund_id, c, dec!(100_000), Some(dec!(20)));
        f.store
            .record_exit(exited, InvestmentStatus::Exited, date(2024, 1, 1), Some(dec!(600_000)))
            .unwrap();
        f.store
            .record_exit(dead, InvestmentStatus::WriteOff, date(2024, 1, 1), None)
            .unwrap();

        let perf = f.calc.performance(f.fund_id).unwrap();
        assert_eq!(perf.paid_in, dec!(400_000));
        assert_eq!(perf.distributions, dec!(600_000));
        assert_eq!(perf.remaining_value, dec!(200_000));
        assert_eq!(perf.total_value, dec!(800_000));
        assert_eq!((perf.num_active, perf.num_exited, perf.num_writeoffs), (1, 1, 1));
        assert_eq!(perf.metrics.tvpi, dec!(2.0000));
        assert_eq!(perf.metrics.dpi, dec!(1.5000));
        assert_eq!(perf.metrics.rvpi, dec!(0.5000));

        let exited_row = perf
            .investments
            .iter()
            .find(|r| r.investment_id == exited)
            .unwrap();
        assert_eq!(exited_row.distribution, dec!(600_000));
        assert_eq!(exited_row.remaining_value, Decimal::ZERO);
    }

    #[test]
    fn test_active_with_exit_amount_counts_in_both_sums() {
        let f = fixture();
        let a = add_company(&f.store, "A", Some(dec!(2_000_000)));
        let id = invest(&f.store, f.fund_id, a, dec!(100_000), Some(dec!(10)));
        let mut inv = f.store.find_investment(id).unwrap().unwrap();
        inv.exit_amount = Some(dec!(150_000));
        f.store.update_investment(inv).unwrap();

        let out = f.calc.analyze_fund(f.fund_id).unwrap();
        assert_eq!(out.result.distributions, dec!(150_000));
        assert_eq!(out.result.remaining_value, dec!(150_000));
        assert_eq!(out.result.metrics.tvpi, dec!(3.0000));
        assert!(out.warnings.iter().any(|w| w.contains("is Active but has an exit amount")));
    }

    #[test]
    fn test_warnings_for_unvalued_holdings() {
        let f = fixture();
        let unvalued = add_company(&f.store, "Unvalued", None);
        let valued = add_company(&f.store, "Valued", Some(dec!(1_000_000)));
        invest(&f.store, f.fund_id, unvalued, dec!(50_000), Some(dec!(5)));
        invest(&f.store, f.fund_id, valued, dec!(50_000), None);

        let out = f.calc.analyze_fund(f.fund_id).unwrap();
        assert_eq!(out.result.remaining_value, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("has no current valuation")));
        assert!(out.warnings.iter().any(|w| w.contains("no equity percentage")));
        assert_eq!(out.methodology, "Paid-in multiples (TVPI / DPI / RVPI)");
    }

    #[test]
    fn test_active_investment_with_dangling_company_fails_whole_calculation() {
        let f = fixture();
        let repo = Dangling {
            inner: f.store.clone(),
            investment: Investment {
                id: 1,
                fund_id: f.fund_id,
                company_id: 404,
                investment_date: date(2021, 1, 1),
                amount_invested: dec!(100_000),
                equity_percentage: Some(dec!(10)),
                valuation_at_investment: None,
                exit_date: None,
                exit_amount: None,
                status: InvestmentStatus::Active,
            },
        };
        let calc = FundMetricsCalculator::new(Arc::new(repo));
        let err = calc.metrics(f.fund_id).unwrap_err();
        assert!(matches!(err, VcFundError::NotFound { ref entity, id: 404 } if entity == "Company"));
    }

    /// Repository that serves one investment whose company does not exist.
    struct Dangling {
        inner: Arc<InMemoryPortfolioStore>,
        investment: Investment,
    }

    impl PortfolioRepository for Dangling {
        fn find_fund(&self, id: FundId) -> VcFundResult<Option<Fund>> {
            self.inner.find_fund(id)
        }
        fn list_funds(&self) -> VcFundResult<Vec<Fund>> {
            self.inner.list_funds()
        }
        fn find_company(&self, id: CompanyId) -> VcFundResult<Option<Company>> {
            self.inner.find_company(id)
        }
        fn find_investment(&self, id: InvestmentId) -> VcFundResult<Option<Investment>> {
            Ok((id == self.investment.id).then(|| self.investment.clone()))
        }
        fn find_investments_by_fund(&self, fund_id: FundId) -> VcFundResult<Vec<Investment>> {
            Ok(if fund_id == self.investment.fund_id {
                vec![self.investment.clone()]
            } else {
                vec![]
            })
        }
        fn find_latest_snapshot(
            &self,
            company_id: CompanyId,
        ) -> VcFundResult<Option<crate::portfolio::FinancialSnapshot>> {
            self.inner.find_latest_snapshot(company_id)
        }
    }

    #[test]
    fn test_investment_value_lookup() {
        let f = fixture();
        let a = add_company(&f.store, "A", Some(dec!(2_000_000)));
        let id = invest(&f.store, f.fund_id, a, dec!(100_000), Some(dec!(10)));
        assert_eq!(f.calc.investment_value(id).unwrap(), dec!(200_000));
        assert!(f.calc.investment_value(id + 10).unwrap_err().is_not_found());
        assert_eq!(f.calc.company_valuation(a).unwrap(), Some(dec!(2_000_000)));
    }

    #[test]
    fn test_all_fund_metrics_covers_every_fund() {
        let f = fixture();
        f.store
            .create_fund(NewFund {
                name: "Second".into(),
                target_size: dec!(1),
                committed_capital: dec!(0),
                vintage_year: 2021,
            })
            .unwrap();
        let all = f.calc.all_fund_metrics().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].fund_id, f.fund_id);
        assert_eq!(all[1].fund_name, "Second");
    }

    #[test]
    fn test_fund_and_company_records() {
        let f = fixture();
        let a = add_company(&f.store, "A", None);

        let fund = f.calc.fund(f.fund_id).unwrap();
        assert_eq!(fund.name, "Perf Fund");
        assert_eq!(fund.target_size, dec!(1_000_000));
        assert_eq!(fund.vintage_year, 2020);
        let err = f.calc.fund(f.fund_id + 1).unwrap_err();
        assert!(matches!(err, VcFundError::NotFound { ref entity, .. } if entity == "Fund"));

        assert_eq!(f.calc.company(a).unwrap().name, "A");
        assert!(f.calc.company(a + 1).unwrap_err().is_not_found());

        let perf = f.calc.performance(f.fund_id).unwrap();
        assert_eq!(perf.vintage_year, 2020);
        assert_eq!(perf.target_size, dec!(1_000_000));
        assert_eq!(perf.committed_capital, Decimal::ZERO);
    }

    /// Repository that counts snapshot reads.
    struct CountingSnapshots {
        inner: Arc<InMemoryPortfolioStore>,
        reads: std::sync::atomic::AtomicUsize,
    }

    impl PortfolioRepository for CountingSnapshots {
        fn find_fund(&self, id: FundId) -> VcFundResult<Option<Fund>> {
            self.inner.find_fund(id)
        }
        fn list_funds(&self) -> VcFundResult<Vec<Fund>> {
            self.inner.list_funds()
        }
        fn find_company(&self, id: CompanyId) -> VcFundResult<Option<Company>> {
            self.inner.find_company(id)
        }
        fn find_investment(&self, id: InvestmentId) -> VcFundResult<Option<Investment>> {
            self.inner.find_investment(id)
        }
        fn find_investments_by_fund(&self, fund_id: FundId) -> VcFundResult<Vec<Investment>> {
            self.inner.find_investments_by_fund(fund_id)
        }
        fn find_latest_snapshot(
            &self,
            company_id: CompanyId,
        ) -> VcFundResult<Option<crate::portfolio::FinancialSnapshot>> {
            self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.find_latest_snapshot(company_id)
        }
    }

    #[test]
    fn test_unvalued_holding_reads_snapshot_once() {
        let f = fixture();
        let unvalued = add_company(&f.store, "Unvalued", None);
        let valued = add_company(&f.store, "Valued", Some(dec!(1_000_000)));
        invest(&f.store, f.fund_id, unvalued, dec!(50_000), Some(dec!(5)));
        invest(&f.store, f.fund_id, valued, dec!(50_000), Some(dec!(5)));

        let repo = Arc::new(CountingSnapshots {
            inner: f.store.clone(),
            reads: Default::default(),
        });
        let calc = FundMetricsCalculator::new(repo.clone());
        let out = calc.analyze_fund(f.fund_id).unwrap();

        assert_eq!(repo.reads.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(out.result.remaining_value, dec!(50_000));
        let unvalued_warnings: Vec<_> = out
            .warnings
            .iter()
            .filter(|w| w.contains("has no current valuation"))
            .collect();
        assert_eq!(unvalued_warnings.len(), 1);
    }
}
