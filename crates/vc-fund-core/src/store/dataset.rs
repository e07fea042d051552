use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::VcFundError;
use crate::portfolio::{Company, FinancialSnapshot, Fund, Investment};
use crate::store::memory::{ensure_references, validate_amounts, InMemoryPortfolioStore, StoreState};
use crate::VcFundResult;

/// A complete portfolio as a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDataset {
    #[serde(default)]
    pub funds: Vec<Fund>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub investments: Vec<Investment>,
    #[serde(default)]
    pub financial_snapshots: Vec<FinancialSnapshot>,
}

impl PortfolioDataset {
    pub fn from_json(json: &str) -> VcFundResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl InMemoryPortfolioStore {
    /// Build a store from a dataset, rejecting anything the CRUD layer would
    /// have refused: duplicate ids, dangling references, out-of-range amounts
    /// and more than one snapshot per (company, date).
    pub fn from_dataset(dataset: PortfolioDataset) -> VcFundResult<Self> {
        let mut state = StoreState::default();

        for fund in dataset.funds {
            let id = fund.id;
            if state.funds.insert(id, fund).is_some() {
                return Err(VcFundError::Conflict(format!("duplicate fund id {id}")));
            }
        }
        for company in dataset.companies {
            let id = company.id;
            if state.companies.insert(id, company).is_some() {
                return Err(VcFundError::Conflict(format!("duplicate company id {id}")));
            }
        }
        for investment in dataset.investments {
            let id = investment.id;
            validate_amounts(
                investment.amount_invested,
                investment.equity_percentage,
                investment.exit_amount,
            )
            .map_err(|e| malformed("investment", id, e))?;
            ensure_references(&state, investment.fund_id, investment.company_id)?;
            if state.investments.insert(id, investment).is_some() {
                return Err(VcFundError::Conflict(format!("duplicate investment id {id}")));
            }
        }

        let mut seen_dates = HashSet::new();
        for snapshot in dataset.financial_snapshots {
            if !state.companies.contains_key(&snapshot.company_id) {
                return Err(VcFundError::not_found("Company", snapshot.company_id));
            }
            if !seen_dates.insert((snapshot.company_id, snapshot.snapshot_date)) {
                return Err(VcFundError::Conflict(format!(
                    "company {} has more than one snapshot on {}",
                    snapshot.company_id, snapshot.snapshot_date
                )));
            }
            let id = snapshot.id;
            if state.snapshots.insert(id, snapshot).is_some() {
                return Err(VcFundError::Conflict(format!("duplicate snapshot id {id}")));
            }
        }

        Ok(Self::from_state(state))
    }

    /// Export the current contents, each collection ordered by id.
    pub fn to_dataset(&self) -> VcFundResult<PortfolioDataset> {
        self.with_state(|s| PortfolioDataset {
            funds: s.funds.values().cloned().collect(),
            companies: s.companies.values().cloned().collect(),
            investments: s.investments.values().cloned().collect(),
            financial_snapshots: s.snapshots.values().cloned().collect(),
        })
    }
}

/// Out-of-range fields in loaded data are malformed records, not rejected writes.
fn malformed(entity: &str, id: i64, err: VcFundError) -> VcFundError {
    match err {
        VcFundError::InvalidInput { field, reason } => {
            VcFundError::InvalidData(format!("{entity} {id}: {field}: {reason}"))
        }
        other => other,
    }
}
