pub mod fund;

use std::path::PathBuf;
use std::sync::Arc;

use vc_fund_core::performance::FundMetricsCalculator;
use vc_fund_core::store::{InMemoryPortfolioStore, PortfolioDataset};

use crate::input;

/// Where the portfolio dataset comes from, in priority order:
/// `--data`, configured `data_path`, then piped stdin.
pub struct DataSource {
    pub path: Option<PathBuf>,
}

impl DataSource {
    pub fn calculator(&self) -> Result<FundMetricsCalculator, Box<dyn std::error::Error>> {
        let dataset: PortfolioDataset = if let Some(ref path) = self.path {
            input::file::read_json(path)?
        } else if let Some(dataset) = input::stdin::read_stdin_dataset()? {
            dataset
        } else {
            return Err(
                "--data <portfolio.json>, VCF_DATA_PATH or a dataset on stdin is required".into(),
            );
        };
        let store = InMemoryPortfolioStore::from_dataset(dataset)?;
        tracing::debug!(path = ?self.path, "loaded portfolio dataset");
        Ok(FundMetricsCalculator::new(Arc::new(store)))
    }
}
