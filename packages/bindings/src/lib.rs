use napi::Result as NapiResult;
use napi_derive::napi;
use std::sync::Arc;

use vc_fund_core::performance::FundMetricsCalculator;
use vc_fund_core::store::{InMemoryPortfolioStore, PortfolioDataset};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn calculator(dataset_json: &str) -> NapiResult<FundMetricsCalculator> {
    let dataset = PortfolioDataset::from_json(dataset_json).map_err(to_napi_error)?;
    let store = InMemoryPortfolioStore::from_dataset(dataset).map_err(to_napi_error)?;
    Ok(FundMetricsCalculator::new(Arc::new(store)))
}

// ---------------------------------------------------------------------------
// Fund performance
// ---------------------------------------------------------------------------

#[napi]
pub fn fund_metrics(dataset_json: String, fund_id: i64) -> NapiResult<String> {
    let output = calculator(&dataset_json)?
        .metrics(fund_id)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn fund_performance(dataset_json: String, fund_id: i64) -> NapiResult<String> {
    let output = calculator(&dataset_json)?
        .analyze_fund(fund_id)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn all_fund_metrics(dataset_json: String) -> NapiResult<String> {
    let output = calculator(&dataset_json)?
        .all_fund_metrics()
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn fund(dataset_json: String, fund_id: i64) -> NapiResult<String> {
    let output = calculator(&dataset_json)?
        .fund(fund_id)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investments and companies
// ---------------------------------------------------------------------------

#[napi]
pub fn company(dataset_json: String, company_id: i64) -> NapiResult<String> {
    let output = calculator(&dataset_json)?
        .company(company_id)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn investment_value(dataset_json: String, investment_id: i64) -> NapiResult<String> {
    let output = calculator(&dataset_json)?
        .investment_value(investment_id)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn latest_valuation(dataset_json: String, company_id: i64) -> NapiResult<String> {
    let output = calculator(&dataset_json)?
        .company_valuation(company_id)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
