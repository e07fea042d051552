use clap::Args;
use serde_json::{json, Value};

use super::DataSource;

/// Arguments for fund-level commands
#[derive(Args)]
pub struct FundArgs {
    /// Fund identifier
    #[arg(long)]
    pub fund_id: i64,
}

/// Arguments for valuing one investment
#[derive(Args)]
pub struct InvestmentArgs {
    /// Investment identifier
    #[arg(long)]
    pub investment_id: i64,
}

/// Arguments for a company valuation lookup
#[derive(Args)]
pub struct CompanyArgs {
    /// Company identifier
    #[arg(long)]
    pub company_id: i64,
}

pub fn run_metrics(args: FundArgs, source: &DataSource) -> Result<Value, Box<dyn std::error::Error>> {
    let calc = source.calculator()?;
    let metrics = calc.metrics(args.fund_id)?;
    Ok(serde_json::to_value(metrics)?)
}

pub fn run_performance(
    args: FundArgs,
    source: &DataSource,
) -> Result<Value, Box<dyn std::error::Error>> {
    let calc = source.calculator()?;
    let report = calc.analyze_fund(args.fund_id)?;
    Ok(serde_json::to_value(report)?)
}

/// The stored fund record.
pub fn run_fund(args: FundArgs, source: &DataSource) -> Result<Value, Box<dyn std::error::Error>> {
    let calc = source.calculator()?;
    Ok(serde_json::to_value(calc.fund(args.fund_id)?)?)
}

/// The stored company record.
pub fn run_company(
    args: CompanyArgs,
    source: &DataSource,
) -> Result<Value, Box<dyn std::error::Error>> {
    let calc = source.calculator()?;
    Ok(serde_json::to_value(calc.company(args.company_id)?)?)
}

/// One summary row per fund.
pub fn run_funds(source: &DataSource) -> Result<Value, Box<dyn std::error::Error>> {
    let calc = source.calculator()?;
    let rows: Vec<Value> = calc
        .all_fund_metrics()?
        .into_iter()
        .map(|perf| {
            json!({
                "fund_id": perf.fund_id,
                "fund_name": perf.fund_name,
                "vintage_year": perf.vintage_year,
                "target_size": perf.target_size,
                "committed_capital": perf.committed_capital,
                "num_investments": perf.num_investments,
                "paid_in": perf.paid_in,
                "distributions": perf.distributions,
                "remaining_value": perf.remaining_value,
                "metrics": perf.metrics,
            })
        })
        .collect();
    Ok(Value::Array(rows))
}

pub fn run_investment_value(
    args: InvestmentArgs,
    source: &DataSource,
) -> Result<Value, Box<dyn std::error::Error>> {
    let calc = source.calculator()?;
    let value = calc.investment_value(args.investment_id)?;
    Ok(json!({
        "investment_id": args.investment_id,
        "current_value": value,
    }))
}

pub fn run_latest_valuation(
    args: CompanyArgs,
    source: &DataSource,
) -> Result<Value, Box<dyn std::error::Error>> {
    let calc = source.calculator()?;
    let valuation = calc.company_valuation(args.company_id)?;
    Ok(json!({
        "company_id": args.company_id,
        "latest_valuation": valuation,
    }))
}
