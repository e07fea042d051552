mod commands;
mod input;
mod output;
mod settings;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::fund::{CompanyArgs, FundArgs, InvestmentArgs};
use commands::DataSource;

/// Venture fund performance metrics
#[derive(Parser)]
#[command(
    name = "vcf",
    version,
    about = "Venture fund performance metrics",
    long_about = "Computes TVPI, DPI and RVPI for venture funds from a portfolio \
                  dataset of funds, companies, investments and financial snapshots, \
                  using exact decimal arithmetic."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Portfolio dataset (JSON); overrides the configured data_path
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Configuration file (defaults to an optional ./vcf.toml)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// TVPI, DPI and RVPI for one fund
    Metrics(FundArgs),
    /// Full performance report for one fund, with per-investment breakdown
    Performance(FundArgs),
    /// Performance summary for every fund in the dataset
    Funds,
    /// Stored record of one fund
    Fund(FundArgs),
    /// Stored record of one company
    Company(CompanyArgs),
    /// Current value of a single investment
    InvestmentValue(InvestmentArgs),
    /// Latest known valuation of a company
    LatestValuation(CompanyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    let cfg = settings::load_config(cli.config.as_deref()).unwrap_or_else(|e| fail(e));
    init_tracing(&cfg.log_level);

    let source = DataSource {
        path: cfg.resolve_data_path(cli.data),
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Metrics(args) => commands::fund::run_metrics(args, &source),
        Commands::Performance(args) => commands::fund::run_performance(args, &source),
        Commands::Funds => commands::fund::run_funds(&source),
        Commands::Fund(args) => commands::fund::run_fund(args, &source),
        Commands::Company(args) => commands::fund::run_company(args, &source),
        Commands::InvestmentValue(args) => commands::fund::run_investment_value(args, &source),
        Commands::LatestValuation(args) => commands::fund::run_latest_valuation(args, &source),
        Commands::Version => {
            println!("vcf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e),
    }
}
