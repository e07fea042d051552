use std::io::{self, Read};

use vc_fund_core::store::PortfolioDataset;

/// Read a portfolio dataset from stdin when one is piped in.
/// Returns None if stdin is a TTY or empty.
pub fn read_stdin_dataset() -> Result<Option<PortfolioDataset>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    Ok(Some(PortfolioDataset::from_json(trimmed)?))
}
