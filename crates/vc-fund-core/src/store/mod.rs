pub mod dataset;
pub mod memory;
pub mod repository;

pub use dataset::PortfolioDataset;
pub use memory::{InMemoryPortfolioStore, NewCompany, NewFund, NewInvestment, NewSnapshot};
pub use repository::PortfolioRepository;
