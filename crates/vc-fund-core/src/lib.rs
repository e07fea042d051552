pub mod error;
pub mod portfolio;
pub mod types;

#[cfg(feature = "store")]
pub mod store;

#[cfg(feature = "performance")]
pub mod performance;

pub use error::VcFundError;
pub use types::*;

/// Standard result type for all vc-fund operations
pub type VcFundResult<T> = Result<T, VcFundError>;
