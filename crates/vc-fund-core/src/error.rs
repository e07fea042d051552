use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcFundError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: i64 },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl VcFundError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        VcFundError::NotFound {
            entity: entity.to_string(),
            id,
        }
    }

    pub fn overflow(context: &str) -> Self {
        VcFundError::ArithmeticOverflow {
            context: context.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, VcFundError::NotFound { .. })
    }
}

impl From<serde_json::Error> for VcFundError {
    fn from(e: serde_json::Error) -> Self {
        VcFundError::SerializationError(e.to_string())
    }
}
