//! Error types for quarry

use thiserror::Error;

/// Result type alias for quarry operations
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Unified error type for all quarry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuarryError {
    /// Wrong operator/arity combination passed to a condition entry point
    #[error("Invalid condition shape: {0}")]
    InvalidConditionShape(String),

    /// Join-key inference found no candidate relationship
    #[error("No relationship between '{from}' and '{joined}'{}", describe_property(.property))]
    NoRelationship {
        from: String,
        joined: String,
        property: Option<String>,
    },

    /// Join-key inference found more than one candidate relationship
    #[error("Ambiguous relationship between '{from}' and '{joined}': candidates [{}]", .candidates.join(", "))]
    AmbiguousRelationship {
        from: String,
        joined: String,
        candidates: Vec<String>,
    },

    /// Field name that does not map to a column of the entity
    #[error("Unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    /// Entity that is not registered with the metadata resolver
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Alias, table or column name that is not a safe SQL identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Inconsistent schema definition
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe_property(property: &Option<String>) -> String {
    match property {
        Some(p) => format!(" via property '{}'", p),
        None => String::new(),
    }
}

impl QuarryError {
    /// Returns true if the error was raised while building a query element
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            QuarryError::InvalidConditionShape(_)
                | QuarryError::UnknownField { .. }
                | QuarryError::UnknownEntity(_)
                | QuarryError::InvalidIdentifier(_)
        )
    }

    /// Returns true if the error comes from join-key inference at render time
    pub fn is_inference_error(&self) -> bool {
        matches!(
            self,
            QuarryError::NoRelationship { .. } | QuarryError::AmbiguousRelationship { .. }
        )
    }
}

impl From<toml::de::Error> for QuarryError {
    fn from(err: toml::de::Error) -> Self {
        QuarryError::Config(err.to_string())
    }
}

impl From<std::io::Error> for QuarryError {
    fn from(err: std::io::Error) -> Self {
        QuarryError::Config(format!("Failed to read config file: {}", err))
    }
}
