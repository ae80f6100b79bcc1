use thiserror::Error;

/// Errors raised by variant editing and seasonal pricing mutations.
///
/// These errors are raised before any state is touched, so callers can
/// surface them directly without rolling anything back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariantError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("day count mismatch: itinerary has {current} days, source has {external}")]
    DayCountMismatch { current: usize, external: usize },

    #[error("variant must be saved before its seasonal pricing can be changed")]
    VariantNotPersisted,

    #[error("a package must keep at least one variant")]
    LastVariant,

    #[error("variant not found: {0}")]
    VariantNotFound(String),

    #[error("pricing period not found: {0}")]
    PeriodNotFound(String),
}

impl VariantError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        VariantError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComparisonError {
    #[error("at least two variants are required for a comparison (got {0})")]
    TooFewVariants(usize),
}

/// A catalog fetch failed. Callers degrade to an empty result and keep going.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("catalog lookup failed ({resource}): {detail}")]
pub struct LookupError {
    pub resource: &'static str,
    pub detail: String,
}

impl LookupError {
    pub fn new(resource: &'static str, detail: impl Into<String>) -> Self {
        Self {
            resource,
            detail: detail.into(),
        }
    }
}

/// Internal only: the normalizer logs these and substitutes a default.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("could not parse {kind} from {input}")]
pub struct ParseFailure {
    pub kind: &'static str,
    pub input: String,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("could not encode record: {0}")]
    Encoding(#[from] bson::ser::Error),

    #[error("record not found: {0}")]
    NotFound(String),
}
