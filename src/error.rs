//! Rich diagnostic error types for the nutri-graph engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the nutri-graph engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum NutriError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification of an error for callers that map failures onto
/// transport status codes (404 / 400 / 500 equivalents).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An id did not resolve.
    NotFound,
    /// The request itself was malformed or out of range.
    InvalidInput,
    /// Anything else: I/O, serialization, configuration.
    Internal,
}

impl NutriError {
    /// Classify this error for boundary mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Model(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Query(e) => e.kind(),
            Self::Config(_) => ErrorKind::Internal,
        }
    }
}

// ---------------------------------------------------------------------------
// Model errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("confidence {value} is outside the 1-5 scale")]
    #[diagnostic(
        code(nutri::model::invalid_confidence),
        help("Confidence scores are integers from 1 (weak evidence) to 5 (strong evidence).")
    )]
    InvalidConfidence { value: i64 },

    #[error("health pillar id {value} is outside 1-8")]
    #[diagnostic(
        code(nutri::model::invalid_pillar),
        help(
            "Valid pillars are 1 Energy, 2 Digestion, 3 Immunity, 4 Sleep, \
             5 Mental Clarity, 6 Heart, 7 Muscle Recovery, 8 Inflammation. \
             List them with `nutri-graph pillars`."
        )
    )]
    InvalidPillar { value: i64 },

    #[error("unknown primary classification: \"{value}\"")]
    #[diagnostic(
        code(nutri::model::unknown_classification),
        help("Valid primary classifications are: ingredient, nutrient, compound, other.")
    )]
    UnknownClassification { value: String },

    #[error("entity \"{id}\" is not an ingredient")]
    #[diagnostic(
        code(nutri::model::not_an_ingredient),
        help(
            "Health outcomes and compound lists only exist on ingredient entities. \
             Check the entity's primary classification."
        )
    )]
    NotAnIngredient { id: String },
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("entity not found: \"{id}\"")]
    #[diagnostic(
        code(nutri::store::entity_not_found),
        help("No entity with this id exists. Use `nutri-graph suggest <text>` to look up ids.")
    )]
    EntityNotFound { id: String },

    #[error("duplicate entity: \"{id}\" already exists")]
    #[diagnostic(
        code(nutri::store::duplicate_entity),
        help("Entity ids share one namespace across all classifications. Pick a different id.")
    )]
    DuplicateEntity { id: String },

    #[error("duplicate relationship id: {id}")]
    #[diagnostic(
        code(nutri::store::duplicate_relationship),
        help("Leave `id` at 0 (or omit it) to let the store allocate one.")
    )]
    DuplicateRelationship { id: u64 },

    #[error("I/O error on {path}")]
    #[diagnostic(
        code(nutri::store::io),
        help("Check that the dataset file exists and that you have read/write permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(nutri::store::serde),
        help(
            "The dataset is not valid JSON of the expected shape: an object with \
             `entities` and `relationships` arrays."
        )
    )]
    Serialization { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EntityNotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateEntity { .. } | Self::DuplicateRelationship { .. } => {
                ErrorKind::InvalidInput
            }
            Self::Model(e) => e.kind(),
            Self::Io { .. } | Self::Serialization { .. } => ErrorKind::Internal,
        }
    }
}

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("not found: \"{id}\"")]
    #[diagnostic(
        code(nutri::query::not_found),
        help("The id does not resolve to an entity. Ids are case-sensitive.")
    )]
    NotFound { id: String },

    #[error("invalid filter `{field}`: {message}")]
    #[diagnostic(
        code(nutri::query::invalid_filter),
        help("The request was rejected before touching the store. Fix `{field}` and retry.")
    )]
    InvalidFilter { field: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Shorthand for an [`QueryError::InvalidFilter`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidFilter { .. } => ErrorKind::InvalidInput,
            Self::Model(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(nutri::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(nutri::config::parse),
        help("Check the TOML syntax. Every key is optional; omitted keys take their defaults.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(nutri::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(nutri::config::invalid), help("Check the EngineConfig fields. {message}"))]
    Invalid { message: String },
}

/// Convenience alias for functions returning nutri-graph results.
pub type NutriResult<T> = std::result::Result<T, NutriError>;

/// Result type for query operations.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
