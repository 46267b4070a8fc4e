//! Error types with fix suggestions
//!
//! The binding core itself is silent-failure: resolution misses yield `Null`,
//! assignment misses yield `false` and coercion failures are logged. Errors
//! here surface only from the host tree primitives, config loading, model
//! decoding and the CLI.

use thiserror::Error;

use crate::value::ValueType;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Crate-wide result alias
pub type Result<T, E = BinderyError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum BinderyError {
    #[error("BIND-001: IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("BIND-002: JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("BIND-003: YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ─────────────────────────────────────────────────────────────
    // Config errors (BIND-020)
    // ─────────────────────────────────────────────────────────────
    #[error("BIND-020: Invalid selector delimiter {delimiter:?}")]
    InvalidDelimiter { delimiter: char },

    // ─────────────────────────────────────────────────────────────
    // Host tree errors (BIND-040 to BIND-044)
    // ─────────────────────────────────────────────────────────────
    #[error("BIND-040: Node #{node} not found in scene")]
    NodeNotFound { node: usize },

    #[error("BIND-041: Binding #{binding} not found in scene")]
    BindingNotFound { binding: usize },

    #[error("BIND-042: Cannot move node #{node} under #{parent}: parent is inside the moved sub-tree")]
    ParentCycle { node: usize, parent: usize },

    #[error("BIND-043: No prefab registered for kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("BIND-044: Prefab '{kind}' built a root without a view")]
    MissingView { kind: String },

    // ─────────────────────────────────────────────────────────────
    // Selector errors (BIND-060), raised by the CLI only
    // ─────────────────────────────────────────────────────────────
    #[error("BIND-060: Cannot assign to '{selector}' (container missing or member not writable)")]
    AssignmentMiss { selector: String },
}

impl FixSuggestion for BinderyError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BinderyError::Io(_) => Some("Check file path and permissions"),
            BinderyError::JsonParse(_) => Some("Ensure the model file is valid JSON (try parsing with jq)"),
            BinderyError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            BinderyError::InvalidDelimiter { .. } => {
                Some("Use a single non-whitespace character such as '.' or '/'")
            }
            BinderyError::NodeNotFound { .. } => Some("The node was destroyed or never created"),
            BinderyError::BindingNotFound { .. } => {
                Some("The binding's host node was destroyed or the id is stale")
            }
            BinderyError::ParentCycle { .. } => {
                Some("Pick a new parent outside the node being moved")
            }
            BinderyError::UnknownKind { .. } => {
                Some("Register a prefab for this kind before applying the template")
            }
            BinderyError::MissingView { .. } => {
                Some("Add a View to the prefab root or enable template.implicit_view")
            }
            BinderyError::AssignmentMiss { .. } => {
                Some("Make sure every segment but the last resolves to an existing container")
            }
        }
    }
}

/// Failure reported by a [`Converter`](crate::coerce::Converter).
///
/// Never escapes coercion: it is logged and the target's zero value is used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("cannot parse {input:?} as {target}")]
    Parse { input: String, target: ValueType },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: ValueType },

    #[error("{0}")]
    Custom(String),
}
