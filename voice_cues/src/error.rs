//! Error types for probes and configuration.

use std::path::PathBuf;

use host_graph::{ObjectId, ReadError, ValueKind};
use thiserror::Error;

/// Outcome of one probe into the host graph.
///
/// None of these are fatal. Callers fold them into "no value" and report
/// them in aggregate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    /// No candidate member of the expected kind exists on the type.
    #[error("no member {query} on {type_name}")]
    MemberNotFound { query: String, type_name: String },

    /// The host failed the read.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// The object was destroyed by the host.
    #[error("object {0} was invalidated")]
    Invalidated(ObjectId),

    /// The member returned a value of another kind than it declares.
    #[error("member '{member}' returned {found:?}, expected {expected:?}")]
    UnexpectedValue {
        member: String,
        expected: ValueKind,
        found: Option<ValueKind>,
    },
}

impl ProbeError {
    /// Expected absence rather than a failed read.
    pub fn is_absence(&self) -> bool {
        matches!(self, ProbeError::MemberNotFound { .. })
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
