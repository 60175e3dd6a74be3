//! Error types for hotswap-tls.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for hotswap-tls operations.
pub type Result<T> = std::result::Result<T, ReloadError>;

/// Errors raised while scheduling or performing a certificate reload.
///
/// Only [`ReloadError::Configuration`] escapes to callers of the scheduling
/// entry point. Read, build and swap failures are confined to a single reload
/// attempt: they are logged and turned into a `false` outcome.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// Reload cannot be enabled with the given server or settings.
    #[error("Unable to configure TLS reloading - {0}")]
    Configuration(String),

    /// A configured certificate, key or store file could not be read.
    #[error("Unable to read TLS material [{}]: {source}", path.display())]
    Read {
        /// The file that failed to load
        path: PathBuf,
        /// The underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The candidate configuration could not be assembled.
    #[error("Unable to build TLS configuration: {0}")]
    Build(String),

    /// The server rejected or failed to apply the candidate configuration.
    #[error("Unable to apply TLS configuration: {0}")]
    Swap(String),

    /// Reload settings could not be loaded or deserialized.
    #[error("Failed to load reload settings: {0}")]
    Settings(String),
}

impl ReloadError {
    /// Shorthand for a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns `true` if this error is raised at schedule time.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Validation error for TLS configuration candidates.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name/path
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Collapse a list of errors, `Ok` when empty.
    pub fn from_list(mut errors: Vec<ValidationError>) -> std::result::Result<(), Self> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Multiple(errors)),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ReloadError {
    fn from(err: ValidationError) -> Self {
        ReloadError::Build(err.to_string())
    }
}
