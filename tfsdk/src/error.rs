//! Error types for tfsdk

use crate::types::Diagnostics;

/// Error type for tfsdk operations
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("Resource type not found: {0}")]
    ResourceNotFound(String),

    #[error("Data source type not found: {0}")]
    DataSourceNotFound(String),

    #[error("Provider not configured")]
    ProviderNotConfigured,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Validation failed: {0}")]
    Validation(Diagnostics),

    /// Errors reported by an apply, read or import.
    #[error("{0}")]
    Diagnostics(Diagnostics),

    #[error("parsing {input:?} as {kind}: {reason}")]
    InvalidId {
        kind: String,
        input: String,
        reason: String,
    },

    #[error("A resource with the ID {id:?} already exists - to be managed via Terraform this resource needs to be imported into the State. Please see the resource documentation for {resource_type:?} for more information.")]
    RequiresImport { resource_type: String, id: String },

    #[error("{operation} {id}: {source}")]
    Operation {
        operation: String,
        id: String,
        source: Box<SdkError>,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("context deadline exceeded after {0:?}")]
    DeadlineExceeded(std::time::Duration),

    #[error("context cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

impl SdkError {
    /// Wraps an error with the operation being performed and the identifier it was performed on.
    pub fn operation(
        operation: impl Into<String>,
        id: impl std::fmt::Display,
        source: impl Into<SdkError>,
    ) -> Self {
        SdkError::Operation {
            operation: operation.into(),
            id: id.to_string(),
            source: Box::new(source.into()),
        }
    }

    /// True when this error, or the error it wraps, is a remote not-found.
    pub fn is_not_found(&self) -> bool {
        match self {
            SdkError::Remote(remote) => remote.is_not_found(),
            SdkError::Operation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            SdkError::DeadlineExceeded(_) => true,
            SdkError::Operation { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Result type alias for tfsdk operations
pub type Result<T> = std::result::Result<T, SdkError>;

impl From<String> for SdkError {
    fn from(s: String) -> Self {
        SdkError::Custom(s)
    }
}

impl From<&str> for SdkError {
    fn from(s: &str) -> Self {
        SdkError::Custom(s.to_string())
    }
}

/// Errors reported by a remote API client.
///
/// `NotFound` is kept apart from every other failure: reads and deletes treat it as an
/// outcome rather than an error, and the pre-create existence check relies on it.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("the remote resource was not found")]
    NotFound,

    #[error("long running operation finished with status {status:?}: {message}")]
    PollingFailed { status: String, message: String },

    #[error(transparent)]
    Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl RemoteError {
    pub fn failed<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RemoteError::Failed(Box::new(error))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_error_includes_operation_and_id() {
        let err = SdkError::operation(
            "retrieving",
            "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg",
            RemoteError::PollingFailed {
                status: "Failed".to_string(),
                message: "boom".to_string(),
            },
        );

        assert_eq!(
            err.to_string(),
            "retrieving /subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg: long running operation finished with status \"Failed\": boom"
        );
    }

    #[test]
    fn not_found_is_detected_through_wrapping() {
        let err = SdkError::operation("deleting", "/x", RemoteError::NotFound);
        assert!(err.is_not_found());

        let err = SdkError::operation("deleting", "/x", SdkError::Cancelled);
        assert!(!err.is_not_found());
    }

    #[test]
    fn requires_import_names_the_resource_type() {
        let err = SdkError::RequiresImport {
            resource_type: "azurerm_api_connection".to_string(),
            id: "/x".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("\"/x\" already exists"));
        assert!(message.contains("\"azurerm_api_connection\""));
    }
}
