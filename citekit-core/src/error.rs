//! Error types shared across the citekit workspace.

use std::time::Duration;

use thiserror::Error;

use crate::paper::PaperId;

/// Errors that can occur in citekit operations.
#[derive(Debug, Error)]
pub enum CitekitError {
    /// The document text contained no usable content.
    #[error("Empty input: document contains no extractable text")]
    EmptyInput,

    /// The request was malformed.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// A description of what was wrong with the input.
        message: String,
    },

    /// The external embedding service failed.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingService {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The external completion service failed or timed out.
    #[error("Completion unavailable ({provider}): {message}")]
    CompletionUnavailable {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An external call did not return within its deadline.
    #[error("{service} request timed out after {timeout:?}")]
    ServiceTimeout {
        /// The service that was called.
        service: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// A query was embedded with a different model than the index holds.
    #[error("Embedding model mismatch: index holds '{indexed}' vectors, query used '{query}'")]
    ModelMismatch {
        /// Model that produced the stored vectors.
        indexed: String,
        /// Model that produced the query vector.
        query: String,
    },

    /// A vector had the wrong number of dimensions.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensions the index was built with.
        expected: usize,
        /// Dimensions actually received.
        actual: usize,
    },

    /// The named paper does not exist where it was looked for.
    #[error("Paper {paper_id} not found")]
    PaperNotFound {
        /// The identifier that failed to resolve.
        paper_id: PaperId,
    },

    /// The named bibliography entry does not exist.
    #[error("Reference [{ordinal}] not found")]
    ReferenceNotFound {
        /// The one-based ordinal that failed to resolve.
        ordinal: usize,
    },

    /// A background task failed outside any external service.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for citekit operations.
pub type Result<T> = std::result::Result<T, CitekitError>;

/// Coarse classification of a [`CitekitError`], for mapping to
/// transport-level outcomes (HTTP status families, retry policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The caller's input was rejected.
    Input,
    /// An external or internal service failed; retrying may help.
    Service,
    /// Stored and requested state disagree; retrying will not help.
    Consistency,
    /// A referenced entity does not exist.
    NotFound,
    /// The component was misconfigured.
    Config,
}

impl CitekitError {
    /// Classify this error for transport mapping.
    pub fn class(&self) -> ErrorClass {
        match self {
            CitekitError::EmptyInput | CitekitError::InvalidInput { .. } => ErrorClass::Input,
            CitekitError::EmbeddingService { .. }
            | CitekitError::CompletionUnavailable { .. }
            | CitekitError::ServiceTimeout { .. }
            | CitekitError::Internal(_) => ErrorClass::Service,
            CitekitError::ModelMismatch { .. } | CitekitError::DimensionMismatch { .. } => {
                ErrorClass::Consistency
            }
            CitekitError::PaperNotFound { .. } | CitekitError::ReferenceNotFound { .. } => {
                ErrorClass::NotFound
            }
            CitekitError::Config(_) => ErrorClass::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_cover_the_taxonomy() {
        assert_eq!(CitekitError::EmptyInput.class(), ErrorClass::Input);
        assert_eq!(
            CitekitError::EmbeddingService {
                provider: "openai".into(),
                message: "503".into()
            }
            .class(),
            ErrorClass::Service
        );
        assert_eq!(
            CitekitError::ServiceTimeout {
                service: "embedding".into(),
                timeout: Duration::from_secs(30)
            }
            .class(),
            ErrorClass::Service
        );
        assert_eq!(
            CitekitError::ModelMismatch { indexed: "a".into(), query: "b".into() }.class(),
            ErrorClass::Consistency
        );
        assert_eq!(
            CitekitError::PaperNotFound { paper_id: PaperId::new() }.class(),
            ErrorClass::NotFound
        );
        assert_eq!(CitekitError::Config("bad".into()).class(), ErrorClass::Config);
    }

    #[test]
    fn messages_name_the_failing_component() {
        let err = CitekitError::ModelMismatch {
            indexed: "text-embedding-3-small".into(),
            query: "text-embedding-ada-002".into(),
        };
        let text = err.to_string();
        assert!(text.contains("text-embedding-3-small"));
        assert!(text.contains("text-embedding-ada-002"));
    }
}
