//! Text extraction seam for uploaded document payloads.

use async_trait::async_trait;

use crate::error::{CitekitError, Result};

/// Extracts plain text from an uploaded document payload.
///
/// Implementations adapt concrete format tooling (PDF parsers, OCR
/// pipelines, plain-text passthrough). Extraction failures are input
/// errors: the payload is rejected before anything downstream runs.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract UTF-8 text from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::InvalidInput`] if the payload cannot be
    /// parsed, or [`CitekitError::EmptyInput`] if parsing succeeds but
    /// yields no text.
    async fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// Passthrough extractor for payloads that are already UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(bytes).map_err(|e| CitekitError::InvalidInput {
            message: format!("payload is not valid UTF-8: {e}"),
        })?;
        if text.trim().is_empty() {
            return Err(CitekitError::EmptyInput);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_text_passes_through() {
        let text = PlainTextExtractor.extract("hello world".as_bytes()).await.unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn invalid_utf8_is_rejected_as_input() {
        let err = PlainTextExtractor.extract(&[0xff, 0xfe, 0x00]).await.unwrap_err();
        assert!(matches!(err, CitekitError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn whitespace_only_payload_is_empty_input() {
        let err = PlainTextExtractor.extract("  \n\t ".as_bytes()).await.unwrap_err();
        assert!(matches!(err, CitekitError::EmptyInput));
    }
}
