//! Error Types
//!
//! The typed failures callers are expected to match on. Everything else
//! propagates as `anyhow::Error` with context attached at the I/O seams.

use thiserror::Error;

/// Raised when the dispatcher is handed a provider tag it does not know.
/// Unrecoverable; surfaces at construction, never mid-run.
#[derive(Debug, Error)]
#[error("unsupported provider: '{provider}' (expected: anthropic, openai, openai-responses, gemini)")]
pub struct UnsupportedProviderError {
    pub provider: String,
}

/// Raised by the retry wrapper once every attempt has failed.
#[derive(Debug, Error)]
#[error("retry exhausted after {attempts} attempts: {last_error}")]
pub struct RetryExhaustedError {
    pub attempts: u32,
    /// Rendered message of the final underlying failure.
    pub last_error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_provider_names_offender() {
        let err = UnsupportedProviderError {
            provider: "bedrock".into(),
        };
        assert!(err.to_string().contains("bedrock"));
    }

    #[test]
    fn retry_exhausted_downcasts_through_anyhow() {
        let err: anyhow::Error = RetryExhaustedError {
            attempts: 4,
            last_error: "boom".into(),
        }
        .into();
        let typed = err.downcast_ref::<RetryExhaustedError>().unwrap();
        assert_eq!(typed.attempts, 4);
    }
}
