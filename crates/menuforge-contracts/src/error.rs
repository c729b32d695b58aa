use thiserror::Error;

/// Failure taxonomy for one extraction attempt.
///
/// Every variant is terminal for the submission that raised it; the
/// caller resubmits rather than retrying internally.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Rejected before any network call: bad file type, empty submission.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Transport, auth, or non-2xx failure from the generation service.
    #[error("generation service error: {0}")]
    Service(String),
    /// The service replied, but the body was not the JSON we asked for.
    #[error("malformed service response: {0}")]
    MalformedResponse(String),
    /// Parsed fine, but itemName/description are missing on both sides.
    #[error("incomplete result: {0}")]
    IncompleteResult(String),
}

impl GenerationError {
    /// Stable tag used in event payloads and user-facing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Validation(_) => "validation",
            GenerationError::Service(_) => "service",
            GenerationError::MalformedResponse(_) => "malformed_response",
            GenerationError::IncompleteResult(_) => "incomplete_result",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GenerationError;

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(GenerationError::Validation("x".into()).kind(), "validation");
        assert_eq!(GenerationError::Service("x".into()).kind(), "service");
        assert_eq!(
            GenerationError::MalformedResponse("x".into()).kind(),
            "malformed_response"
        );
        assert_eq!(
            GenerationError::IncompleteResult("x".into()).kind(),
            "incomplete_result"
        );
    }

    #[test]
    fn display_includes_underlying_message() {
        let err = GenerationError::Service("timeout after 90s".into());
        assert!(err.to_string().contains("timeout after 90s"));
    }
}
