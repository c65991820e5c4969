use bioslide_common::Terms;
use bioslide_protocol::ErrorBody;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BioslideError {
    /// Transport failure or a non-success status from a remote endpoint.
    #[error("Request failed: {0}")]
    Request(String),

    /// The remote answered, but not in the expected shape.
    #[error("Unexpected response: {0}")]
    ResponseShape(String),

    #[error("Could not parse coordinates: {0}")]
    Coordinates(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session channel closed")]
    ChannelClosed,

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BioslideError>;

/// Turns errors into what a user or a caller of an endpoint gets to see.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Every failure surfaces as the same localized apology; the detail goes
    /// to the log.
    pub fn user_message(error: &BioslideError, terms: &Terms) -> String {
        tracing::warn!("surfacing error to user: {error}");
        terms.chat_failure.to_string()
    }

    pub fn to_body(error: &BioslideError) -> ErrorBody {
        let text = match error {
            BioslideError::Validation(reason) => reason.clone(),
            BioslideError::Coordinates(_) => "Could not parse coordinates".to_string(),
            BioslideError::Request(_) | BioslideError::Generic(_) => {
                "Failed to process request".to_string()
            }
            other => other.to_string(),
        };
        ErrorBody::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioslide_common::terms::ARMENIAN;

    #[test]
    fn user_message_is_the_localized_apology() {
        let err = BioslideError::Request("connection reset".into());
        assert_eq!(ErrorReporter::user_message(&err, &ARMENIAN), ARMENIAN.chat_failure);
    }

    #[test]
    fn bodies_hide_transport_details() {
        let err = BioslideError::Request("openai http 500: boom".into());
        assert_eq!(ErrorReporter::to_body(&err).error, "Failed to process request");

        let err = BioslideError::Validation("Location name is required".into());
        assert_eq!(ErrorReporter::to_body(&err).error, "Location name is required");
    }
}
