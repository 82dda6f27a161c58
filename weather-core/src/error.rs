use thiserror::Error;

/// Shown when a lookup is submitted without a location.
pub const MSG_ENTER_CITY: &str = "Enter a city";
/// Shown when the backend answers with a non-success status.
pub const MSG_CITY_NOT_FOUND: &str = "City not found";
/// Shown for anything that went wrong on the wire or while decoding.
pub const MSG_SERVICE_UNAVAILABLE: &str = "Could not reach the weather service";

/// Why a single lookup attempt failed.
///
/// The `Display` output carries diagnostic detail for logs; what the user sees
/// is [`LookupError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The resolved location was empty. No request was made.
    #[error("empty location query")]
    EmptyQuery,

    /// The backend answered, but not with a success status.
    #[error("weather backend answered with status {status}")]
    NotFound { status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("weather backend did not answer in time")]
    Timeout,

    /// Connection failure, unreadable body or malformed payload.
    #[error("weather backend transport failure: {0}")]
    Transport(String),
}

impl LookupError {
    /// Short, human-readable message for the renderer.
    pub fn user_message(&self) -> &'static str {
        match self {
            LookupError::EmptyQuery => MSG_ENTER_CITY,
            LookupError::NotFound { .. } => MSG_CITY_NOT_FOUND,
            LookupError::Timeout | LookupError::Transport(_) => MSG_SERVICE_UNAVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_hide_transport_detail() {
        let err = LookupError::Transport("tcp connect error: Connection refused (os error 111)".into());
        assert_eq!(err.user_message(), MSG_SERVICE_UNAVAILABLE);
        assert!(err.to_string().contains("Connection refused"));

        assert_eq!(LookupError::Timeout.user_message(), MSG_SERVICE_UNAVAILABLE);
    }

    #[test]
    fn not_found_and_empty_messages() {
        assert_eq!(LookupError::NotFound { status: 404 }.user_message(), "City not found");
        assert_eq!(LookupError::EmptyQuery.user_message(), "Enter a city");
    }
}
