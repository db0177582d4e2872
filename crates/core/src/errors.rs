use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures surfaced by the shop services. Reply resolution itself never fails, so these
/// only describe requests the web layer refuses and startup problems.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("invalid chat request: {0}")]
    InvalidRequest(String),
    #[error("chat message has {actual} characters, limit is {max}")]
    MessageTooLong { actual: usize, max: usize },
    #[error("configuration failure: {0}")]
    Configuration(String),
}

/// What an HTTP caller is allowed to see. `detail` on `Rejected` is safe to echo;
/// `Failed` hides its detail behind a fixed sentence.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("[{correlation_id}] rejected: {detail}")]
    Rejected { detail: String, correlation_id: String },
    #[error("[{correlation_id}] failed: {detail}")]
    Failed { detail: String, correlation_id: String },
}

impl InterfaceError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Rejected { .. } => 400,
            Self::Failed { .. } => 500,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { detail, .. } => format!("Invalid chat request: {detail}"),
            Self::Failed { .. } => "The shop assistant is unavailable right now.".to_string(),
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Rejected { correlation_id, .. } | Self::Failed { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Configuration(detail) => InterfaceError::Failed { detail, correlation_id },
            Self::InvalidRequest(detail) => InterfaceError::Rejected { detail, correlation_id },
            other => InterfaceError::Rejected { detail: other.to_string(), correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn invalid_request_is_rejected_with_visible_detail() {
        let interface = ApplicationError::InvalidRequest("missing field `message`".to_owned())
            .into_interface("chat-1");

        assert_eq!(interface.status_code(), 400);
        assert_eq!(interface.correlation_id(), "chat-1");
        assert_eq!(
            interface.user_message(),
            "Invalid chat request: missing field `message`"
        );
    }

    #[test]
    fn oversized_message_names_the_limit() {
        let interface =
            ApplicationError::MessageTooLong { actual: 2_500, max: 2_000 }.into_interface("chat-2");

        assert!(matches!(interface, InterfaceError::Rejected { .. }));
        assert!(interface.user_message().contains("limit is 2000"));
    }

    #[test]
    fn domain_violation_is_rejected() {
        let interface = ApplicationError::from(DomainError::InvariantViolation(
            "product name must not be empty".to_owned(),
        ))
        .into_interface("chat-3");

        assert_eq!(interface.status_code(), 400);
    }

    #[test]
    fn configuration_failure_hides_detail() {
        let interface = ApplicationError::Configuration("templates file missing".to_owned())
            .into_interface("chat-4");

        assert_eq!(interface.status_code(), 500);
        assert!(!interface.user_message().contains("templates"));
        assert!(interface.to_string().contains("chat-4"));
    }
}
