//! Error types for session establishment and collection
//!
//! Connect-time failures are fatal to the session and say which step failed.
//! Collection failures are scoped to one pass and never tear the session
//! down. Decode failures are scoped to one message and are logged rather
//! than returned. Teardown errors are logged only.

use crate::protocol::CodecError;
use crate::status::ObjectClass;
use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;

/// Step of session establishment, reported with connect failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStep {
    Connect,
    OpenQueueManager,
    InquireQueueManager,
    OpenCommandQueue,
    OpenReplyQueue,
    OpenStatusReplyQueue,
    Credentials,
}

impl fmt::Display for ConnectStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectStep::Connect => "connect",
            ConnectStep::OpenQueueManager => "open queue manager",
            ConnectStep::InquireQueueManager => "inquire queue manager",
            ConnectStep::OpenCommandQueue => "open command queue",
            ConnectStep::OpenReplyQueue => "open reply queue",
            ConnectStep::OpenStatusReplyQueue => "open status reply queue",
            ConnectStep::Credentials => "resolve credentials",
        };
        f.write_str(s)
    }
}

/// Session establishment errors
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Connect failed at step '{step}': {source}")]
    ConnectFailed {
        step: ConnectStep,
        #[source]
        source: TransportError,
    },

    #[error("Queue manager command level {level} is below {required}, required for publications")]
    UnsupportedVersion { level: i32, required: i32 },

    #[error("Queue monitoring is disabled on queue manager {queue_manager}")]
    EventMonitoringDisabled { queue_manager: String },

    #[error("Credential environment variable not set: {0}")]
    MissingCredential(String),

    #[error("Session '{0}' is already connected")]
    AlreadyConnected(String),
}

impl ConnectError {
    pub fn at(step: ConnectStep) -> impl FnOnce(TransportError) -> ConnectError {
        move |source| ConnectError::ConnectFailed { step, source }
    }
}

/// Errors from one collection pass
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Session is not connected")]
    NotConnected,

    #[error("Command {command} failed: completion code {comp_code}, reason {reason}")]
    Protocol {
        command: i32,
        comp_code: i32,
        reason: i32,
    },

    #[error("Reply sequence for {class} ended without a final message")]
    Timeout { class: ObjectClass },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Publications are not available on this session")]
    PublicationsUnavailable,

    #[error("{class} is not collected on this platform")]
    UnsupportedClass { class: ObjectClass },
}

/// Coarse classification used when reporting failures upward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConnectFailed,
    UnsupportedVersion,
    EventMonitoringDisabled,
    Protocol,
    Timeout,
    Transport,
    Decode,
    Configuration,
    Session,
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("Connect error: {0}")]
    Connect(#[from] ConnectError),

    #[error("Collection error: {0}")]
    Collect(#[from] CollectError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("No session registered under key '{0}'")]
    UnknownSession(String),
}

impl MetricError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetricError::Connect(ConnectError::UnsupportedVersion { .. }) => {
                ErrorKind::UnsupportedVersion
            }
            MetricError::Connect(ConnectError::EventMonitoringDisabled { .. }) => {
                ErrorKind::EventMonitoringDisabled
            }
            MetricError::Connect(_) => ErrorKind::ConnectFailed,
            MetricError::Collect(CollectError::Protocol { .. }) => ErrorKind::Protocol,
            MetricError::Collect(CollectError::Timeout { .. }) => ErrorKind::Timeout,
            MetricError::Collect(CollectError::Codec(_)) => ErrorKind::Decode,
            MetricError::Collect(CollectError::NotConnected) => ErrorKind::Session,
            MetricError::Collect(_) => ErrorKind::Transport,
            MetricError::Config(_) => ErrorKind::Configuration,
            MetricError::UnknownSession(_) => ErrorKind::Session,
        }
    }

    /// Message safe to log: credentials and secret paths removed, bounded length
    pub fn sanitized(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

/// Remove credential-looking fragments and long tails from a message
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = message.to_string();

    if let Ok(re) = regex::Regex::new(r"(?i)(password|passwd|token|key|secret)[=:]\s*\S+") {
        sanitized = re.replace_all(&sanitized, "${1}=***").to_string();
    }

    if let Ok(re) =
        regex::Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|ssl|keystore)/[a-zA-Z0-9._/-]+")
    {
        sanitized = re.replace_all(&sanitized, "/***REDACTED***/").to_string();
    }

    if sanitized.len() > 500 {
        let truncate_suffix = "...[truncated]";
        let mut cut = 500 - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for collector operations
pub type MetricResult<T> = Result<T, MetricError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::*;

    #[test]
    fn test_connect_failure_names_step() {
        let err = ConnectError::at(ConnectStep::OpenCommandQueue)(TransportError::new(
            "open",
            MQRC_NOT_AUTHORIZED,
        ));
        let msg = err.to_string();
        assert!(msg.contains("open command queue"));
        assert!(msg.contains("2035"));
    }

    #[test]
    fn test_kind_mapping() {
        let e: MetricError = ConnectError::UnsupportedVersion {
            level: 800,
            required: 900,
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::UnsupportedVersion);

        let e: MetricError = ConnectError::EventMonitoringDisabled {
            queue_manager: "QM1".to_string(),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::EventMonitoringDisabled);

        let e: MetricError = CollectError::Timeout {
            class: ObjectClass::Channel,
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::Timeout);

        let e: MetricError = CollectError::Protocol {
            command: MQCMD_INQUIRE_Q_STATUS,
            comp_code: MQCC_FAILED,
            reason: MQRC_UNKNOWN_OBJECT_NAME,
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::Protocol);

        let e = MetricError::UnknownSession("prod".to_string());
        assert_eq!(e.kind(), ErrorKind::Session);
    }

    #[test]
    fn test_sanitize_credentials() {
        let sanitized = sanitize_error_message("auth failed: password=secret123 token: abc");
        assert!(!sanitized.contains("secret123"));
        assert!(!sanitized.contains("abc"));
        assert!(sanitized.contains("password=***"));
    }

    #[test]
    fn test_sanitize_keystore_path() {
        let sanitized = sanitize_error_message("cannot read /var/mqm/ssl/key.kdb");
        assert!(sanitized.contains("/***REDACTED***/"));
        assert!(!sanitized.contains("key.kdb"));
    }

    #[test]
    fn test_long_message_truncation() {
        let sanitized = sanitize_error_message(&"x".repeat(600));
        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_sanitize_exactly_500_chars() {
        let sanitized = sanitize_error_message(&"x".repeat(500));
        assert_eq!(sanitized.len(), 500);
    }
}
