//! Resource-statistics topic strings and object name validation
//!
//! The broker publishes its own metadata under a fixed `$SYS` tree. Type
//! metadata carries data-topic templates containing `%s` placeholders: the
//! first is the queue manager name, the second (object-specific types only)
//! is the monitored object name.

use thiserror::Error;

/// Root of the monitoring topic tree
pub const MONITOR_ROOT: &str = "$SYS/MQ/INFO/QMGR";

/// Topic carrying the list of monitored classes for a queue manager
pub fn metadata_classes_topic(qmgr: &str) -> String {
    format!("{MONITOR_ROOT}/{qmgr}/Monitor/METADATA/CLASSES")
}

/// Fill a data topic template with the queue manager name and,
/// for object-specific types, the object name
pub fn expand_topic(template: &str, qmgr: &str, object: Option<&str>) -> String {
    let with_qmgr = template.replacen("%s", qmgr, 1);
    match object {
        Some(obj) => with_qmgr.replacen("%s", obj, 1),
        None => with_qmgr,
    }
}

/// Durable subscription name for a topic. The prefix keeps concurrently
/// running collectors from sharing subscriptions; the topic keeps names
/// unique per collector.
pub fn durable_subscription_name(prefix: &str, topic: &str) -> String {
    format!("{prefix}_{topic}")
}

/// Pattern matching every durable subscription owned by a prefix
pub fn durable_subscription_pattern(prefix: &str) -> String {
    format!("{prefix}_*")
}

/// Validate a queue manager or object name.
/// Allowed characters are `A-Z a-z 0-9 . _ / %`, at most 48 of them.
pub fn validate_object_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.len() > 48 {
        return Err(ValidationError::TooLong(name.len()));
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && !matches!(ch, '.' | '_' | '/' | '%') {
            return Err(ValidationError::InvalidChar(ch));
        }
    }

    Ok(())
}

/// Object name validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Object name cannot be empty")]
    EmptyName,
    #[error("Object name is {0} characters, maximum is 48")]
    TooLong(usize),
    #[error("Object name contains invalid character: '{0}'")]
    InvalidChar(char),
}
