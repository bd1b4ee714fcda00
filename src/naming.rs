//! External metric names for published statistics
//!
//! Two modes, chosen once per process:
//! - `legacy` derives a name from the broker's free-text element
//!   description, consulting an override table first;
//! - `manual` looks the normalized element key up in an explicit table and
//!   warns (then falls back to the heuristic) when the key is missing.

use crate::protocol::constants::*;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Metric name derivation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricNameMode {
    #[default]
    Legacy,
    Manual,
}

static MODE: OnceCell<MetricNameMode> = OnceCell::new();

/// Set the process-wide mode. Only the first call takes effect; a later call
/// asking for a different mode gets the mode already in force back as an error.
pub fn set_mode(mode: MetricNameMode) -> Result<(), MetricNameMode> {
    match MODE.try_insert(mode) {
        Ok(_) => Ok(()),
        Err((current, _)) if *current == mode => Ok(()),
        Err((current, _)) => Err(*current),
    }
}

/// Mode in force, `Legacy` until set
pub fn mode() -> MetricNameMode {
    MODE.get().copied().unwrap_or_default()
}

/// Descriptions whose derived name would be ambiguous or differ from the
/// names already in use
static OVERRIDES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("RAM total bytes - estimate for queue manager", "ram_total_estimate_for_queue_manager_bytes"),
        ("RAM total bytes", "ram_size_bytes"),
        ("Log - bytes in use", "log_in_use_bytes"),
        ("Log - bytes max", "log_max_bytes"),
        ("Log file system - bytes in use", "log_file_system_in_use_bytes"),
        ("Log file system - bytes max", "log_file_system_max_bytes"),
        ("Log - physical bytes written", "log_physical_written_bytes"),
        ("Log - logical bytes written", "log_logical_written_bytes"),
        ("Log - write latency", "log_write_latency_seconds"),
        ("Queue Manager file system - bytes in use", "queue_manager_file_system_in_use_bytes"),
        ("Queue Manager file system - free space", "queue_manager_file_system_free_space_percentage"),
        ("MQPUT/MQPUT1 count", "mqput_mqput1_count"),
        ("MQGET count", "mqget_count"),
        ("Expired message count", "expired_messages"),
    ])
});

/// Explicit names keyed by normalized `class_type_element` key
static MANUAL: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("cpu_systemsummary_user_cpu_time_percentage", "cpu_user_time_percentage"),
        ("cpu_systemsummary_system_cpu_time_percentage", "cpu_system_time_percentage"),
        ("cpu_systemsummary_cpu_load_one_minute_average", "cpu_load_one_minute"),
        ("cpu_systemsummary_ram_free_percentage", "ram_free_percentage"),
        ("cpu_systemsummary_ram_total_bytes", "ram_size_bytes"),
        ("cpu_qmgrsummary_user_cpu_time_estimate_for_queue_manager", "cpu_user_time_estimate_for_queue_manager_percentage"),
        ("cpu_qmgrsummary_ram_total_bytes_estimate_for_queue_manager", "ram_total_estimate_for_queue_manager_bytes"),
        ("disk_log_log_bytes_in_use", "log_in_use_bytes"),
        ("disk_log_log_bytes_max", "log_max_bytes"),
        ("disk_log_log_write_latency", "log_write_latency_seconds"),
        ("statmqi_put_mqput_mqput1_count", "mqput_mqput1_count"),
        ("statmqi_get_mqget_count", "mqget_count"),
        ("statq_general_messages_expired", "expired_messages"),
        ("statq_put_mqput_mqput1_count", "mqput_mqput1_count"),
        ("statq_get_mqget_count", "mqget_count"),
        ("statq_general_queue_depth", "depth"),
    ])
});

/// Lower-case, every run of other characters becomes one underscore
fn underscored(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

/// Key used by the manual table: class, type and description, normalized
pub fn element_key(class: &str, type_name: &str, description: &str) -> String {
    format!(
        "{}_{}_{}",
        underscored(class),
        underscored(type_name),
        underscored(description)
    )
}

const UNIT_WORDS: [&str; 5] = ["bytes", "seconds", "percentage", "count", "total"];

/// Derive a name from a free-text description and the element's datatype
pub fn format_description(description: &str, datatype: i32) -> String {
    if let Some(name) = OVERRIDES.get(description.trim()) {
        return (*name).to_string();
    }

    let mut words: Vec<String> = underscored(description)
        .split('_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();

    // Unit words move to the end, where the datatype decides the suffix
    let mut stripped_unit = None;
    words.retain(|w| {
        if UNIT_WORDS.contains(&w.as_str()) {
            stripped_unit.get_or_insert(w.clone());
            false
        } else {
            true
        }
    });

    let mut s = words.join("_");
    s = s.replace("messages_expired", "expired_messages");

    let suffix = match datatype {
        MQIAMO_MONITOR_PERCENT | MQIAMO_MONITOR_HUNDREDTHS => Some("percentage"),
        MQIAMO_MONITOR_KB | MQIAMO_MONITOR_MB | MQIAMO_MONITOR_GB => Some("bytes"),
        MQIAMO_MONITOR_MICROSEC => Some("seconds"),
        MQIAMO_MONITOR_DELTA => Some("count"),
        _ => match stripped_unit.as_deref() {
            Some("bytes") => Some("bytes"),
            Some("seconds") => Some("seconds"),
            Some("percentage") => Some("percentage"),
            _ => None,
        },
    };

    match suffix {
        Some(sfx) if s.is_empty() => sfx.to_string(),
        Some(sfx) => format!("{s}_{sfx}"),
        None => s,
    }
}

/// Look a normalized key up in the manual table
pub fn manual_name(key: &str) -> Option<&'static str> {
    MANUAL.get(key).copied()
}

/// External name of a published element in the process-wide mode
pub fn metric_name(key: &str, description: &str, datatype: i32) -> String {
    metric_name_in(mode(), key, description, datatype)
}

/// External name of a published element in an explicit mode
pub fn metric_name_in(mode: MetricNameMode, key: &str, description: &str, datatype: i32) -> String {
    match mode {
        MetricNameMode::Legacy => format_description(description, datatype),
        MetricNameMode::Manual => match manual_name(key) {
            Some(name) => name.to_string(),
            None => {
                warn!(key = key, "No manual metric name defined, deriving one from the description");
                format_description(description, datatype)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_override_checked_first() {
        assert_eq!(
            format_description("Log - bytes in use", MQIAMO_MONITOR_UNIT),
            "log_in_use_bytes"
        );
    }

    #[test]
    fn test_heuristic_suffixes() {
        assert_eq!(
            format_description("User CPU time percentage", MQIAMO_MONITOR_HUNDREDTHS),
            "user_cpu_time_percentage"
        );
        assert_eq!(
            format_description("RAM free percentage", MQIAMO_MONITOR_PERCENT),
            "ram_free_percentage"
        );
        assert_eq!(
            format_description("Log - write size", MQIAMO_MONITOR_KB),
            "log_write_size_bytes"
        );
        assert_eq!(
            format_description("Lock contention", MQIAMO_MONITOR_MICROSEC),
            "lock_contention_seconds"
        );
        assert_eq!(
            format_description("Interval total MQPUT/MQPUT1 byte count", MQIAMO_MONITOR_DELTA),
            "interval_mqput_mqput1_byte_count"
        );
    }

    #[test]
    fn test_messages_expired_reordered() {
        assert_eq!(
            format_description("messages expired", MQIAMO_MONITOR_DELTA),
            "expired_messages_count"
        );
    }

    #[test]
    fn test_unit_word_kept_for_plain_units() {
        assert_eq!(
            format_description("Queue Manager file system - bytes max", MQIAMO_MONITOR_UNIT),
            "queue_manager_file_system_max_bytes"
        );
        assert_eq!(format_description("Queue depth", MQIAMO_MONITOR_UNIT), "queue_depth");
    }

    #[test]
    fn test_manual_mode_lookup_and_fallback() {
        let key = element_key("CPU", "SystemSummary", "User CPU time percentage");
        assert_eq!(key, "cpu_systemsummary_user_cpu_time_percentage");
        assert_eq!(
            metric_name_in(MetricNameMode::Manual, &key, "ignored", MQIAMO_MONITOR_PERCENT),
            "cpu_user_time_percentage"
        );
        assert_eq!(
            metric_name_in(MetricNameMode::Manual, "no_such_key", "Widget count", MQIAMO_MONITOR_DELTA),
            "widget_count"
        );
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let m: MetricNameMode = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(m, MetricNameMode::Manual);
    }

    proptest! {
        #[test]
        fn names_are_clean(desc in "[A-Za-z /()-]{0,60}", dt in prop::sample::select(vec![
            MQIAMO_MONITOR_UNIT, MQIAMO_MONITOR_DELTA, MQIAMO_MONITOR_PERCENT,
            MQIAMO_MONITOR_KB, MQIAMO_MONITOR_MICROSEC,
        ])) {
            let name = format_description(&desc, dt);
            prop_assert!(!name.contains("__"));
            prop_assert!(!name.starts_with('_'));
            prop_assert!(!name.ends_with('_'));
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert_eq!(format_description(&desc, dt), name);
        }
    }
}
