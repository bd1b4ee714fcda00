//! Attribute registry and value store
//!
//! Each monitored object class has a fixed table of [`StatusAttribute`]s,
//! populated once per session on first use. Collection passes fold decoded
//! replies into the table in two scans of each message: the class parser
//! first finds the instance key and the identity strings, then every integer
//! parameter is applied under that key.

pub mod attribute;
pub mod channel;
pub mod cluster;
pub mod qmgr;
pub mod queue;
pub mod squash;
pub mod subscription;
pub mod topic;
pub mod usage;

pub use attribute::{StatusAttribute, StatusSet};
pub use squash::{HealthState, Squash, SQUASH_RUNNING, SQUASH_STOPPED, SQUASH_TRANSITION};

use crate::protocol::constants::*;
use crate::protocol::PcfParameter;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Placeholder exposed instead of a client id when redaction is enabled
pub const HIDDEN_CLIENT_ID: &str = "<hidden>";

/// One monitored category of broker object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Queue,
    Channel,
    AmqpChannel,
    MqttChannel,
    Topic,
    Subscription,
    QueueManager,
    Cluster,
    UsageBufferPool,
    UsagePageSet,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 10] = [
        ObjectClass::Queue,
        ObjectClass::Channel,
        ObjectClass::AmqpChannel,
        ObjectClass::MqttChannel,
        ObjectClass::Topic,
        ObjectClass::Subscription,
        ObjectClass::QueueManager,
        ObjectClass::Cluster,
        ObjectClass::UsageBufferPool,
        ObjectClass::UsagePageSet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectClass::Queue => "queue",
            ObjectClass::Channel => "channel",
            ObjectClass::AmqpChannel => "amqp_channel",
            ObjectClass::MqttChannel => "mqtt_channel",
            ObjectClass::Topic => "topic",
            ObjectClass::Subscription => "subscription",
            ObjectClass::QueueManager => "queue_manager",
            ObjectClass::Cluster => "cluster",
            ObjectClass::UsageBufferPool => "usage_buffer_pool",
            ObjectClass::UsagePageSet => "usage_page_set",
        }
    }

    /// Whether status polling for this class exists on a platform
    pub fn supported_on(self, platform: i32) -> bool {
        match self {
            ObjectClass::UsageBufferPool | ObjectClass::UsagePageSet => platform == MQPL_ZOS,
            ObjectClass::AmqpChannel | ObjectClass::MqttChannel | ObjectClass::QueueManager => {
                platform != MQPL_ZOS
            }
            _ => true,
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        ObjectClass::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown object class '{s}'"))
    }
}

/// A value of one attribute for one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Int(i64),
    Str(String),
}

impl StatusValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StatusValue::Int(v) => Some(*v),
            StatusValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StatusValue::Str(s) => Some(s),
            StatusValue::Int(_) => None,
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusValue::Int(v) => write!(f, "{v}"),
            StatusValue::Str(s) => f.write_str(s),
        }
    }
}

/// Which topic status view a request asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicQuery {
    #[default]
    Status,
    Publishers,
    Subscribers,
}

impl TopicQuery {
    pub fn label(self) -> &'static str {
        match self {
            TopicQuery::Status => "status",
            TopicQuery::Publishers => "pub",
            TopicQuery::Subscribers => "sub",
        }
    }

    pub fn selector(self) -> i32 {
        match self {
            TopicQuery::Status => MQIACF_TOPIC_STATUS,
            TopicQuery::Publishers => MQIACF_TOPIC_PUB,
            TopicQuery::Subscribers => MQIACF_TOPIC_SUB,
        }
    }
}

/// Per-request inputs to the class parsers
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    pub platform: i32,
    /// Offset of the queue manager's local clock from UTC, in seconds
    pub tz_offset_secs: i64,
    pub hide_amqp_client_id: bool,
    pub hide_mqtt_client_id: bool,
    pub topic_query: TopicQuery,
    pub now: DateTime<Utc>,
}

impl ParseContext {
    pub fn new(platform: i32) -> Self {
        Self {
            platform,
            tz_offset_secs: 0,
            hide_amqp_client_id: false,
            hide_mqtt_client_id: false,
            topic_query: TopicQuery::Status,
            now: Utc::now(),
        }
    }

    /// Seconds elapsed since a broker date/time pair, if both are present
    pub fn seconds_since(&self, date: Option<&str>, time: Option<&str>) -> Option<i64> {
        time_since(date?, time?, self.tz_offset_secs, self.now)
    }
}

/// Result of the identity scan over one reply
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Object name, used for pattern exclusion and definition merging
    pub name: String,
    /// Instance key
    pub key: String,
    /// Values the parser derived itself
    pub values: Vec<(&'static str, StatusValue)>,
}

impl Row {
    pub fn new(name: &str, key: String) -> Self {
        Self {
            name: name.to_string(),
            key,
            values: Vec::new(),
        }
    }

    pub fn with(mut self, attr: &'static str, value: StatusValue) -> Self {
        self.values.push((attr, value));
        self
    }

    pub fn with_str(self, attr: &'static str, value: &str) -> Self {
        self.with(attr, StatusValue::Str(value.to_string()))
    }

    pub fn with_opt_int(self, attr: &'static str, value: Option<i64>) -> Self {
        match value {
            Some(v) => self.with(attr, StatusValue::Int(v)),
            None => self,
        }
    }
}

/// Parse a broker date (`YYYY-MM-DD`) and time (`HH.MM.SS` or `HH:MM:SS`)
/// in the broker's local clock and return the seconds elapsed until `now`.
/// Blank or malformed input yields `None`; future instants yield 0.
pub fn time_since(date: &str, time: &str, tz_offset_secs: i64, now: DateTime<Utc>) -> Option<i64> {
    let date = date.trim();
    let time = time.trim().replace(':', ".");
    if date.is_empty() || time.is_empty() {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H.%M.%S").ok()?;
    let instant = naive.and_utc() - ChronoDuration::seconds(tz_offset_secs);
    Some((now - instant).num_seconds().max(0))
}

/// Registry state for one object class within a session
#[derive(Debug, Clone)]
pub struct ObjectStatus {
    init: bool,
    seen: HashSet<String>,
    set: StatusSet,
}

impl ObjectStatus {
    pub fn new(class: ObjectClass) -> Self {
        Self {
            init: false,
            seen: HashSet::new(),
            set: StatusSet::new(class),
        }
    }

    /// Populate the attribute table once. Returns whether work was done.
    pub fn init(&mut self, platform: i32) -> bool {
        if self.init {
            return false;
        }
        for (name, attr) in attribute_table(self.set.class(), platform) {
            self.set.insert(name, attr);
        }
        self.init = true;
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.init
    }

    pub fn status_set(&self) -> &StatusSet {
        &self.set
    }

    pub(crate) fn status_set_mut(&mut self) -> &mut StatusSet {
        &mut self.set
    }

    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    /// Start a pass: drop values and seen keys, keep baselines
    pub(crate) fn begin_pass(&mut self) {
        self.set.clear_values();
        self.seen.clear();
    }

    /// Store the parser's values under the row key, then apply every
    /// integer parameter under the same key
    pub(crate) fn record(&mut self, row: Row, params: &[PcfParameter]) {
        for (attr, value) in row.values {
            self.set.set_value(attr, &row.key, value);
        }
        for param in params {
            self.set.apply_parameter(&row.key, param);
        }
        self.seen.insert(row.key);
    }

    pub(crate) fn mark_seen(&mut self, key: &str) {
        self.seen.insert(key.to_string());
    }

    /// Forget baselines of instances absent from the last pass
    pub(crate) fn prune(&mut self) {
        self.set.prune(&self.seen);
    }
}

/// Fixed attribute table of a class
pub fn attribute_table(class: ObjectClass, platform: i32) -> Vec<(&'static str, StatusAttribute)> {
    match class {
        ObjectClass::Queue => queue::attributes(platform),
        ObjectClass::Channel => channel::attributes(platform),
        ObjectClass::AmqpChannel => channel::amqp_attributes(),
        ObjectClass::MqttChannel => channel::mqtt_attributes(),
        ObjectClass::Topic => topic::attributes(),
        ObjectClass::Subscription => subscription::attributes(),
        ObjectClass::QueueManager => qmgr::attributes(),
        ObjectClass::Cluster => cluster::attributes(),
        ObjectClass::UsageBufferPool => usage::buffer_pool_attributes(),
        ObjectClass::UsagePageSet => usage::page_set_attributes(),
    }
}

/// Identity scan over one reply's parameters
pub fn identify(class: ObjectClass, params: &[PcfParameter], ctx: &ParseContext) -> Option<Row> {
    match class {
        ObjectClass::Queue => queue::identify(params, ctx),
        ObjectClass::Channel => channel::identify(params, ctx),
        ObjectClass::AmqpChannel => channel::identify_amqp(params, ctx),
        ObjectClass::MqttChannel => channel::identify_mqtt(params, ctx),
        ObjectClass::Topic => topic::identify(params, ctx),
        ObjectClass::Subscription => subscription::identify(params, ctx),
        ObjectClass::QueueManager => qmgr::identify(params, ctx),
        ObjectClass::Cluster => cluster::identify(params, ctx),
        ObjectClass::UsageBufferPool => usage::identify_buffer_pool(params, ctx),
        ObjectClass::UsagePageSet => usage::identify_page_set(params, ctx),
    }
}

/// Convert a stored reading into the exported number.
/// Special attributes keep their sign; everything else is clamped at 0.
/// Microsecond readings become seconds.
pub fn normalize(attr: &StatusAttribute, raw: i64) -> f64 {
    let value = if attr.special || raw >= 0 { raw } else { 0 };
    if attr.microseconds && value > 0 {
        value as f64 / 1_000_000.0
    } else {
        value as f64
    }
}

/// Hex rendering of a byte identifier
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_class_round_trip_names() {
        for class in ObjectClass::ALL {
            assert_eq!(class.as_str().parse::<ObjectClass>(), Ok(class));
        }
        assert_eq!("AMQP-Channel".parse::<ObjectClass>(), Ok(ObjectClass::AmqpChannel));
        assert!("widget".parse::<ObjectClass>().is_err());
    }

    #[test]
    fn test_platform_support() {
        assert!(ObjectClass::UsagePageSet.supported_on(MQPL_ZOS));
        assert!(!ObjectClass::UsagePageSet.supported_on(MQPL_UNIX));
        assert!(!ObjectClass::MqttChannel.supported_on(MQPL_ZOS));
        assert!(ObjectClass::Queue.supported_on(MQPL_ZOS));
    }

    #[test]
    fn test_init_runs_once() {
        let mut status = ObjectStatus::new(ObjectClass::Queue);
        assert!(!status.is_initialized());
        assert!(status.init(MQPL_UNIX));
        let count = status.status_set().len();
        assert!(count > 0);
        assert!(!status.init(MQPL_UNIX));
        assert_eq!(status.status_set().len(), count);
    }

    #[test]
    fn test_every_table_indexes_its_codes() {
        for class in ObjectClass::ALL {
            let mut status = ObjectStatus::new(class);
            status.init(MQPL_UNIX);
            let set = status.status_set();
            for (name, attr) in set.attributes() {
                if let Some(code) = attr.code {
                    assert!(
                        set.attributes_for_code(code).contains(name),
                        "{class}: {name} missing from code index"
                    );
                }
            }
        }
    }

    #[test]
    fn test_time_since() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(time_since("2024-03-01", "11.59.00", 0, now), Some(60));
        assert_eq!(time_since("2024-03-01", "11:00:00", 0, now), Some(3600));
        // Broker clock one hour ahead of UTC
        assert_eq!(time_since("2024-03-01", "12.59.00", 3600, now), Some(60));
        assert_eq!(time_since("2024-03-01", "13.00.00", 0, now), Some(0));
        assert_eq!(time_since("", "", 0, now), None);
        assert_eq!(time_since("garbage", "12.00.00", 0, now), None);
    }

    #[test]
    fn test_normalize() {
        let plain = StatusAttribute::new("depth", "Depth", MQIA_CURRENT_Q_DEPTH);
        assert_eq!(normalize(&plain, -3), 0.0);
        assert_eq!(normalize(&plain, 12), 12.0);

        let special = StatusAttribute::new("age", "Age", MQIACF_OLDEST_MSG_AGE).special();
        assert_eq!(normalize(&special, -1), -1.0);

        let micro = StatusAttribute::new("qtime", "Qtime", MQIACF_Q_TIME_INDICATOR)
            .indexed(0)
            .special()
            .microseconds();
        assert_eq!(normalize(&micro, 2_500_000), 2.5);
        assert_eq!(normalize(&micro, -1), -1.0);
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0x41, 0x00, 0xff]), "4100FF");
    }

    proptest! {
        #[test]
        fn normalize_non_special_never_negative(raw in any::<i64>()) {
            let attr = StatusAttribute::new("x", "X", 1);
            prop_assert!(normalize(&attr, raw) >= 0.0);
        }
    }
}
