//! Cached object definitions
//!
//! Definitional attributes (description, maximum depth, maximum channel
//! instances) change rarely and are not part of status replies. They are
//! fetched with separate inquire requests on a slower schedule and merged
//! into the freshly polled rows by object name.

use super::patterns::PatternList;
use crate::protocol::constants::*;
use crate::protocol::PcfMessage;
use crate::status::channel::{
    self, ATTR_CHL_CONNNAME, ATTR_CHL_JOBNAME, ATTR_CHL_MAX_INST, ATTR_CHL_MAX_INSTC,
    ATTR_CHL_NAME, ATTR_CHL_RQMNAME, ATTR_CHL_STATUS, ATTR_CHL_STATUS_SQUASH, ATTR_CHL_TYPE,
};
use crate::status::queue::{ATTR_Q_DESC, ATTR_Q_MAX_DEPTH, ATTR_Q_USAGE};
use crate::status::{ObjectClass, ObjectStatus, StatusValue, SQUASH_STOPPED};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

/// Definitional attributes of one named object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjInfo {
    pub description: String,
    pub max_depth: Option<i64>,
    pub usage: Option<i64>,
    pub channel_type: Option<i64>,
    pub max_instances: Option<i64>,
    pub max_inst_per_client: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ObjInfoCache {
    queues: BTreeMap<String, ObjInfo>,
    channels: BTreeMap<String, ObjInfo>,
    refreshed: BTreeMap<ObjectClass, Instant>,
    interval: Duration,
}

impl ObjInfoCache {
    pub fn new(interval: Duration) -> Self {
        Self {
            queues: BTreeMap::new(),
            channels: BTreeMap::new(),
            refreshed: BTreeMap::new(),
            interval,
        }
    }

    /// Never refreshed for this class, or the last refresh is older than
    /// the interval
    pub fn is_due(&self, class: ObjectClass) -> bool {
        match self.refreshed.get(&class) {
            None => true,
            Some(at) => at.elapsed() >= self.interval,
        }
    }

    pub(crate) fn mark_refreshed(&mut self, class: ObjectClass) {
        self.refreshed.insert(class, Instant::now());
    }

    pub fn queue(&self, name: &str) -> Option<&ObjInfo> {
        self.queues.get(name)
    }

    pub fn channel(&self, name: &str) -> Option<&ObjInfo> {
        self.channels.get(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub(crate) fn clear_queues(&mut self) {
        self.queues.clear();
    }

    pub(crate) fn clear_channels(&mut self) {
        self.channels.clear();
    }

    /// Take over every definition held by another cache
    pub(crate) fn absorb_all(&mut self, other: ObjInfoCache) {
        self.queues.extend(other.queues);
        self.channels.extend(other.channels);
    }

    /// Take one queue definition reply
    pub(crate) fn absorb_queue(&mut self, msg: &PcfMessage) {
        let Some(name) = msg.find_str(MQCA_Q_NAME).filter(|n| !n.is_empty()) else {
            return;
        };
        let info = ObjInfo {
            description: msg.find_str(MQCA_Q_DESC).unwrap_or_default().to_string(),
            max_depth: msg.find_int(MQIA_MAX_Q_DEPTH),
            usage: msg.find_int(MQIA_USAGE),
            ..ObjInfo::default()
        };
        self.queues.insert(name.to_string(), info);
    }

    /// Take one channel definition reply
    pub(crate) fn absorb_channel(&mut self, msg: &PcfMessage) {
        let Some(name) = msg.find_str(MQCACH_CHANNEL_NAME).filter(|n| !n.is_empty()) else {
            return;
        };
        let info = ObjInfo {
            description: msg.find_str(MQCACH_DESC).unwrap_or_default().to_string(),
            channel_type: msg.find_int(MQIACH_CHANNEL_TYPE),
            max_instances: msg.find_int(MQIACH_MAX_INSTANCES),
            max_inst_per_client: msg.find_int(MQIACH_MAX_INSTS_PER_CLIENT),
            ..ObjInfo::default()
        };
        self.channels.insert(name.to_string(), info);
    }

    /// Copy queue definitions onto every queue row of the pass
    pub(crate) fn merge_queues(&self, status: &mut ObjectStatus) {
        let keys: Vec<String> = status.seen().iter().cloned().collect();
        let set = status.status_set_mut();
        for key in keys {
            let Some(info) = self.queues.get(&key) else { continue };
            set.set_value(ATTR_Q_DESC, &key, StatusValue::Str(info.description.clone()));
            if let Some(depth) = info.max_depth {
                set.set_value(ATTR_Q_MAX_DEPTH, &key, StatusValue::Int(depth));
            }
            if let Some(usage) = info.usage {
                set.set_value(ATTR_Q_USAGE, &key, StatusValue::Int(usage));
            }
        }
    }

    /// Copy channel instance limits onto every channel row of the pass
    pub(crate) fn merge_channels(&self, status: &mut ObjectStatus) {
        let keys: Vec<String> = status.seen().iter().cloned().collect();
        let set = status.status_set_mut();
        for key in keys {
            let Some(info) = self.channels.get(channel::name_from_key(&key)) else {
                continue;
            };
            if let Some(max) = info.max_instances {
                set.set_value(ATTR_CHL_MAX_INST, &key, StatusValue::Int(max));
            }
            if let Some(max) = info.max_inst_per_client {
                set.set_value(ATTR_CHL_MAX_INSTC, &key, StatusValue::Int(max));
            }
        }
    }

    /// Synthesize a stopped row for each defined channel matching the
    /// patterns that has no running instance. Client-connection
    /// definitions never run on the queue manager and are skipped.
    pub(crate) fn add_inactive_channels(&self, status: &mut ObjectStatus, patterns: &PatternList) -> usize {
        let running: HashSet<String> = status
            .seen()
            .iter()
            .map(|k| channel::name_from_key(k).to_string())
            .collect();

        let mut added = 0;
        for (name, info) in &self.channels {
            if running.contains(name) || !patterns.matches(name) {
                continue;
            }
            if info.channel_type == Some(MQCHT_CLNTCONN as i64) {
                continue;
            }

            let key = channel::inactive_key(name);
            let set = status.status_set_mut();
            set.set_value(ATTR_CHL_NAME, &key, StatusValue::Str(name.clone()));
            for blank in [ATTR_CHL_CONNNAME, ATTR_CHL_JOBNAME, ATTR_CHL_RQMNAME] {
                set.set_value(blank, &key, StatusValue::Str(String::new()));
            }
            set.set_value(ATTR_CHL_STATUS, &key, StatusValue::Int(MQCHS_INACTIVE as i64));
            set.set_value(ATTR_CHL_STATUS_SQUASH, &key, StatusValue::Int(SQUASH_STOPPED));
            if let Some(t) = info.channel_type {
                set.set_value(ATTR_CHL_TYPE, &key, StatusValue::Int(t));
            }
            if let Some(max) = info.max_instances {
                set.set_value(ATTR_CHL_MAX_INST, &key, StatusValue::Int(max));
            }
            if let Some(max) = info.max_inst_per_client {
                set.set_value(ATTR_CHL_MAX_INSTC, &key, StatusValue::Int(max));
            }
            status.mark_seen(&key);
            added += 1;
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PcfHeader, PcfParameter};
    use crate::status::ParseContext;

    fn reply(parameters: Vec<PcfParameter>) -> PcfMessage {
        PcfMessage {
            header: PcfHeader::command(MQCMD_INQUIRE_CHANNEL),
            parameters,
        }
    }

    fn channel_def(name: &str, kind: i32) -> PcfMessage {
        reply(vec![
            PcfParameter::string(MQCACH_CHANNEL_NAME, name),
            PcfParameter::int(MQIACH_CHANNEL_TYPE, kind),
            PcfParameter::int(MQIACH_MAX_INSTANCES, 999),
        ])
    }

    fn channels() -> ObjectStatus {
        let mut status = ObjectStatus::new(ObjectClass::Channel);
        status.init(MQPL_UNIX);
        status
    }

    #[test]
    fn test_due_until_refreshed() {
        let mut cache = ObjInfoCache::new(Duration::from_secs(3600));
        assert!(cache.is_due(ObjectClass::Queue));
        cache.mark_refreshed(ObjectClass::Queue);
        assert!(!cache.is_due(ObjectClass::Queue));
        assert!(cache.is_due(ObjectClass::Channel));
        let mut zero = ObjInfoCache::new(Duration::ZERO);
        zero.mark_refreshed(ObjectClass::Channel);
        assert!(zero.is_due(ObjectClass::Channel));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_follows_the_runtime_clock() {
        let mut cache = ObjInfoCache::new(Duration::from_secs(60));
        cache.mark_refreshed(ObjectClass::Queue);
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!cache.is_due(ObjectClass::Queue));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.is_due(ObjectClass::Queue));
    }

    #[test]
    fn test_inactive_rows_for_idle_definitions() {
        let mut cache = ObjInfoCache::new(Duration::from_secs(60));
        cache.absorb_channel(&channel_def("TO.QM2", MQCHT_SENDER));
        cache.absorb_channel(&channel_def("APP.SVRCONN", MQCHT_SVRCONN));
        cache.absorb_channel(&channel_def("APP.CLNTCONN", MQCHT_CLNTCONN));

        let mut status = channels();
        let running = vec![
            PcfParameter::string(MQCACH_CHANNEL_NAME, "APP.SVRCONN"),
            PcfParameter::string(MQCACH_CONNECTION_NAME, "10.0.0.1"),
            PcfParameter::int(MQIACH_CHANNEL_STATUS, MQCHS_RUNNING),
        ];
        let row = channel::identify(&running, &ParseContext::new(MQPL_UNIX)).unwrap();
        status.record(row, &running);

        let added = cache.add_inactive_channels(&mut status, &PatternList::parse("*"));
        assert_eq!(added, 1);

        let set = status.status_set();
        let key = channel::inactive_key("TO.QM2");
        assert!(status.seen().contains(&key));
        assert_eq!(set.int_value(ATTR_CHL_STATUS, &key), Some(MQCHS_INACTIVE as i64));
        assert_eq!(set.int_value(ATTR_CHL_STATUS_SQUASH, &key), Some(SQUASH_STOPPED));
        assert_eq!(set.str_value(ATTR_CHL_CONNNAME, &key), Some(""));
        assert!(set.value(ATTR_CHL_STATUS, &channel::inactive_key("APP.CLNTCONN")).is_none());
    }

    #[test]
    fn test_merge_channel_limits_by_name() {
        let mut cache = ObjInfoCache::new(Duration::from_secs(60));
        cache.absorb_channel(&channel_def("APP.SVRCONN", MQCHT_SVRCONN));
        let mut status = channels();
        let params = vec![
            PcfParameter::string(MQCACH_CHANNEL_NAME, "APP.SVRCONN"),
            PcfParameter::string(MQCACH_CONNECTION_NAME, "10.0.0.1"),
        ];
        let row = channel::identify(&params, &ParseContext::new(MQPL_UNIX)).unwrap();
        let key = row.key.clone();
        status.record(row, &params);
        cache.merge_channels(&mut status);
        assert_eq!(status.status_set().int_value(ATTR_CHL_MAX_INST, &key), Some(999));
    }

    #[test]
    fn test_merge_queue_definitions() {
        let mut cache = ObjInfoCache::new(Duration::from_secs(60));
        cache.absorb_queue(&reply(vec![
            PcfParameter::string(MQCA_Q_NAME, "APP.IN"),
            PcfParameter::string(MQCA_Q_DESC, "Inbound orders"),
            PcfParameter::int(MQIA_MAX_Q_DEPTH, 5000),
            PcfParameter::int(MQIA_USAGE, MQUS_NORMAL),
        ]));

        let mut status = ObjectStatus::new(ObjectClass::Queue);
        status.init(MQPL_UNIX);
        status.mark_seen("APP.IN");
        cache.merge_queues(&mut status);
        let set = status.status_set();
        assert_eq!(set.str_value(ATTR_Q_DESC, "APP.IN"), Some("Inbound orders"));
        assert_eq!(set.int_value(ATTR_Q_MAX_DEPTH, "APP.IN"), Some(5000));
    }
}
