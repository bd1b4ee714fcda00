//! Attribute descriptors and the per-class value store
//!
//! A [`StatusSet`] owns every attribute of one object class. Integer
//! parameters from a reply are folded in through [`StatusSet::apply_parameter`],
//! which finds the attributes for the parameter's field code through an
//! index built when the table is populated.

use super::squash::Squash;
use super::{ObjectClass, StatusValue};
use crate::protocol::PcfParameter;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Descriptor and live values of one attribute of one object class
#[derive(Debug, Clone, PartialEq)]
pub struct StatusAttribute {
    pub metric_name: String,
    pub description: String,
    /// Field code in replies. Absent for identity fields and values the
    /// collector derives itself.
    pub code: Option<i32>,
    /// Cumulative counter reported as an interval difference
    pub delta: bool,
    pub squash: Option<Squash>,
    /// Element of an integer-list field, -1 for scalar fields
    pub index: i32,
    /// Negative readings carry meaning (typically -1 for "not available")
    pub special: bool,
    /// Reading is in microseconds and is normalized to seconds
    pub microseconds: bool,
    pub values: HashMap<String, StatusValue>,
    prev_values: HashMap<String, i64>,
}

impl StatusAttribute {
    pub fn new(metric_name: &str, description: &str, code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::pseudo(metric_name, description)
        }
    }

    /// Attribute filled by the class parser rather than from a field code
    pub fn pseudo(metric_name: &str, description: &str) -> Self {
        Self {
            metric_name: metric_name.to_string(),
            description: description.to_string(),
            code: None,
            delta: false,
            squash: None,
            index: -1,
            special: false,
            microseconds: false,
            values: HashMap::new(),
            prev_values: HashMap::new(),
        }
    }

    pub fn delta(mut self) -> Self {
        self.delta = true;
        self
    }

    pub fn squashed(mut self, squash: Squash) -> Self {
        self.squash = Some(squash);
        self.special = true;
        self
    }

    pub fn indexed(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    pub fn special(mut self) -> Self {
        self.special = true;
        self
    }

    pub fn microseconds(mut self) -> Self {
        self.microseconds = true;
        self
    }

    /// Record one integer reading for an instance.
    ///
    /// Delta attributes report 0 on first sight of a key. A reading below the
    /// stored baseline reports the raw reading for that pass. The baseline is
    /// always replaced by the new reading.
    pub fn apply(&mut self, key: &str, raw: i64) {
        let value = if self.delta {
            match self.prev_values.insert(key.to_string(), raw) {
                None => 0,
                Some(prev) if raw >= prev => raw - prev,
                Some(_) => raw,
            }
        } else if let Some(squash) = self.squash {
            squash.apply(raw)
        } else if self.special {
            raw
        } else {
            raw.max(0)
        };
        self.values.insert(key.to_string(), StatusValue::Int(value));
    }

    /// Stored cumulative baseline for an instance
    pub fn prev_value(&self, key: &str) -> Option<i64> {
        self.prev_values.get(key).copied()
    }

    pub fn tracked_keys(&self) -> usize {
        self.prev_values.len()
    }

    fn prune(&mut self, seen: &HashSet<String>) {
        self.prev_values.retain(|k, _| seen.contains(k));
    }
}

/// The full attribute table of one object class
#[derive(Debug, Clone)]
pub struct StatusSet {
    class: ObjectClass,
    attributes: BTreeMap<String, StatusAttribute>,
    by_code: HashMap<i32, Vec<String>>,
}

impl StatusSet {
    pub fn new(class: ObjectClass) -> Self {
        Self {
            class,
            attributes: BTreeMap::new(),
            by_code: HashMap::new(),
        }
    }

    pub fn class(&self) -> ObjectClass {
        self.class
    }

    pub(crate) fn insert(&mut self, name: &str, attribute: StatusAttribute) {
        if let Some(code) = attribute.code {
            let names = self.by_code.entry(code).or_default();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        self.attributes.insert(name.to_string(), attribute);
    }

    pub fn attributes(&self) -> &BTreeMap<String, StatusAttribute> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&StatusAttribute> {
        self.attributes.get(name)
    }

    /// Attribute names fed by a field code
    pub fn attributes_for_code(&self, code: i32) -> &[String] {
        self.by_code.get(&code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn values(&self, name: &str) -> Option<&HashMap<String, StatusValue>> {
        self.attributes.get(name).map(|a| &a.values)
    }

    pub fn value(&self, name: &str, key: &str) -> Option<&StatusValue> {
        self.values(name).and_then(|v| v.get(key))
    }

    pub fn int_value(&self, name: &str, key: &str) -> Option<i64> {
        self.value(name, key).and_then(StatusValue::as_int)
    }

    pub fn str_value(&self, name: &str, key: &str) -> Option<&str> {
        self.value(name, key).and_then(StatusValue::as_str)
    }

    /// Instance keys that currently have at least one value
    pub fn instance_keys(&self) -> HashSet<&str> {
        self.attributes
            .values()
            .flat_map(|a| a.values.keys().map(String::as_str))
            .collect()
    }

    /// Store a value directly, bypassing delta handling.
    /// Returns false when the attribute is not part of this table.
    pub(crate) fn set_value(&mut self, name: &str, key: &str, value: StatusValue) -> bool {
        match self.attributes.get_mut(name) {
            Some(attr) => {
                attr.values.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Fold one decoded parameter into every attribute mapped to its code.
    /// Non-integer parameters are ignored. Returns how many attributes took
    /// a value.
    pub fn apply_parameter(&mut self, key: &str, param: &PcfParameter) -> usize {
        if !param.is_integer_family() {
            return 0;
        }
        let Some(names) = self.by_code.get(&param.code) else {
            return 0;
        };

        let mut applied = 0;
        for name in names {
            let Some(attr) = self.attributes.get_mut(name) else {
                continue;
            };
            let raw = if attr.index < 0 {
                param.as_int().or_else(|| param.int_at(0))
            } else {
                param.int_at(attr.index as usize)
            };
            if let Some(raw) = raw {
                attr.apply(key, raw);
                applied += 1;
            }
        }
        applied
    }

    /// Drop every live value. Baselines are kept.
    pub(crate) fn clear_values(&mut self) {
        for attr in self.attributes.values_mut() {
            attr.values.clear();
        }
    }

    /// Forget baselines for instances not seen in the last pass
    pub(crate) fn prune(&mut self, seen: &HashSet<String>) {
        for attr in self.attributes.values_mut() {
            attr.prune(seen);
        }
    }

    /// Copy of every value, attribute name to instance key to value
    pub fn snapshot(&self) -> BTreeMap<String, HashMap<String, StatusValue>> {
        self.attributes
            .iter()
            .map(|(name, attr)| (name.clone(), attr.values.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::*;
    use crate::status::squash::{SQUASH_RUNNING, SQUASH_STOPPED};
    use proptest::prelude::*;

    fn counter() -> StatusAttribute {
        StatusAttribute::new("messages", "Messages", MQIACH_MSGS).delta()
    }

    #[test]
    fn test_delta_first_sight_is_zero() {
        let mut a = counter();
        a.apply("k", 500);
        assert_eq!(a.values["k"], StatusValue::Int(0));
        assert_eq!(a.prev_value("k"), Some(500));
    }

    #[test]
    fn test_delta_wraparound_reports_raw() {
        let mut a = counter();
        for (raw, expected) in [(100, 0), (150, 50), (30, 30), (45, 15)] {
            a.apply("k", raw);
            assert_eq!(a.values["k"], StatusValue::Int(expected), "raw {raw}");
        }
        assert_eq!(a.prev_value("k"), Some(45));
    }

    #[test]
    fn test_non_delta_clamped() {
        let mut a = StatusAttribute::new("depth", "Depth", MQIA_CURRENT_Q_DEPTH);
        a.apply("Q1", -5);
        assert_eq!(a.values["Q1"], StatusValue::Int(0));
        assert_eq!(a.tracked_keys(), 0);
    }

    #[test]
    fn test_special_keeps_negative() {
        let mut a = StatusAttribute::new("age", "Oldest message age", MQIACF_OLDEST_MSG_AGE).special();
        a.apply("Q1", -1);
        assert_eq!(a.values["Q1"], StatusValue::Int(-1));
    }

    #[test]
    fn test_shared_code_feeds_raw_and_squashed() {
        let mut set = StatusSet::new(ObjectClass::Channel);
        set.insert(
            "status",
            StatusAttribute::new("status", "Status", MQIACH_CHANNEL_STATUS),
        );
        set.insert(
            "status_squash",
            StatusAttribute::new("status_squash", "Status", MQIACH_CHANNEL_STATUS)
                .squashed(Squash::ChannelStatus),
        );
        assert_eq!(set.attributes_for_code(MQIACH_CHANNEL_STATUS).len(), 2);

        let applied = set.apply_parameter("C1", &PcfParameter::int(MQIACH_CHANNEL_STATUS, MQCHS_RUNNING));
        assert_eq!(applied, 2);
        assert_eq!(set.int_value("status", "C1"), Some(MQCHS_RUNNING as i64));
        assert_eq!(set.int_value("status_squash", "C1"), Some(SQUASH_RUNNING));

        set.apply_parameter("C2", &PcfParameter::int(MQIACH_CHANNEL_STATUS, 999));
        assert_eq!(set.int_value("status_squash", "C2"), Some(SQUASH_STOPPED));
    }

    #[test]
    fn test_indexed_pair_not_swapped() {
        let mut set = StatusSet::new(ObjectClass::Queue);
        set.insert(
            "qtime_short",
            StatusAttribute::new("qtime_short", "Short", MQIACF_Q_TIME_INDICATOR).indexed(0),
        );
        set.insert(
            "qtime_long",
            StatusAttribute::new("qtime_long", "Long", MQIACF_Q_TIME_INDICATOR).indexed(1),
        );
        set.apply_parameter("Q", &PcfParameter::int_list(MQIACF_Q_TIME_INDICATOR, &[7, 42]));
        assert_eq!(set.int_value("qtime_short", "Q"), Some(7));
        assert_eq!(set.int_value("qtime_long", "Q"), Some(42));
    }

    #[test]
    fn test_strings_and_unknown_codes_ignored() {
        let mut set = StatusSet::new(ObjectClass::Queue);
        set.insert("depth", StatusAttribute::new("depth", "Depth", MQIA_CURRENT_Q_DEPTH));
        assert_eq!(set.apply_parameter("Q", &PcfParameter::string(MQIA_CURRENT_Q_DEPTH, "5")), 0);
        assert_eq!(set.apply_parameter("Q", &PcfParameter::int(MQIA_MAX_Q_DEPTH, 5)), 0);
        assert!(set.values("depth").unwrap().is_empty());
    }

    #[test]
    fn test_clear_keeps_baselines_and_prune_drops_them() {
        let mut set = StatusSet::new(ObjectClass::Channel);
        set.insert("messages", counter());
        set.apply_parameter("A", &PcfParameter::int(MQIACH_MSGS, 10));
        set.apply_parameter("B", &PcfParameter::int(MQIACH_MSGS, 20));
        set.clear_values();
        assert!(set.values("messages").unwrap().is_empty());
        assert_eq!(set.attribute("messages").unwrap().tracked_keys(), 2);

        let seen: HashSet<String> = ["A".to_string()].into_iter().collect();
        set.prune(&seen);
        let attr = set.attribute("messages").unwrap();
        assert_eq!(attr.prev_value("A"), Some(10));
        assert_eq!(attr.prev_value("B"), None);
    }

    proptest! {
        #[test]
        fn delta_sequence_matches_differences(readings in proptest::collection::vec(0i64..1_000_000, 1..40)) {
            let mut a = counter();
            let mut prev: Option<i64> = None;
            for raw in readings {
                a.apply("k", raw);
                let expected = match prev {
                    None => 0,
                    Some(p) if raw >= p => raw - p,
                    Some(_) => raw,
                };
                prop_assert_eq!(a.values["k"].as_int(), Some(expected));
                prop_assert!(expected >= 0);
                prev = Some(raw);
            }
        }

        #[test]
        fn non_delta_never_negative(raw in any::<i32>()) {
            let mut a = StatusAttribute::new("depth", "Depth", MQIA_CURRENT_Q_DEPTH);
            a.apply("k", raw as i64);
            prop_assert!(a.values["k"].as_int().unwrap() >= 0);
        }
    }
}
