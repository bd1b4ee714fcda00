//! Resource-statistics metadata and published values
//!
//! The broker describes its statistics in three levels of retained
//! metadata publications. The CLASSES publication lists classes (CPU, DISK,
//! STATQ, ...) and where to find each class's types; each TYPES publication
//! lists the types of one class and where to find their elements; each
//! element publication lists the elements of one type with their datatype,
//! plus the data topic carrying their values.
//!
//! Data publications carry the class and type ids, an optional object name,
//! and one integer parameter per element whose code is the element id.

use crate::naming;
use crate::protocol::constants::*;
use crate::protocol::{PcfMessage, PcfParameter, PcfValue};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Object key used for values that are not object-specific
pub const QMGR_OBJECT_KEY: &str = "@self";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorElement {
    pub id: i32,
    pub description: String,
    pub datatype: i32,
    pub metric_name: String,
    /// Normalized value per object name
    pub values: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorType {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Topic of the element metadata publication
    pub elements_topic: String,
    /// Data topic template, `%s` placeholders for queue manager and object
    pub data_topic: String,
    /// One data topic per monitored object rather than one per queue manager
    pub object_specific: bool,
    pub elements: BTreeMap<i32, MonitorElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorClass {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub types_topic: String,
    pub types: BTreeMap<i32, MonitorType>,
}

/// Everything learned from the metadata publications, plus live values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublicationCatalog {
    pub classes: BTreeMap<i32, MonitorClass>,
}

fn int_field(params: &[PcfParameter], code: i32) -> Option<i64> {
    params.iter().find(|p| p.code == code).and_then(PcfParameter::as_int)
}

fn str_field(params: &[PcfParameter], code: i32) -> String {
    params
        .iter()
        .find(|p| p.code == code)
        .and_then(PcfParameter::as_str)
        .unwrap_or_default()
        .to_string()
}

fn groups(params: &[PcfParameter], code: i32) -> impl Iterator<Item = &[PcfParameter]> {
    params.iter().filter_map(move |p| match &p.value {
        PcfValue::Group(children) if p.code == code => Some(children.as_slice()),
        _ => None,
    })
}

/// Convert a published reading into base units
pub fn normalize_published(datatype: i32, raw: i64) -> f64 {
    let v = raw as f64;
    match datatype {
        MQIAMO_MONITOR_PERCENT | MQIAMO_MONITOR_HUNDREDTHS => v / 100.0,
        MQIAMO_MONITOR_KB => v * 1024.0,
        MQIAMO_MONITOR_MB => v * 1024.0 * 1024.0,
        MQIAMO_MONITOR_GB => v * 1024.0 * 1024.0 * 1024.0,
        MQIAMO_MONITOR_MICROSEC => v / 1_000_000.0,
        _ => v,
    }
}

impl PublicationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Take the CLASSES publication. Returns the types topics to read next.
    pub fn absorb_classes(&mut self, msg: &PcfMessage) -> Vec<String> {
        let mut topics = Vec::new();
        for g in groups(&msg.parameters, MQGACF_MONITOR_CLASS) {
            let Some(id) = int_field(g, MQIAMO_MONITOR_CLASS) else { continue };
            let class = MonitorClass {
                id: id as i32,
                name: str_field(g, MQCAMO_MONITOR_CLASS),
                description: str_field(g, MQCAMO_MONITOR_DESC),
                types_topic: str_field(g, MQCA_TOPIC_STRING),
                types: BTreeMap::new(),
            };
            if !class.types_topic.is_empty() {
                topics.push(class.types_topic.clone());
            }
            self.classes.insert(class.id, class);
        }
        topics
    }

    /// Take one TYPES publication. Returns the element topics to read next.
    pub fn absorb_types(&mut self, msg: &PcfMessage) -> Vec<String> {
        let Some(class_id) = int_field(&msg.parameters, MQIAMO_MONITOR_CLASS) else {
            return Vec::new();
        };
        let Some(class) = self.classes.get_mut(&(class_id as i32)) else {
            debug!(class_id, "Types publication for an unknown class");
            return Vec::new();
        };

        let mut topics = Vec::new();
        for g in groups(&msg.parameters, MQGACF_MONITOR_TYPE) {
            let Some(id) = int_field(g, MQIAMO_MONITOR_TYPE) else { continue };
            let ty = MonitorType {
                id: id as i32,
                name: str_field(g, MQCAMO_MONITOR_TYPE),
                description: str_field(g, MQCAMO_MONITOR_DESC),
                elements_topic: str_field(g, MQCA_TOPIC_STRING),
                data_topic: String::new(),
                object_specific: false,
                elements: BTreeMap::new(),
            };
            if !ty.elements_topic.is_empty() {
                topics.push(ty.elements_topic.clone());
            }
            class.types.insert(ty.id, ty);
        }
        topics
    }

    /// Take one element publication, naming each element in the
    /// process-wide naming mode
    pub fn absorb_elements(&mut self, msg: &PcfMessage) -> bool {
        let params = &msg.parameters;
        let (Some(class_id), Some(type_id)) = (
            int_field(params, MQIAMO_MONITOR_CLASS),
            int_field(params, MQIAMO_MONITOR_TYPE),
        ) else {
            return false;
        };
        let Some(class) = self.classes.get_mut(&(class_id as i32)) else {
            return false;
        };
        let class_name = class.name.clone();
        let Some(ty) = class.types.get_mut(&(type_id as i32)) else {
            return false;
        };

        ty.data_topic = str_field(params, MQCA_TOPIC_STRING);
        let flags = int_field(params, MQIAMO_MONITOR_FLAGS).unwrap_or(0) as i32;
        ty.object_specific = (flags & MQIAMO_MONITOR_FLAGS_OBJNAME) != 0;

        for g in groups(params, MQGACF_MONITOR_ELEMENT) {
            let Some(id) = int_field(g, MQIAMO_MONITOR_ELEMENT) else { continue };
            let datatype = int_field(g, MQIAMO_MONITOR_DATATYPE).unwrap_or(MQIAMO_MONITOR_UNIT as i64) as i32;
            let description = str_field(g, MQCAMO_MONITOR_DESC);
            let key = naming::element_key(&class_name, &ty.name, &description);
            let element = MonitorElement {
                id: id as i32,
                metric_name: naming::metric_name(&key, &description, datatype),
                description,
                datatype,
                values: HashMap::new(),
            };
            ty.elements.insert(element.id, element);
        }
        true
    }

    /// Every known type, with its class
    pub fn types(&self) -> impl Iterator<Item = (&MonitorClass, &MonitorType)> {
        self.classes
            .values()
            .flat_map(|c| c.types.values().map(move |t| (c, t)))
    }

    pub fn element(&self, class: i32, ty: i32, element: i32) -> Option<&MonitorElement> {
        self.classes.get(&class)?.types.get(&ty)?.elements.get(&element)
    }

    /// Look an element up by class, type and element names
    pub fn element_by_name(&self, class: &str, ty: &str, metric_name: &str) -> Option<&MonitorElement> {
        self.classes
            .values()
            .find(|c| c.name == class)?
            .types
            .values()
            .find(|t| t.name == ty)?
            .elements
            .values()
            .find(|e| e.metric_name == metric_name)
    }

    /// Fold one data publication into the element values.
    /// Returns how many elements took a value.
    pub fn apply_data(&mut self, msg: &PcfMessage) -> usize {
        let params = &msg.parameters;
        let (Some(class_id), Some(type_id)) = (
            int_field(params, MQIAMO_MONITOR_CLASS),
            int_field(params, MQIAMO_MONITOR_TYPE),
        ) else {
            return 0;
        };
        let Some(ty) = self
            .classes
            .get_mut(&(class_id as i32))
            .and_then(|c| c.types.get_mut(&(type_id as i32)))
        else {
            return 0;
        };

        let object = params
            .iter()
            .find(|p| p.code == MQCA_Q_NAME)
            .and_then(PcfParameter::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(QMGR_OBJECT_KEY)
            .to_string();

        let mut applied = 0;
        for p in params.iter().filter(|p| p.is_integer_family()) {
            let Some(element) = ty.elements.get_mut(&p.code) else { continue };
            let Some(raw) = p.as_int() else { continue };
            let value = normalize_published(element.datatype, raw);
            if element.datatype == MQIAMO_MONITOR_DELTA {
                // Several intervals may arrive between drains
                *element.values.entry(object.clone()).or_insert(0.0) += value;
            } else {
                element.values.insert(object.clone(), value);
            }
            applied += 1;
        }
        applied
    }

    /// Move every stored value out, leaving the metadata with no values.
    /// Keys are (class, type, element) ids.
    pub fn take_values(&mut self) -> BTreeMap<(i32, i32, i32), HashMap<String, f64>> {
        let mut out = BTreeMap::new();
        for class in self.classes.values_mut() {
            for ty in class.types.values_mut() {
                for element in ty.elements.values_mut() {
                    if !element.values.is_empty() {
                        out.insert((class.id, ty.id, element.id), std::mem::take(&mut element.values));
                    }
                }
            }
        }
        out
    }

    /// Drop every stored value, keeping the metadata
    pub fn clear_values(&mut self) {
        for class in self.classes.values_mut() {
            for ty in class.types.values_mut() {
                for element in ty.elements.values_mut() {
                    element.values.clear();
                }
            }
        }
    }
}
