//! Subscription status attributes, keyed by subscription identifier

use super::{hex, ParseContext, Row, StatusAttribute};
use crate::protocol::constants::*;
use crate::protocol::{PcfParameter, PcfValue};

pub const ATTR_SUB_ID: &str = "subid";
pub const ATTR_SUB_NAME: &str = "name";
pub const ATTR_SUB_TOPIC: &str = "topic";
pub const ATTR_SUB_TYPE: &str = "type";
pub const ATTR_SUB_DURABLE: &str = "durable";
pub const ATTR_SUB_MESSAGES: &str = "messages_received";
pub const ATTR_SUB_SINCE_PUB: &str = "time_since_message_published";

pub fn attributes() -> Vec<(&'static str, StatusAttribute)> {
    vec![
        (ATTR_SUB_ID, StatusAttribute::pseudo("subid", "Subscription Id")),
        (ATTR_SUB_NAME, StatusAttribute::pseudo("name", "Subscription Name")),
        (ATTR_SUB_TOPIC, StatusAttribute::pseudo("topic", "Topic String")),
        (
            ATTR_SUB_TYPE,
            StatusAttribute::new("type", "Subscription Type", MQIACF_SUB_TYPE),
        ),
        (
            ATTR_SUB_DURABLE,
            StatusAttribute::new("durable", "Durable Subscription", MQIACF_DURABLE_SUBSCRIPTION),
        ),
        (
            ATTR_SUB_MESSAGES,
            StatusAttribute::new("messages_received", "Messages Received", MQIACF_MESSAGE_COUNT).delta(),
        ),
        (
            ATTR_SUB_SINCE_PUB,
            StatusAttribute::pseudo("time_since_message_published", "Time Since Message Published"),
        ),
    ]
}

pub fn identify(params: &[PcfParameter], ctx: &ParseContext) -> Option<Row> {
    let mut id = None;
    let (mut name, mut topic) = ("", "");
    let (mut msg_date, mut msg_time) = (None, None);

    for p in params {
        match (&p.value, p.code) {
            (PcfValue::Bytes(b), MQBACF_SUB_ID) => id = Some(hex(b)),
            (PcfValue::Str(s), MQCACF_SUB_NAME) => name = s.as_str(),
            (PcfValue::Str(s), MQCA_TOPIC_STRING) => topic = s.as_str(),
            (PcfValue::Str(s), MQCACF_LAST_MSG_DATE) => msg_date = Some(s.as_str()),
            (PcfValue::Str(s), MQCACF_LAST_MSG_TIME) => msg_time = Some(s.as_str()),
            _ => {}
        }
    }

    let id = id.filter(|i| !i.is_empty())?;
    Some(
        Row::new(name, id.clone())
            .with_str(ATTR_SUB_ID, &id)
            .with_str(ATTR_SUB_NAME, name)
            .with_str(ATTR_SUB_TOPIC, topic)
            .with_opt_int(ATTR_SUB_SINCE_PUB, ctx.seconds_since(msg_date, msg_time)),
    )
}
