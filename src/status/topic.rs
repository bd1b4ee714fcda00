//! Topic status attributes
//!
//! A topic is queried in several views (overall status, publishers,
//! subscribers). The view is part of the instance key so that rows from
//! different views of one topic never overwrite each other.

use super::{ParseContext, Row, StatusAttribute, TopicQuery};
use crate::protocol::constants::*;
use crate::protocol::{PcfParameter, PcfValue};

pub const ATTR_TOPIC_STRING: &str = "topic";
pub const ATTR_TOPIC_VIEW: &str = "view";
pub const ATTR_TOPIC_PUBLISHERS: &str = "publisher_count";
pub const ATTR_TOPIC_SUBSCRIBERS: &str = "subscriber_count";
pub const ATTR_TOPIC_SINCE_PUB: &str = "time_since_pub";
pub const ATTR_TOPIC_PUBLISHED: &str = "messages_published";
pub const ATTR_TOPIC_SINCE_MSG: &str = "time_since_msg";
pub const ATTR_TOPIC_RECEIVED: &str = "messages_received";

pub fn topic_key(topic: &str, query: TopicQuery) -> String {
    format!("{topic}[!{}!]", query.label())
}

pub fn attributes() -> Vec<(&'static str, StatusAttribute)> {
    vec![
        (ATTR_TOPIC_STRING, StatusAttribute::pseudo("topic", "Topic String")),
        (ATTR_TOPIC_VIEW, StatusAttribute::pseudo("view", "Status View")),
        (
            ATTR_TOPIC_PUBLISHERS,
            StatusAttribute::new("publisher_count", "Number of Publishers", MQIA_PUB_COUNT),
        ),
        (
            ATTR_TOPIC_SUBSCRIBERS,
            StatusAttribute::new("subscriber_count", "Number of Subscribers", MQIA_SUB_COUNT),
        ),
        (
            ATTR_TOPIC_SINCE_PUB,
            StatusAttribute::pseudo("time_since_pub", "Time Since Last Publication"),
        ),
        (
            ATTR_TOPIC_PUBLISHED,
            StatusAttribute::new("messages_published", "Published Messages", MQIACF_PUBLISH_COUNT)
                .delta(),
        ),
        (
            ATTR_TOPIC_SINCE_MSG,
            StatusAttribute::pseudo("time_since_msg", "Time Since Last Message Received"),
        ),
        (
            ATTR_TOPIC_RECEIVED,
            StatusAttribute::new("messages_received", "Received Messages", MQIACF_MESSAGE_COUNT)
                .delta(),
        ),
    ]
}

pub fn identify(params: &[PcfParameter], ctx: &ParseContext) -> Option<Row> {
    let mut topic = None;
    let (mut pub_date, mut pub_time, mut msg_date, mut msg_time) = (None, None, None, None);

    for p in params {
        let PcfValue::Str(s) = &p.value else { continue };
        match p.code {
            MQCA_TOPIC_STRING => topic = Some(s.as_str()),
            MQCACF_LAST_PUB_DATE => pub_date = Some(s.as_str()),
            MQCACF_LAST_PUB_TIME => pub_time = Some(s.as_str()),
            MQCACF_LAST_MSG_DATE => msg_date = Some(s.as_str()),
            MQCACF_LAST_MSG_TIME => msg_time = Some(s.as_str()),
            _ => {}
        }
    }

    let topic = topic.filter(|t| !t.is_empty())?;
    let query = ctx.topic_query;
    Some(
        Row::new(topic, topic_key(topic, query))
            .with_str(ATTR_TOPIC_STRING, topic)
            .with_str(ATTR_TOPIC_VIEW, query.label())
            .with_opt_int(ATTR_TOPIC_SINCE_PUB, ctx.seconds_since(pub_date, pub_time))
            .with_opt_int(ATTR_TOPIC_SINCE_MSG, ctx.seconds_since(msg_date, msg_time)),
    )
}
