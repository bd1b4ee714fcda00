//! Queue status attributes
//!
//! Rows come from queue status replies, from reset-statistics replies on
//! z/OS, and from cached queue definitions merged in after the pass.

use super::{ParseContext, Row, StatusAttribute};
use crate::protocol::constants::*;
use crate::protocol::{PcfParameter, PcfValue};

pub const ATTR_Q_NAME: &str = "name";
pub const ATTR_Q_DESC: &str = "description";
pub const ATTR_Q_DEPTH: &str = "depth";
pub const ATTR_Q_OLDEST_MSG_AGE: &str = "oldest_message_age";
pub const ATTR_Q_INPUT_HANDLES: &str = "input_handles";
pub const ATTR_Q_OUTPUT_HANDLES: &str = "output_handles";
pub const ATTR_Q_QTIME_SHORT: &str = "qtime_short";
pub const ATTR_Q_QTIME_LONG: &str = "qtime_long";
pub const ATTR_Q_SINCE_PUT: &str = "time_since_put";
pub const ATTR_Q_SINCE_GET: &str = "time_since_get";
pub const ATTR_Q_UNCOMMITTED: &str = "uncommitted_messages";
pub const ATTR_Q_FILE_SIZE: &str = "qfile_current_size";
pub const ATTR_Q_FILE_MAX_SIZE: &str = "qfile_max_size";
pub const ATTR_Q_ENQUEUED: &str = "enqueued_messages";
pub const ATTR_Q_DEQUEUED: &str = "dequeued_messages";
pub const ATTR_Q_HIGH_DEPTH: &str = "high_depth";
pub const ATTR_Q_SINCE_RESET: &str = "time_since_reset";
pub const ATTR_Q_MAX_DEPTH: &str = "attribute_max_depth";
pub const ATTR_Q_USAGE: &str = "attribute_usage";

pub fn attributes(platform: i32) -> Vec<(&'static str, StatusAttribute)> {
    let mut table = vec![
        (ATTR_Q_NAME, StatusAttribute::pseudo("name", "Queue Name")),
        (ATTR_Q_DESC, StatusAttribute::pseudo("description", "Queue Description")),
        (
            ATTR_Q_DEPTH,
            StatusAttribute::new("depth", "Current Depth", MQIA_CURRENT_Q_DEPTH),
        ),
        (
            ATTR_Q_OLDEST_MSG_AGE,
            StatusAttribute::new("oldest_message_age", "Oldest Message", MQIACF_OLDEST_MSG_AGE)
                .special(),
        ),
        (
            ATTR_Q_INPUT_HANDLES,
            StatusAttribute::new("input_handles", "Input Handles", MQIA_OPEN_INPUT_COUNT),
        ),
        (
            ATTR_Q_OUTPUT_HANDLES,
            StatusAttribute::new("output_handles", "Output Handles", MQIA_OPEN_OUTPUT_COUNT),
        ),
        (
            ATTR_Q_QTIME_SHORT,
            StatusAttribute::new("qtime_short", "Queue Time Short", MQIACF_Q_TIME_INDICATOR)
                .indexed(0)
                .special()
                .microseconds(),
        ),
        (
            ATTR_Q_QTIME_LONG,
            StatusAttribute::new("qtime_long", "Queue Time Long", MQIACF_Q_TIME_INDICATOR)
                .indexed(1)
                .special()
                .microseconds(),
        ),
        (
            ATTR_Q_SINCE_PUT,
            StatusAttribute::pseudo("time_since_put", "Time Since Put"),
        ),
        (
            ATTR_Q_SINCE_GET,
            StatusAttribute::pseudo("time_since_get", "Time Since Get"),
        ),
        (
            ATTR_Q_UNCOMMITTED,
            StatusAttribute::new("uncommitted_messages", "Uncommitted Messages", MQIACF_UNCOMMITTED_MSGS),
        ),
        (
            ATTR_Q_MAX_DEPTH,
            StatusAttribute::pseudo("attribute_max_depth", "Queue Max Depth"),
        ),
        (
            ATTR_Q_USAGE,
            StatusAttribute::pseudo("attribute_usage", "Queue Usage"),
        ),
    ];

    if platform == MQPL_ZOS {
        table.extend([
            (
                ATTR_Q_ENQUEUED,
                StatusAttribute::new("mqput_mqput1_count", "Put Count", MQIA_MSG_ENQ_COUNT),
            ),
            (
                ATTR_Q_DEQUEUED,
                StatusAttribute::new("mqget_count", "Get Count", MQIA_MSG_DEQ_COUNT),
            ),
            (
                ATTR_Q_HIGH_DEPTH,
                StatusAttribute::new("high_depth", "Queue High Depth", MQIA_HIGH_Q_DEPTH),
            ),
            (
                ATTR_Q_SINCE_RESET,
                StatusAttribute::new("time_since_reset", "Time Since Reset", MQIA_TIME_SINCE_RESET),
            ),
        ]);
    } else {
        table.extend([
            (
                ATTR_Q_FILE_SIZE,
                StatusAttribute::new("qfile_current_size", "Current Queue File Size", MQIACF_CUR_Q_FILE_SIZE),
            ),
            (
                ATTR_Q_FILE_MAX_SIZE,
                StatusAttribute::new("qfile_max_size", "Current Maximum Queue File Size", MQIACF_CUR_MAX_FILE_SIZE),
            ),
        ]);
    }
    table
}

pub fn identify(params: &[PcfParameter], ctx: &ParseContext) -> Option<Row> {
    let mut name = None;
    let (mut put_date, mut put_time, mut get_date, mut get_time) = (None, None, None, None);

    for p in params {
        let PcfValue::Str(s) = &p.value else { continue };
        match p.code {
            MQCA_Q_NAME => name = Some(s.as_str()),
            MQCACF_LAST_PUT_DATE => put_date = Some(s.as_str()),
            MQCACF_LAST_PUT_TIME => put_time = Some(s.as_str()),
            MQCACF_LAST_GET_DATE => get_date = Some(s.as_str()),
            MQCACF_LAST_GET_TIME => get_time = Some(s.as_str()),
            _ => {}
        }
    }

    let name = name.filter(|n| !n.is_empty())?;
    Some(
        Row::new(name, name.to_string())
            .with_str(ATTR_Q_NAME, name)
            .with_opt_int(ATTR_Q_SINCE_PUT, ctx.seconds_since(put_date, put_time))
            .with_opt_int(ATTR_Q_SINCE_GET, ctx.seconds_since(get_date, get_time)),
    )
}
