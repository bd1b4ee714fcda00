//! Queue manager status attributes

use super::{ParseContext, Row, Squash, StatusAttribute};
use crate::protocol::constants::*;
use crate::protocol::{PcfParameter, PcfValue};

pub const ATTR_QMGR_NAME: &str = "name";
pub const ATTR_QMGR_STATUS: &str = "status";
pub const ATTR_QMGR_STATUS_SQUASH: &str = "status_squash";
pub const ATTR_QMGR_CHINIT_STATUS: &str = "channel_initiator_status";
pub const ATTR_QMGR_CMD_SERVER_STATUS: &str = "command_server_status";
pub const ATTR_QMGR_CONNECTION_COUNT: &str = "connection_count";
pub const ATTR_QMGR_UPTIME: &str = "uptime";

pub fn attributes() -> Vec<(&'static str, StatusAttribute)> {
    vec![
        (ATTR_QMGR_NAME, StatusAttribute::pseudo("name", "Queue Manager Name")),
        (
            ATTR_QMGR_STATUS,
            StatusAttribute::new("status", "Queue Manager Status", MQIACF_Q_MGR_STATUS),
        ),
        (
            ATTR_QMGR_STATUS_SQUASH,
            StatusAttribute::new("status_squash", "Queue Manager Status - Simplified", MQIACF_Q_MGR_STATUS)
                .squashed(Squash::QueueManagerStatus),
        ),
        (
            ATTR_QMGR_CHINIT_STATUS,
            StatusAttribute::new("channel_initiator_status", "Channel Initiator Status", MQIACF_CHINIT_STATUS),
        ),
        (
            ATTR_QMGR_CMD_SERVER_STATUS,
            StatusAttribute::new("command_server_status", "Command Server Status", MQIACF_CMD_SERVER_STATUS),
        ),
        (
            ATTR_QMGR_CONNECTION_COUNT,
            StatusAttribute::new("connection_count", "Connection Count", MQIACF_CONNECTION_COUNT),
        ),
        (ATTR_QMGR_UPTIME, StatusAttribute::pseudo("uptime", "Up time")),
    ]
}

pub fn identify(params: &[PcfParameter], ctx: &ParseContext) -> Option<Row> {
    let mut name = None;
    let (mut start_date, mut start_time) = (None, None);
    for p in params {
        let PcfValue::Str(s) = &p.value else { continue };
        match p.code {
            MQCA_Q_MGR_NAME => name = Some(s.as_str()),
            MQCACF_Q_MGR_START_DATE => start_date = Some(s.as_str()),
            MQCACF_Q_MGR_START_TIME => start_time = Some(s.as_str()),
            _ => {}
        }
    }

    let name = name.filter(|n| !n.is_empty())?;
    Some(
        Row::new(name, name.to_string())
            .with_str(ATTR_QMGR_NAME, name)
            .with_opt_int(ATTR_QMGR_UPTIME, ctx.seconds_since(start_date, start_time)),
    )
}
