//! Channel status attributes, including AMQP and MQTT channels

use super::{ParseContext, Row, Squash, StatusAttribute, HIDDEN_CLIENT_ID};
use crate::protocol::constants::*;
use crate::protocol::{PcfParameter, PcfValue};

pub const ATTR_CHL_NAME: &str = "name";
pub const ATTR_CHL_CONNNAME: &str = "connname";
pub const ATTR_CHL_JOBNAME: &str = "jobname";
pub const ATTR_CHL_RQMNAME: &str = "rqmname";
pub const ATTR_CHL_TYPE: &str = "type";
pub const ATTR_CHL_STATUS: &str = "status";
pub const ATTR_CHL_STATUS_SQUASH: &str = "status_squash";
pub const ATTR_CHL_SUBSTATE: &str = "substate";
pub const ATTR_CHL_MESSAGES: &str = "messages";
pub const ATTR_CHL_BYTES_SENT: &str = "bytes_sent";
pub const ATTR_CHL_BYTES_RCVD: &str = "bytes_rcvd";
pub const ATTR_CHL_BUFFERS_SENT: &str = "buffers_sent";
pub const ATTR_CHL_BUFFERS_RCVD: &str = "buffers_rcvd";
pub const ATTR_CHL_BATCHES: &str = "batches";
pub const ATTR_CHL_BATCHSZ_SHORT: &str = "batchsz_short";
pub const ATTR_CHL_BATCHSZ_LONG: &str = "batchsz_long";
pub const ATTR_CHL_NETTIME_SHORT: &str = "nettime_short";
pub const ATTR_CHL_NETTIME_LONG: &str = "nettime_long";
pub const ATTR_CHL_XQTIME_SHORT: &str = "xmitq_time_short";
pub const ATTR_CHL_XQTIME_LONG: &str = "xmitq_time_long";
pub const ATTR_CHL_SINCE_MSG: &str = "time_since_msg";
pub const ATTR_CHL_SHARING_CONVS: &str = "current_shared_conversations";
pub const ATTR_CHL_MAX_INST: &str = "attribute_max_instances";
pub const ATTR_CHL_MAX_INSTC: &str = "attribute_max_instances_per_client";

pub const ATTR_CHL_CLIENT_ID: &str = "clientid";
pub const ATTR_CHL_MSGS_SENT: &str = "messages_sent";
pub const ATTR_CHL_MSGS_RCVD: &str = "messages_rcvd";
pub const ATTR_CHL_CONNECTIONS: &str = "connection_count";

/// Instance key of a running channel. Several instances of one channel
/// differ in partner address, job or remote queue manager.
pub fn channel_key(name: &str, connname: &str, jobname: &str, rqmname: &str) -> String {
    format!("{name}/{connname}/{jobname}/{rqmname}")
}

/// Key of the synthetic row for a defined channel with no running instance
pub fn inactive_key(name: &str) -> String {
    format!("{name}/")
}

/// Channel name part of a channel instance key
pub fn name_from_key(key: &str) -> &str {
    key.split('/').next().unwrap_or(key)
}

fn status_pair() -> [(&'static str, StatusAttribute); 2] {
    [
        (
            ATTR_CHL_STATUS,
            StatusAttribute::new("status", "Channel Status", MQIACH_CHANNEL_STATUS),
        ),
        (
            ATTR_CHL_STATUS_SQUASH,
            StatusAttribute::new("status_squash", "Channel Status - Simplified", MQIACH_CHANNEL_STATUS)
                .squashed(Squash::ChannelStatus),
        ),
    ]
}

pub fn attributes(_platform: i32) -> Vec<(&'static str, StatusAttribute)> {
    let mut table = vec![
        (ATTR_CHL_NAME, StatusAttribute::pseudo("name", "Channel Name")),
        (ATTR_CHL_CONNNAME, StatusAttribute::pseudo("connname", "Connection Name")),
        (ATTR_CHL_JOBNAME, StatusAttribute::pseudo("jobname", "MCA Job Name")),
        (ATTR_CHL_RQMNAME, StatusAttribute::pseudo("rqmname", "Remote Queue Manager")),
        (
            ATTR_CHL_TYPE,
            StatusAttribute::new("type", "Channel Type", MQIACH_CHANNEL_TYPE),
        ),
        (
            ATTR_CHL_SUBSTATE,
            StatusAttribute::new("substate", "Channel Substate", MQIACH_CHANNEL_SUBSTATE),
        ),
        (
            ATTR_CHL_MESSAGES,
            StatusAttribute::new("messages", "Messages (API Calls for SVRCONN)", MQIACH_MSGS).delta(),
        ),
        (
            ATTR_CHL_BYTES_SENT,
            StatusAttribute::new("bytes_sent", "Bytes sent", MQIACH_BYTES_SENT).delta(),
        ),
        (
            ATTR_CHL_BYTES_RCVD,
            StatusAttribute::new("bytes_rcvd", "Bytes received", MQIACH_BYTES_RECEIVED).delta(),
        ),
        (
            ATTR_CHL_BUFFERS_SENT,
            StatusAttribute::new("buffers_sent", "Buffers sent", MQIACH_BUFFERS_SENT).delta(),
        ),
        (
            ATTR_CHL_BUFFERS_RCVD,
            StatusAttribute::new("buffers_rcvd", "Buffers received", MQIACH_BUFFERS_RECEIVED).delta(),
        ),
        (
            ATTR_CHL_BATCHES,
            StatusAttribute::new("batches", "Completed Batches", MQIACH_BATCHES).delta(),
        ),
        (
            ATTR_CHL_BATCHSZ_SHORT,
            StatusAttribute::new("batchsz_short", "Batch Size Average (short term)", MQIACH_BATCH_SIZE_INDICATOR)
                .indexed(0),
        ),
        (
            ATTR_CHL_BATCHSZ_LONG,
            StatusAttribute::new("batchsz_long", "Batch Size Average (long term)", MQIACH_BATCH_SIZE_INDICATOR)
                .indexed(1),
        ),
        (
            ATTR_CHL_NETTIME_SHORT,
            StatusAttribute::new("nettime_short", "Network Time Average (short term)", MQIACH_NETWORK_TIME_INDICATOR)
                .indexed(0)
                .special()
                .microseconds(),
        ),
        (
            ATTR_CHL_NETTIME_LONG,
            StatusAttribute::new("nettime_long", "Network Time Average (long term)", MQIACH_NETWORK_TIME_INDICATOR)
                .indexed(1)
                .special()
                .microseconds(),
        ),
        (
            ATTR_CHL_XQTIME_SHORT,
            StatusAttribute::new("xmitq_time_short", "XmitQ Time Average (short term)", MQIACH_XMITQ_TIME_INDICATOR)
                .indexed(0)
                .special()
                .microseconds(),
        ),
        (
            ATTR_CHL_XQTIME_LONG,
            StatusAttribute::new("xmitq_time_long", "XmitQ Time Average (long term)", MQIACH_XMITQ_TIME_INDICATOR)
                .indexed(1)
                .special()
                .microseconds(),
        ),
        (
            ATTR_CHL_SINCE_MSG,
            StatusAttribute::pseudo("time_since_msg", "Time Since Msg"),
        ),
        (
            ATTR_CHL_SHARING_CONVS,
            StatusAttribute::new(
                "current_shared_conversations",
                "Current Shared Conversations",
                MQIACH_CURRENT_SHARING_CONVS,
            ),
        ),
        (
            ATTR_CHL_MAX_INST,
            StatusAttribute::pseudo("attribute_max_instances", "MaxInst"),
        ),
        (
            ATTR_CHL_MAX_INSTC,
            StatusAttribute::pseudo("attribute_max_instances_per_client", "MaxInstC"),
        ),
    ];
    table.extend(status_pair());
    table
}

fn client_channel_attributes() -> Vec<(&'static str, StatusAttribute)> {
    let mut table = vec![
        (ATTR_CHL_NAME, StatusAttribute::pseudo("name", "Channel Name")),
        (ATTR_CHL_CLIENT_ID, StatusAttribute::pseudo("clientid", "Client Id")),
        (ATTR_CHL_CONNNAME, StatusAttribute::pseudo("connname", "Connection Name")),
        (
            ATTR_CHL_MSGS_SENT,
            StatusAttribute::new("messages_sent", "Messages sent", MQIACH_MSGS_SENT).delta(),
        ),
        (
            ATTR_CHL_MSGS_RCVD,
            StatusAttribute::new("messages_rcvd", "Messages received", MQIACH_MSGS_RECEIVED).delta(),
        ),
        (
            ATTR_CHL_CONNECTIONS,
            StatusAttribute::new("connection_count", "Connection Count", MQIACH_CONNECTION_COUNT),
        ),
        (
            ATTR_CHL_SINCE_MSG,
            StatusAttribute::pseudo("time_since_msg", "Time Since Msg"),
        ),
    ];
    table.extend(status_pair());
    table
}

pub fn amqp_attributes() -> Vec<(&'static str, StatusAttribute)> {
    client_channel_attributes()
}

pub fn mqtt_attributes() -> Vec<(&'static str, StatusAttribute)> {
    client_channel_attributes()
}

#[derive(Default)]
struct ChannelFields<'a> {
    name: Option<&'a str>,
    connname: &'a str,
    jobname: &'a str,
    rqmname: &'a str,
    client_id: &'a str,
    msg_date: Option<&'a str>,
    msg_time: Option<&'a str>,
}

fn scan(params: &[PcfParameter]) -> ChannelFields<'_> {
    let mut f = ChannelFields::default();
    for p in params {
        let PcfValue::Str(s) = &p.value else { continue };
        match p.code {
            MQCACH_CHANNEL_NAME => f.name = Some(s.as_str()),
            MQCACH_CONNECTION_NAME => f.connname = s.as_str(),
            MQCACH_MCA_JOB_NAME => f.jobname = s.as_str(),
            MQCA_REMOTE_Q_MGR_NAME => f.rqmname = s.as_str(),
            MQCACH_CLIENT_ID => f.client_id = s.as_str(),
            MQCACH_LAST_MSG_DATE => f.msg_date = Some(s.as_str()),
            MQCACH_LAST_MSG_TIME => f.msg_time = Some(s.as_str()),
            _ => {}
        }
    }
    f
}

pub fn identify(params: &[PcfParameter], ctx: &ParseContext) -> Option<Row> {
    let f = scan(params);
    let name = f.name.filter(|n| !n.is_empty())?;
    let key = channel_key(name, f.connname, f.jobname, f.rqmname);
    Some(
        Row::new(name, key)
            .with_str(ATTR_CHL_NAME, name)
            .with_str(ATTR_CHL_CONNNAME, f.connname)
            .with_str(ATTR_CHL_JOBNAME, f.jobname)
            .with_str(ATTR_CHL_RQMNAME, f.rqmname)
            .with_opt_int(ATTR_CHL_SINCE_MSG, ctx.seconds_since(f.msg_date, f.msg_time)),
    )
}

fn identify_client(params: &[PcfParameter], ctx: &ParseContext, hide: bool) -> Option<Row> {
    let f = scan(params);
    let name = f.name.filter(|n| !n.is_empty())?;
    // The real id stays in the key so that instances remain distinct
    let key = format!("{name}/{}", f.client_id);
    let exposed = if hide { HIDDEN_CLIENT_ID } else { f.client_id };
    Some(
        Row::new(name, key)
            .with_str(ATTR_CHL_NAME, name)
            .with_str(ATTR_CHL_CLIENT_ID, exposed)
            .with_str(ATTR_CHL_CONNNAME, f.connname)
            .with_opt_int(ATTR_CHL_SINCE_MSG, ctx.seconds_since(f.msg_date, f.msg_time)),
    )
}

pub fn identify_amqp(params: &[PcfParameter], ctx: &ParseContext) -> Option<Row> {
    identify_client(params, ctx, ctx.hide_amqp_client_id)
}

pub fn identify_mqtt(params: &[PcfParameter], ctx: &ParseContext) -> Option<Row> {
    identify_client(params, ctx, ctx.hide_mqtt_client_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ObjectClass, ObjectStatus, StatusValue, SQUASH_RUNNING};
    use proptest::prelude::*;

    fn instance(name: &str, conn: &str, job: &str) -> Vec<PcfParameter> {
        vec![
            PcfParameter::string(MQCACH_CHANNEL_NAME, name),
            PcfParameter::string(MQCACH_CONNECTION_NAME, conn),
            PcfParameter::string(MQCACH_MCA_JOB_NAME, job),
            PcfParameter::string(MQCA_REMOTE_Q_MGR_NAME, ""),
            PcfParameter::int(MQIACH_CHANNEL_STATUS, MQCHS_RUNNING),
            PcfParameter::int(MQIACH_MSGS, 100),
        ]
    }

    #[test]
    fn test_two_instances_get_distinct_keys() {
        let ctx = ParseContext::new(MQPL_UNIX);
        let a = identify(&instance("SVRCONN.1", "10.0.0.1", "0000123400000001"), &ctx).unwrap();
        let b = identify(&instance("SVRCONN.1", "10.0.0.2", "0000123400000002"), &ctx).unwrap();
        assert_ne!(a.key, b.key);
        assert_eq!(a.name, b.name);
        assert_eq!(name_from_key(&a.key), "SVRCONN.1");
    }

    #[test]
    fn test_record_fills_status_and_delta() {
        let ctx = ParseContext::new(MQPL_UNIX);
        let mut status = ObjectStatus::new(ObjectClass::Channel);
        status.init(MQPL_UNIX);

        let params = instance("TO.QM2", "host(1414)", "J1");
        let row = identify(&params, &ctx).unwrap();
        let key = row.key.clone();
        status.record(row, &params);

        let set = status.status_set();
        assert_eq!(set.int_value(ATTR_CHL_STATUS, &key), Some(MQCHS_RUNNING as i64));
        assert_eq!(set.int_value(ATTR_CHL_STATUS_SQUASH, &key), Some(SQUASH_RUNNING));
        assert_eq!(set.int_value(ATTR_CHL_MESSAGES, &key), Some(0));
        assert_eq!(set.str_value(ATTR_CHL_CONNNAME, &key), Some("host(1414)"));
    }

    #[test]
    fn test_mqtt_client_id_hidden_but_keyed() {
        let params = vec![
            PcfParameter::string(MQCACH_CHANNEL_NAME, "MQTT.CHL"),
            PcfParameter::string(MQCACH_CLIENT_ID, "sensor-17"),
        ];
        let ctx = ParseContext {
            hide_mqtt_client_id: true,
            ..ParseContext::new(MQPL_UNIX)
        };
        let row = identify_mqtt(&params, &ctx).unwrap();
        assert_eq!(row.key, "MQTT.CHL/sensor-17");
        assert!(row
            .values
            .contains(&(ATTR_CHL_CLIENT_ID, StatusValue::Str(HIDDEN_CLIENT_ID.to_string()))));

        let row = identify_amqp(&params, &ctx).unwrap();
        assert!(row
            .values
            .contains(&(ATTR_CHL_CLIENT_ID, StatusValue::Str("sensor-17".to_string()))));
    }

    #[test]
    fn test_inactive_key_never_matches_active_key() {
        assert_ne!(inactive_key("C"), channel_key("C", "", "", ""));
        assert_eq!(name_from_key(&inactive_key("C")), "C");
    }

    proptest! {
        #[test]
        fn key_is_stable_and_distinguishes_partners(
            name in "[A-Z.]{1,20}",
            conn1 in "[0-9.()]{1,20}",
            conn2 in "[0-9.()]{1,20}",
            job in "[0-9A-F]{16}",
        ) {
            let ctx = ParseContext::new(MQPL_UNIX);
            let first = identify(&instance(&name, &conn1, &job), &ctx).unwrap();
            let again = identify(&instance(&name, &conn1, &job), &ctx).unwrap();
            prop_assert_eq!(&first.key, &again.key);
            let other = identify(&instance(&name, &conn2, &job), &ctx).unwrap();
            prop_assert_eq!(first.key == other.key, conn1 == conn2);
        }
    }
}
