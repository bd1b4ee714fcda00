//! Canned broker messages: command replies, metadata and data publications

use crate::protocol::constants::*;
use crate::protocol::{PcfHeader, PcfMessage, PcfParameter};

/// A command server reply
pub fn reply(command: i32, parameters: Vec<PcfParameter>, last: bool) -> PcfMessage {
    let mut header = PcfHeader::command(command);
    header.kind = MQCFT_RESPONSE;
    header.control = if last { MQCFC_LAST } else { MQCFC_NOT_LAST };
    PcfMessage { header, parameters }
}

/// A final reply carrying only a completion and reason code
pub fn error_reply(command: i32, comp_code: i32, reason: i32) -> PcfMessage {
    let mut msg = reply(command, Vec::new(), true);
    msg.header.comp_code = comp_code;
    msg.header.reason = reason;
    msg
}

/// Replies to a paged inquiry: every row but the last carries the
/// not-last marker
pub fn paged(command: i32, rows: Vec<Vec<PcfParameter>>) -> Vec<PcfMessage> {
    let count = rows.len();
    rows.into_iter()
        .enumerate()
        .map(|(i, params)| reply(command, params, i + 1 == count))
        .collect()
}

pub fn queue_status(name: &str, depth: i32) -> Vec<PcfParameter> {
    vec![
        PcfParameter::string(MQCA_Q_NAME, name),
        PcfParameter::int(MQIA_CURRENT_Q_DEPTH, depth),
        PcfParameter::int(MQIA_OPEN_INPUT_COUNT, 1),
        PcfParameter::int(MQIA_OPEN_OUTPUT_COUNT, 0),
        PcfParameter::int_list(MQIACF_Q_TIME_INDICATOR, &[7, 42]),
    ]
}

pub fn channel_status(name: &str, connname: &str, jobname: &str, messages: i32) -> Vec<PcfParameter> {
    vec![
        PcfParameter::string(MQCACH_CHANNEL_NAME, name),
        PcfParameter::string(MQCACH_CONNECTION_NAME, connname),
        PcfParameter::string(MQCACH_MCA_JOB_NAME, jobname),
        PcfParameter::string(MQCA_REMOTE_Q_MGR_NAME, ""),
        PcfParameter::int(MQIACH_CHANNEL_TYPE, MQCHT_SVRCONN),
        PcfParameter::int(MQIACH_CHANNEL_STATUS, MQCHS_RUNNING),
        PcfParameter::int(MQIACH_MSGS, messages),
    ]
}

pub fn channel_definition(name: &str, channel_type: i32) -> Vec<PcfParameter> {
    vec![
        PcfParameter::string(MQCACH_CHANNEL_NAME, name),
        PcfParameter::string(MQCACH_DESC, ""),
        PcfParameter::int(MQIACH_CHANNEL_TYPE, channel_type),
        PcfParameter::int(MQIACH_MAX_INSTANCES, 999_999_999),
        PcfParameter::int(MQIACH_MAX_INSTS_PER_CLIENT, 999_999_999),
    ]
}

/// A resource-statistics publication
pub fn publication(parameters: Vec<PcfParameter>) -> PcfMessage {
    let mut header = PcfHeader::command(0);
    header.kind = MQCFT_STATUS;
    PcfMessage { header, parameters }
}

pub fn metadata_classes(qmgr: &str) -> PcfMessage {
    publication(vec![PcfParameter::group(
        MQGACF_MONITOR_CLASS,
        vec![
            PcfParameter::int(MQIAMO_MONITOR_CLASS, 0),
            PcfParameter::string(MQCAMO_MONITOR_CLASS, "STATQ"),
            PcfParameter::string(MQCAMO_MONITOR_DESC, "API per-queue activity"),
            PcfParameter::string(MQCA_TOPIC_STRING, &metadata_types_topic(qmgr)),
        ],
    )])
}

pub fn metadata_types_topic(qmgr: &str) -> String {
    format!("$SYS/MQ/INFO/QMGR/{qmgr}/Monitor/METADATA/STATQ/TYPES")
}

pub fn metadata_elements_topic(qmgr: &str) -> String {
    format!("$SYS/MQ/INFO/QMGR/{qmgr}/Monitor/METADATA/STATQ/GENERAL")
}

pub fn metadata_types(qmgr: &str) -> PcfMessage {
    publication(vec![
        PcfParameter::int(MQIAMO_MONITOR_CLASS, 0),
        PcfParameter::group(
            MQGACF_MONITOR_TYPE,
            vec![
                PcfParameter::int(MQIAMO_MONITOR_TYPE, 1),
                PcfParameter::string(MQCAMO_MONITOR_TYPE, "GENERAL"),
                PcfParameter::string(MQCAMO_MONITOR_DESC, "General queue activity"),
                PcfParameter::string(MQCA_TOPIC_STRING, &metadata_elements_topic(qmgr)),
            ],
        ),
    ])
}

pub fn metadata_elements() -> PcfMessage {
    publication(vec![
        PcfParameter::int(MQIAMO_MONITOR_CLASS, 0),
        PcfParameter::int(MQIAMO_MONITOR_TYPE, 1),
        PcfParameter::string(MQCA_TOPIC_STRING, "$SYS/MQ/INFO/QMGR/%s/Monitor/STATQ/%s/GENERAL"),
        PcfParameter::int(MQIAMO_MONITOR_FLAGS, MQIAMO_MONITOR_FLAGS_OBJNAME),
        PcfParameter::group(
            MQGACF_MONITOR_ELEMENT,
            vec![
                PcfParameter::int(MQIAMO_MONITOR_ELEMENT, 0),
                PcfParameter::int(MQIAMO_MONITOR_DATATYPE, MQIAMO_MONITOR_UNIT),
                PcfParameter::string(MQCAMO_MONITOR_DESC, "Queue depth"),
            ],
        ),
        PcfParameter::group(
            MQGACF_MONITOR_ELEMENT,
            vec![
                PcfParameter::int(MQIAMO_MONITOR_ELEMENT, 1),
                PcfParameter::int(MQIAMO_MONITOR_DATATYPE, MQIAMO_MONITOR_MICROSEC),
                PcfParameter::string(MQCAMO_MONITOR_DESC, "Average queue time"),
            ],
        ),
        PcfParameter::group(
            MQGACF_MONITOR_ELEMENT,
            vec![
                PcfParameter::int(MQIAMO_MONITOR_ELEMENT, 2),
                PcfParameter::int(MQIAMO_MONITOR_DATATYPE, MQIAMO_MONITOR_DELTA),
                PcfParameter::string(MQCAMO_MONITOR_DESC, "MQPUT/MQPUT1 count"),
            ],
        ),
    ])
}

pub fn queue_data(queue: &str, depth: i32, qtime: i64) -> PcfMessage {
    publication(vec![
        PcfParameter::int(MQIAMO_MONITOR_CLASS, 0),
        PcfParameter::int(MQIAMO_MONITOR_TYPE, 1),
        PcfParameter::string(MQCA_Q_NAME, queue),
        PcfParameter::int(0, depth),
        PcfParameter::int64(1, qtime),
    ])
}

/// Data publication carrying only the put count of one queue
pub fn queue_put_data(queue: &str, puts: i32) -> PcfMessage {
    publication(vec![
        PcfParameter::int(MQIAMO_MONITOR_CLASS, 0),
        PcfParameter::int(MQIAMO_MONITOR_TYPE, 1),
        PcfParameter::string(MQCA_Q_NAME, queue),
        PcfParameter::int(2, puts),
    ])
}
