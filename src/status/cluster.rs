//! Cluster membership attributes, one row per (cluster, queue manager)

use super::{ParseContext, Row, Squash, StatusAttribute};
use crate::protocol::constants::*;
use crate::protocol::{PcfParameter, PcfValue};

pub const ATTR_CLUSTER_NAME: &str = "cluster";
pub const ATTR_CLUSTER_QMNAME: &str = "qmgr";
pub const ATTR_CLUSTER_QMTYPE: &str = "qmtype";
pub const ATTR_CLUSTER_STATUS: &str = "status";
pub const ATTR_CLUSTER_STATUS_SQUASH: &str = "status_squash";
pub const ATTR_CLUSTER_SUSPEND: &str = "suspend";

pub fn attributes() -> Vec<(&'static str, StatusAttribute)> {
    vec![
        (ATTR_CLUSTER_NAME, StatusAttribute::pseudo("cluster", "Cluster Name")),
        (ATTR_CLUSTER_QMNAME, StatusAttribute::pseudo("qmgr", "Queue Manager Name")),
        (
            ATTR_CLUSTER_QMTYPE,
            StatusAttribute::new("qmtype", "Queue Manager Type", MQIACF_Q_MGR_TYPE),
        ),
        (
            ATTR_CLUSTER_STATUS,
            StatusAttribute::new("status", "Cluster Channel Status", MQIACH_CHANNEL_STATUS),
        ),
        (
            ATTR_CLUSTER_STATUS_SQUASH,
            StatusAttribute::new("status_squash", "Cluster Channel Status - Simplified", MQIACH_CHANNEL_STATUS)
                .squashed(Squash::ChannelStatus),
        ),
        (
            ATTR_CLUSTER_SUSPEND,
            StatusAttribute::new("suspend", "Suspended", MQIACF_SUSPEND),
        ),
    ]
}

pub fn identify(params: &[PcfParameter], _ctx: &ParseContext) -> Option<Row> {
    let (mut cluster, mut qmgr) = (None, "");
    for p in params {
        let PcfValue::Str(s) = &p.value else { continue };
        match p.code {
            MQCA_CLUSTER_NAME => cluster = Some(s.as_str()),
            MQCA_CLUSTER_Q_MGR_NAME => qmgr = s.as_str(),
            _ => {}
        }
    }

    let cluster = cluster.filter(|c| !c.is_empty())?;
    Some(
        Row::new(cluster, format!("{cluster}/{qmgr}"))
            .with_str(ATTR_CLUSTER_NAME, cluster)
            .with_str(ATTR_CLUSTER_QMNAME, qmgr),
    )
}
