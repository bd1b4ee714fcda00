//! Test helpers and utilities for integration tests

use mqmetric::config::CollectorConfig;
use mqmetric::protocol::constants::*;
use mqmetric::protocol::{PcfMessage, PcfParameter};
use mqmetric::session::{self, ConnectionInfo};
use mqmetric::testing::fixtures;
use mqmetric::testing::MockBroker;

/// Polling-only configuration with the given extra `[collection]` lines
#[allow(dead_code)]
pub fn polling_config(collection: &str) -> CollectorConfig {
    CollectorConfig::from_toml(&format!(
        r#"
[connection]
queue_manager = "QM1"
wait_interval_secs = 1

[collection]
use_publications = false
{collection}
"#
    ))
    .unwrap()
}

/// Publication-enabled configuration with the given extra `[collection]` lines
#[allow(dead_code)]
pub fn publication_config(collection: &str) -> CollectorConfig {
    CollectorConfig::from_toml(&format!(
        r#"
[connection]
queue_manager = "QM1"
wait_interval_secs = 1

[collection]
use_publications = true
{collection}
"#
    ))
    .unwrap()
}

/// Connect a session against `broker`
#[allow(dead_code)]
pub async fn connect(broker: &MockBroker, config: CollectorConfig) -> ConnectionInfo {
    session::connect("test", broker.transport(), config).await.unwrap()
}

/// String parameter of a request, blank when absent
#[allow(dead_code)]
pub fn requested_name(request: &PcfMessage, code: i32) -> String {
    request.find_str(code).unwrap_or_default().to_string()
}

/// Paged channel status reply for the given (name, connname, job, messages) rows
#[allow(dead_code)]
pub fn channel_replies(rows: &[(&str, &str, &str, i32)]) -> Vec<PcfMessage> {
    if rows.is_empty() {
        return vec![fixtures::error_reply(
            MQCMD_INQUIRE_CHANNEL_STATUS,
            MQCC_FAILED,
            MQRCCF_CHL_STATUS_NOT_FOUND,
        )];
    }
    fixtures::paged(
        MQCMD_INQUIRE_CHANNEL_STATUS,
        rows.iter()
            .map(|(name, conn, job, msgs)| fixtures::channel_status(name, conn, job, *msgs))
            .collect(),
    )
}

/// Retain the STATQ metadata tree on `broker` and answer queue names
/// inquiries with `queues`
#[allow(dead_code)]
pub async fn script_publication_metadata(broker: &MockBroker, queues: &'static [&'static str]) {
    broker
        .retain(
            &mqmetric::protocol::topics::metadata_classes_topic("QM1"),
            fixtures::metadata_classes("QM1"),
        )
        .await;
    broker
        .retain(&fixtures::metadata_types_topic("QM1"), fixtures::metadata_types("QM1"))
        .await;
    broker
        .retain(&fixtures::metadata_elements_topic("QM1"), fixtures::metadata_elements())
        .await;
    broker
        .on_command(MQCMD_INQUIRE_Q_NAMES, move |req| {
            vec![fixtures::reply(
                req.header.command,
                vec![PcfParameter::string_list(MQCACF_Q_NAMES, queues)],
                true,
            )]
        })
        .await;
}
