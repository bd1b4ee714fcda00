//! Collection pass behavior against the in-memory broker
//!
//! Each test scripts the command server, runs one or more passes and checks
//! what ends up in the class's status set.

mod test_helpers;

use mqmetric::error::CollectError;
use mqmetric::protocol::constants::*;
use mqmetric::protocol::PcfParameter;
use mqmetric::status::{ObjectClass, SQUASH_STOPPED};
use mqmetric::testing::{fixtures, MockBroker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use test_helpers::*;

const SVRCONN_KEY: &str = "APP.SVRCONN/10.0.0.1(1414)/job1/";

/// Channel status responder that reports the next message count on each pass,
/// or no instance at all for `None`
async fn script_channel_counts(broker: &MockBroker, counts: Vec<Option<i32>>) {
    let remaining = Arc::new(Mutex::new(counts.into_iter()));
    broker
        .on_command(MQCMD_INQUIRE_CHANNEL_STATUS, move |_| {
            match remaining.lock().unwrap().next().flatten() {
                Some(msgs) => channel_replies(&[("APP.SVRCONN", "10.0.0.1(1414)", "job1", msgs)]),
                None => channel_replies(&[]),
            }
        })
        .await;
}

#[tokio::test]
async fn test_pattern_with_no_active_instances_is_empty_not_an_error() {
    let broker = MockBroker::new();
    let mut conn = connect(&broker, polling_config("")).await;

    conn.collect(ObjectClass::Queue, "A.*").await.unwrap();

    let set = conn.status_set(ObjectClass::Queue).unwrap();
    assert!(set.instance_keys().is_empty());
}

#[tokio::test]
async fn test_no_reply_at_all_is_an_empty_pass() {
    let broker = MockBroker::new();
    broker.on_command(MQCMD_INQUIRE_Q_STATUS, |_| Vec::new()).await;
    let mut conn = connect(&broker, polling_config("")).await;

    assert!(conn.collect(ObjectClass::Queue, "APP.*").await.is_ok());
    assert!(conn.status_set(ObjectClass::Queue).unwrap().instance_keys().is_empty());
}

#[tokio::test]
async fn test_empty_pattern_list_sends_nothing() {
    let broker = MockBroker::new();
    let mut conn = connect(&broker, polling_config("")).await;

    conn.collect(ObjectClass::Queue, "").await.unwrap();

    assert!(broker.requests_for(MQCMD_INQUIRE_Q_STATUS).await.is_empty());
}

#[tokio::test]
async fn test_attribute_table_is_populated_once() {
    let broker = MockBroker::new();
    broker
        .on_command(MQCMD_INQUIRE_Q_STATUS, |req| {
            let name = requested_name(req, MQCA_Q_NAME);
            vec![fixtures::reply(req.header.command, fixtures::queue_status(&name, 3), true)]
        })
        .await;
    let mut conn = connect(&broker, polling_config("")).await;

    assert!(conn.init_attributes(ObjectClass::Queue));
    assert!(!conn.init_attributes(ObjectClass::Queue));
    let count = conn.status_set(ObjectClass::Queue).unwrap().len();

    conn.collect(ObjectClass::Queue, "APP.A").await.unwrap();
    conn.collect(ObjectClass::Queue, "APP.A").await.unwrap();

    let status = conn.object_status(ObjectClass::Queue).unwrap();
    assert!(status.is_initialized());
    assert_eq!(status.status_set().len(), count);
    assert_eq!(status.status_set().int_value("depth", "APP.A"), Some(3));
}

#[tokio::test]
async fn test_first_collect_initializes_the_class() {
    let broker = MockBroker::new();
    let mut conn = connect(&broker, polling_config("")).await;
    assert!(conn.status_set(ObjectClass::Channel).is_none());

    conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();

    assert!(conn.object_status(ObjectClass::Channel).unwrap().is_initialized());
    assert!(!conn.init_attributes(ObjectClass::Channel));
}

#[tokio::test]
async fn test_delta_sequence_across_passes() {
    let broker = MockBroker::new();
    script_channel_counts(&broker, vec![Some(10), Some(25), Some(25), Some(5), Some(12)]).await;
    let mut conn = connect(&broker, polling_config("")).await;

    let mut reported = Vec::new();
    for _ in 0..5 {
        conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();
        let set = conn.status_set(ObjectClass::Channel).unwrap();
        reported.push(set.int_value("messages", SVRCONN_KEY).unwrap());
    }

    // The drop from 25 to 5 reports the raw reading, then differencing resumes
    assert_eq!(reported, vec![0, 15, 0, 5, 7]);
}

#[tokio::test]
async fn test_absent_instance_loses_its_baseline() {
    let broker = MockBroker::new();
    script_channel_counts(&broker, vec![Some(100), None, Some(150)]).await;
    let mut conn = connect(&broker, polling_config("")).await;

    conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();
    let set = conn.status_set(ObjectClass::Channel).unwrap();
    assert_eq!(set.attribute("messages").unwrap().prev_value(SVRCONN_KEY), Some(100));

    conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();
    let set = conn.status_set(ObjectClass::Channel).unwrap();
    assert_eq!(set.attribute("messages").unwrap().prev_value(SVRCONN_KEY), None);
    assert_eq!(set.int_value("messages", SVRCONN_KEY), None);

    conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();
    let set = conn.status_set(ObjectClass::Channel).unwrap();
    assert_eq!(set.int_value("messages", SVRCONN_KEY), Some(0));
}

#[tokio::test]
async fn test_concurrent_instances_get_distinct_keys() {
    let broker = MockBroker::new();
    broker
        .on_command(MQCMD_INQUIRE_CHANNEL_STATUS, |_| {
            channel_replies(&[
                ("APP.SVRCONN", "10.0.0.1(1414)", "job1", 4),
                ("APP.SVRCONN", "10.0.0.2(1414)", "job2", 9),
            ])
        })
        .await;
    let mut conn = connect(&broker, polling_config("")).await;

    conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();
    let first: Vec<String> = {
        let mut keys: Vec<String> = conn
            .object_status(ObjectClass::Channel)
            .unwrap()
            .seen()
            .iter()
            .cloned()
            .collect();
        keys.sort();
        keys
    };
    assert_eq!(first.len(), 2);

    conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();
    let mut second: Vec<String> = conn
        .object_status(ObjectClass::Channel)
        .unwrap()
        .seen()
        .iter()
        .cloned()
        .collect();
    second.sort();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_short_and_long_queue_time_are_not_swapped() {
    let broker = MockBroker::new();
    broker
        .on_command(MQCMD_INQUIRE_Q_STATUS, |req| {
            vec![fixtures::reply(req.header.command, fixtures::queue_status("APP.A", 1), true)]
        })
        .await;
    let mut conn = connect(&broker, polling_config("")).await;

    conn.collect(ObjectClass::Queue, "APP.A").await.unwrap();

    let set = conn.status_set(ObjectClass::Queue).unwrap();
    assert_eq!(set.int_value("qtime_short", "APP.A"), Some(7));
    assert_eq!(set.int_value("qtime_long", "APP.A"), Some(42));
    assert_eq!(conn.normalize(ObjectClass::Queue, "qtime_long", 42), 42.0 / 1_000_000.0);
    assert_eq!(conn.normalize(ObjectClass::Queue, "depth", -5), 0.0);
    assert_eq!(conn.normalize(ObjectClass::Queue, "oldest_message_age", -1), -1.0);
}

#[tokio::test]
async fn test_time_indicator_pairs_keep_their_order_on_zos() {
    let broker = MockBroker::new();
    broker.set_platform(MQPL_ZOS).await;
    broker
        .on_command(MQCMD_INQUIRE_Q_STATUS, |req| {
            vec![fixtures::reply(req.header.command, fixtures::queue_status("APP.A", 1), true)]
        })
        .await;
    broker
        .on_command(MQCMD_INQUIRE_CHANNEL_STATUS, |req| {
            let mut row = fixtures::channel_status("APP.SVRCONN", "10.0.0.1(1414)", "job1", 3);
            row.push(PcfParameter::int_list(MQIACH_NETWORK_TIME_INDICATOR, &[7, 42]));
            vec![fixtures::reply(req.header.command, row, true)]
        })
        .await;
    let mut conn = connect(&broker, polling_config("")).await;
    assert_eq!(conn.platform(), MQPL_ZOS);

    conn.collect(ObjectClass::Queue, "APP.A").await.unwrap();
    conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();

    let queues = conn.status_set(ObjectClass::Queue).unwrap();
    assert_eq!(queues.int_value("qtime_short", "APP.A"), Some(7));
    assert_eq!(queues.int_value("qtime_long", "APP.A"), Some(42));
    let channels = conn.status_set(ObjectClass::Channel).unwrap();
    assert_eq!(channels.int_value("nettime_short", SVRCONN_KEY), Some(7));
    assert_eq!(channels.int_value("nettime_long", SVRCONN_KEY), Some(42));
}

#[tokio::test]
async fn test_topic_message_counts_are_per_interval() {
    let broker = MockBroker::new();
    let requests = Arc::new(AtomicUsize::new(0));
    let counts = [(100, 40), (130, 55), (130, 61)];
    broker
        .on_command(MQCMD_INQUIRE_TOPIC_STATUS, move |req| {
            // Status and publisher views are both asked for on every pass
            let pass = requests.fetch_add(1, Ordering::SeqCst) / 2;
            let (published, received) = counts[pass.min(counts.len() - 1)];
            vec![fixtures::reply(
                req.header.command,
                vec![
                    PcfParameter::string(MQCA_TOPIC_STRING, "price/fruit"),
                    PcfParameter::int(MQIA_PUB_COUNT, 1),
                    PcfParameter::int(MQIACF_PUBLISH_COUNT, published),
                    PcfParameter::int(MQIACF_MESSAGE_COUNT, received),
                ],
                true,
            )]
        })
        .await;
    let mut conn = connect(&broker, polling_config("")).await;

    let mut reported = Vec::new();
    for _ in 0..3 {
        conn.collect(ObjectClass::Topic, "price/#").await.unwrap();
        let set = conn.status_set(ObjectClass::Topic).unwrap();
        reported.push((
            set.int_value("messages_published", "price/fruit[!status!]").unwrap(),
            set.int_value("messages_received", "price/fruit[!pub!]").unwrap(),
        ));
    }

    assert_eq!(reported, vec![(0, 0), (30, 15), (0, 6)]);
}

#[tokio::test]
async fn test_missing_final_reply_is_a_timeout_with_partial_data() {
    let broker = MockBroker::new();
    broker
        .on_command(MQCMD_INQUIRE_Q_STATUS, |req| {
            vec![
                fixtures::reply(req.header.command, fixtures::queue_status("APP.A", 1), false),
                fixtures::reply(req.header.command, fixtures::queue_status("APP.B", 2), false),
            ]
        })
        .await;
    let mut conn = connect(&broker, polling_config("")).await;

    let err = conn.collect(ObjectClass::Queue, "APP.*").await.unwrap_err();
    assert!(matches!(err, CollectError::Timeout { class: ObjectClass::Queue }));

    let set = conn.status_set(ObjectClass::Queue).unwrap();
    assert_eq!(set.int_value("depth", "APP.A"), Some(1));
    assert_eq!(set.int_value("depth", "APP.B"), Some(2));
}

#[tokio::test]
async fn test_error_reply_fails_pass_but_keeps_other_results() {
    let broker = MockBroker::new();
    broker
        .on_command(MQCMD_INQUIRE_Q_STATUS, |req| {
            match requested_name(req, MQCA_Q_NAME).as_str() {
                "APP.A" => vec![fixtures::reply(req.header.command, fixtures::queue_status("APP.A", 4), true)],
                _ => vec![fixtures::error_reply(req.header.command, MQCC_FAILED, MQRC_NOT_AUTHORIZED)],
            }
        })
        .await;
    let mut conn = connect(&broker, polling_config("")).await;

    let err = conn.collect(ObjectClass::Queue, "APP.A, APP.B").await.unwrap_err();
    match err {
        CollectError::Protocol { reason, .. } => assert_eq!(reason, MQRC_NOT_AUTHORIZED),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(broker.requests_for(MQCMD_INQUIRE_Q_STATUS).await.len(), 2);
    let set = conn.status_set(ObjectClass::Queue).unwrap();
    assert_eq!(set.int_value("depth", "APP.A"), Some(4));
}

#[tokio::test]
async fn test_failed_pass_keeps_baselines() {
    let broker = MockBroker::new();
    let failing = Arc::new(Mutex::new(false));
    let flag = failing.clone();
    broker
        .on_command(MQCMD_INQUIRE_CHANNEL_STATUS, move |req| {
            if *flag.lock().unwrap() {
                vec![fixtures::error_reply(req.header.command, MQCC_FAILED, MQRC_NOT_AUTHORIZED)]
            } else {
                channel_replies(&[("APP.SVRCONN", "10.0.0.1(1414)", "job1", 40)])
            }
        })
        .await;
    let mut conn = connect(&broker, polling_config("")).await;

    conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();
    *failing.lock().unwrap() = true;
    assert!(conn.collect(ObjectClass::Channel, "APP.*").await.is_err());

    let set = conn.status_set(ObjectClass::Channel).unwrap();
    assert_eq!(set.attribute("messages").unwrap().prev_value(SVRCONN_KEY), Some(40));
}

#[tokio::test]
async fn test_exclusions_expand_names_first() {
    let broker = MockBroker::new();
    broker
        .on_command(MQCMD_INQUIRE_Q_NAMES, |req| {
            vec![fixtures::reply(
                req.header.command,
                vec![PcfParameter::string_list(
                    MQCACF_Q_NAMES,
                    &["APP.A", "APP.TEMP1", "APP.B"],
                )],
                true,
            )]
        })
        .await;
    broker
        .on_command(MQCMD_INQUIRE_Q_STATUS, |req| {
            let name = requested_name(req, MQCA_Q_NAME);
            vec![fixtures::reply(req.header.command, fixtures::queue_status(&name, 1), true)]
        })
        .await;
    let mut conn = connect(&broker, polling_config("")).await;

    conn.collect(ObjectClass::Queue, "APP.*,!APP.TEMP*").await.unwrap();

    let names_requests = broker.requests_for(MQCMD_INQUIRE_Q_NAMES).await;
    assert_eq!(names_requests.len(), 1);
    assert_eq!(names_requests[0].find_str(MQCA_Q_NAME), Some("APP.*"));

    let targets: Vec<String> = broker
        .requests_for(MQCMD_INQUIRE_Q_STATUS)
        .await
        .iter()
        .map(|r| requested_name(r, MQCA_Q_NAME))
        .collect();
    assert_eq!(targets, vec!["APP.A", "APP.B"]);

    let mut keys: Vec<&str> = conn
        .status_set(ObjectClass::Queue)
        .unwrap()
        .instance_keys()
        .into_iter()
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["APP.A", "APP.B"]);
}

#[tokio::test]
async fn test_inactive_channels_are_reported_stopped() {
    let broker = MockBroker::new();
    broker
        .on_command(MQCMD_INQUIRE_CHANNEL, |req| {
            fixtures::paged(
                req.header.command,
                vec![
                    fixtures::channel_definition("APP.SVRCONN", MQCHT_SVRCONN),
                    fixtures::channel_definition("APP.IDLE", MQCHT_SENDER),
                    fixtures::channel_definition("APP.CLIENT", MQCHT_CLNTCONN),
                ],
            )
        })
        .await;
    script_channel_counts(&broker, vec![Some(1)]).await;
    let mut conn = connect(&broker, polling_config("show_inactive_channels = true")).await;

    conn.collect(ObjectClass::Channel, "APP.*").await.unwrap();

    let set = conn.status_set(ObjectClass::Channel).unwrap();
    assert_eq!(set.int_value("status", "APP.IDLE/"), Some(MQCHS_INACTIVE as i64));
    assert_eq!(set.int_value("status_squash", "APP.IDLE/"), Some(SQUASH_STOPPED));
    assert_eq!(set.str_value("connname", "APP.IDLE/"), Some(""));
    assert!(set.value("name", "APP.CLIENT/").is_none());
    assert!(set.value("name", "APP.SVRCONN/").is_none());
    assert_eq!(set.int_value("attribute_max_instances", SVRCONN_KEY), Some(999_999_999));
}

#[tokio::test]
async fn test_transport_failure_aborts_the_pass() {
    let broker = MockBroker::new();
    let mut conn = connect(&broker, polling_config("")).await;
    broker.fail("put", MQRC_CONNECTION_BROKEN).await;

    let err = conn.collect(ObjectClass::Queue, "APP.*").await.unwrap_err();
    match err {
        CollectError::Transport(e) => assert!(e.is_connection_lost()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_collect_after_disconnect_is_rejected() {
    let broker = MockBroker::new();
    let mut conn = connect(&broker, polling_config("")).await;
    conn.disconnect().await;

    let err = conn.collect(ObjectClass::Queue, "APP.*").await.unwrap_err();
    assert!(matches!(err, CollectError::NotConnected));
}

#[tokio::test]
async fn test_platform_specific_classes() {
    let broker = MockBroker::new();
    let mut conn = connect(&broker, polling_config("")).await;

    let err = conn.collect(ObjectClass::UsagePageSet, "").await.unwrap_err();
    assert!(matches!(err, CollectError::UnsupportedClass { .. }));
}

#[tokio::test]
async fn test_reset_statistics_on_zos() {
    let broker = MockBroker::new();
    broker.set_platform(MQPL_ZOS).await;
    broker
        .on_command(MQCMD_INQUIRE_Q_STATUS, |req| {
            vec![fixtures::reply(req.header.command, fixtures::queue_status("APP.A", 2), true)]
        })
        .await;
    broker
        .on_command(MQCMD_RESET_Q_STATS, |req| {
            vec![fixtures::reply(
                req.header.command,
                vec![
                    PcfParameter::string(MQCA_Q_NAME, "APP.A"),
                    PcfParameter::int(MQIA_MSG_ENQ_COUNT, 5),
                    PcfParameter::int(MQIA_MSG_DEQ_COUNT, 3),
                    PcfParameter::int(MQIA_HIGH_Q_DEPTH, 9),
                ],
                true,
            )]
        })
        .await;
    let mut conn = connect(&broker, polling_config("use_reset_q_stats = true")).await;

    conn.collect(ObjectClass::Queue, "APP.A").await.unwrap();

    let set = conn.status_set(ObjectClass::Queue).unwrap();
    assert_eq!(set.int_value("depth", "APP.A"), Some(2));
    assert_eq!(set.int_value("enqueued_messages", "APP.A"), Some(5));
    assert_eq!(set.int_value("high_depth", "APP.A"), Some(9));
    assert_eq!(broker.requests_for(MQCMD_RESET_Q_STATS).await.len(), 1);
}
