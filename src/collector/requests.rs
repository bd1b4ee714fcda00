//! Request builders, one per object class and purpose

use crate::protocol::constants::*;
use crate::protocol::PcfCommand;
use crate::status::{ObjectClass, TopicQuery};

/// Whether a class is queried per name pattern. The others are one
/// request per pass regardless of configured patterns.
pub fn takes_pattern(class: ObjectClass) -> bool {
    !matches!(
        class,
        ObjectClass::QueueManager | ObjectClass::UsageBufferPool | ObjectClass::UsagePageSet
    )
}

/// Status views requested for each target of a class
pub fn queries(class: ObjectClass) -> &'static [TopicQuery] {
    match class {
        ObjectClass::Topic => &[TopicQuery::Status, TopicQuery::Publishers],
        _ => &[TopicQuery::Status],
    }
}

fn channel_type(class: ObjectClass) -> Option<i32> {
    match class {
        ObjectClass::AmqpChannel => Some(MQCHT_AMQP),
        ObjectClass::MqttChannel => Some(MQCHT_MQTT),
        _ => None,
    }
}

/// Status request for one target. `target` is a name or broker-side
/// wildcard pattern and is ignored by classes that take no pattern.
pub fn status_request(class: ObjectClass, target: &str, query: TopicQuery, platform: i32) -> PcfCommand {
    let cmd = match class {
        ObjectClass::Queue => PcfCommand::new(MQCMD_INQUIRE_Q_STATUS)
            .string(MQCA_Q_NAME, target)
            .int(MQIACF_Q_STATUS_TYPE, MQIACF_Q_STATUS)
            .int_list(MQIACF_Q_STATUS_ATTRS, &[MQIACF_ALL]),
        ObjectClass::Channel | ObjectClass::AmqpChannel | ObjectClass::MqttChannel => {
            let mut cmd = PcfCommand::new(MQCMD_INQUIRE_CHANNEL_STATUS)
                .string(MQCACH_CHANNEL_NAME, target);
            if let Some(t) = channel_type(class) {
                cmd = cmd.int(MQIACH_CHANNEL_TYPE, t).string(MQCACH_CLIENT_ID, "*");
            }
            cmd.int(MQIACH_CHANNEL_INSTANCE_TYPE, MQOT_CURRENT_CHANNEL)
                .int_list(MQIACH_CHANNEL_INSTANCE_ATTRS, &[MQIACF_ALL])
        }
        ObjectClass::Topic => PcfCommand::new(MQCMD_INQUIRE_TOPIC_STATUS)
            .string(MQCA_TOPIC_STRING, target)
            .int(MQIACF_TOPIC_STATUS_TYPE, query.selector()),
        ObjectClass::Subscription => {
            PcfCommand::new(MQCMD_INQUIRE_SUB_STATUS).string(MQCACF_SUB_NAME, target)
        }
        ObjectClass::QueueManager => PcfCommand::new(MQCMD_INQUIRE_Q_MGR_STATUS)
            .int_list(MQIACF_Q_MGR_STATUS_ATTRS, &[MQIACF_ALL]),
        ObjectClass::Cluster => PcfCommand::new(MQCMD_INQUIRE_CLUSTER_Q_MGR)
            .string(MQCA_CLUSTER_Q_MGR_NAME, "*")
            .string(MQCA_CLUSTER_NAME, target)
            .int_list(MQIACF_CLUSTER_Q_MGR_ATTRS, &[MQIACF_ALL]),
        ObjectClass::UsageBufferPool => {
            PcfCommand::new(MQCMD_INQUIRE_USAGE).int(MQIACF_USAGE_TYPE, MQIACF_USAGE_BUFFER_POOL)
        }
        ObjectClass::UsagePageSet => {
            PcfCommand::new(MQCMD_INQUIRE_USAGE).int(MQIACF_USAGE_TYPE, MQIACF_USAGE_PAGESET)
        }
    };
    for_platform(cmd, platform)
}

fn for_platform(cmd: PcfCommand, platform: i32) -> PcfCommand {
    if platform == MQPL_ZOS {
        cmd.extended()
    } else {
        cmd
    }
}

/// Names inquiry used to resolve a pattern list with exclusions, with the
/// reply field carrying the names. Only queues and channels have one.
pub fn names_request(class: ObjectClass, pattern: &str, platform: i32) -> Option<(PcfCommand, i32)> {
    let (cmd, field) = match class {
        ObjectClass::Queue => (
            PcfCommand::new(MQCMD_INQUIRE_Q_NAMES)
                .string(MQCA_Q_NAME, pattern)
                .int(MQIA_Q_TYPE, MQQT_LOCAL),
            MQCACF_Q_NAMES,
        ),
        ObjectClass::Channel | ObjectClass::AmqpChannel | ObjectClass::MqttChannel => (
            PcfCommand::new(MQCMD_INQUIRE_CHANNEL_NAMES)
                .string(MQCACH_CHANNEL_NAME, pattern)
                .int(MQIACH_CHANNEL_TYPE, channel_type(class).unwrap_or(MQCHT_ALL)),
            MQCACH_CHANNEL_NAMES,
        ),
        _ => return None,
    };
    Some((for_platform(cmd, platform), field))
}

/// Interval statistics for queues, z/OS only
pub fn reset_q_stats_request(pattern: &str, platform: i32) -> PcfCommand {
    for_platform(
        PcfCommand::new(MQCMD_RESET_Q_STATS).string(MQCA_Q_NAME, pattern),
        platform,
    )
}

/// Local queue definitions feeding the cached descriptive attributes
pub fn queue_definitions_request(pattern: &str, platform: i32) -> PcfCommand {
    for_platform(
        PcfCommand::new(MQCMD_INQUIRE_Q)
            .string(MQCA_Q_NAME, pattern)
            .int(MQIA_Q_TYPE, MQQT_LOCAL)
            .int_list(
                MQIACF_Q_ATTRS,
                &[MQCA_Q_NAME, MQCA_Q_DESC, MQIA_MAX_Q_DEPTH, MQIA_USAGE],
            ),
        platform,
    )
}

/// Channel definitions feeding the cached descriptive attributes
pub fn channel_definitions_request(pattern: &str, platform: i32) -> PcfCommand {
    for_platform(
        PcfCommand::new(MQCMD_INQUIRE_CHANNEL)
            .string(MQCACH_CHANNEL_NAME, pattern)
            .int_list(
                MQIACF_CHANNEL_ATTRS,
                &[
                    MQCACH_CHANNEL_NAME,
                    MQCACH_DESC,
                    MQIACH_CHANNEL_TYPE,
                    MQIACH_MAX_INSTANCES,
                    MQIACH_MAX_INSTS_PER_CLIENT,
                ],
            ),
        platform,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PcfParameter, PcfValue};

    fn param(cmd: &PcfCommand, code: i32) -> Option<&PcfParameter> {
        cmd.parameters().iter().find(|p| p.code == code)
    }

    #[test]
    fn test_queue_status_request_shape() {
        let cmd = status_request(ObjectClass::Queue, "APP.*", TopicQuery::Status, MQPL_UNIX);
        assert_eq!(cmd.command_code(), MQCMD_INQUIRE_Q_STATUS);
        assert_eq!(param(&cmd, MQCA_Q_NAME).and_then(|p| p.as_str()), Some("APP.*"));
        assert_eq!(
            param(&cmd, MQIACF_Q_STATUS_ATTRS).map(|p| &p.value),
            Some(&PcfValue::IntList(vec![MQIACF_ALL as i64]))
        );
    }

    #[test]
    fn test_amqp_request_selects_channel_type() {
        let cmd = status_request(ObjectClass::AmqpChannel, "*", TopicQuery::Status, MQPL_UNIX);
        assert_eq!(param(&cmd, MQIACH_CHANNEL_TYPE).and_then(|p| p.as_int()), Some(MQCHT_AMQP as i64));
        let plain = status_request(ObjectClass::Channel, "*", TopicQuery::Status, MQPL_UNIX);
        assert!(param(&plain, MQIACH_CHANNEL_TYPE).is_none());
    }

    #[test]
    fn test_topic_request_carries_view() {
        let cmd = status_request(ObjectClass::Topic, "#", TopicQuery::Publishers, MQPL_UNIX);
        assert_eq!(
            param(&cmd, MQIACF_TOPIC_STATUS_TYPE).and_then(|p| p.as_int()),
            Some(MQIACF_TOPIC_PUB as i64)
        );
        assert_eq!(queries(ObjectClass::Topic).len(), 2);
        assert_eq!(queries(ObjectClass::Queue), &[TopicQuery::Status]);
    }

    #[test]
    fn test_names_request_only_for_queues_and_channels() {
        let (cmd, field) = names_request(ObjectClass::Queue, "*", MQPL_UNIX).unwrap();
        assert_eq!(cmd.command_code(), MQCMD_INQUIRE_Q_NAMES);
        assert_eq!(field, MQCACF_Q_NAMES);
        let (cmd, _) = names_request(ObjectClass::MqttChannel, "*", MQPL_UNIX).unwrap();
        assert_eq!(param(&cmd, MQIACH_CHANNEL_TYPE).and_then(|p| p.as_int()), Some(MQCHT_MQTT as i64));
        assert!(names_request(ObjectClass::Topic, "*", MQPL_UNIX).is_none());
    }

    #[test]
    fn test_pattern_free_classes() {
        assert!(takes_pattern(ObjectClass::Queue));
        assert!(takes_pattern(ObjectClass::Cluster));
        assert!(!takes_pattern(ObjectClass::QueueManager));
        assert!(!takes_pattern(ObjectClass::UsagePageSet));
    }
}
