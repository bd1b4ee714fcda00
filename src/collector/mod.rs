//! Status collection passes
//!
//! One pass for one object class:
//!
//! 1. clear the class's live values and its seen-set (baselines stay);
//! 2. send one status request per target on the status reply queue and
//!    page through the correlated replies until the final-message marker;
//! 3. fold each reply into the registry, identity first, then values;
//! 4. merge cached definitions and synthetic inactive rows;
//! 5. prune baselines of instances that were not seen.
//!
//! A receive that times out before any reply is an empty result. Once a
//! reply has arrived, running out of replies before the final marker is a
//! [`CollectError::Timeout`]. Error replies are returned after every target
//! has been tried and leave the values gathered so far in place. Transport
//! failures abort the pass at once.

pub mod objinfo;
pub mod patterns;
pub mod requests;

pub use objinfo::{ObjInfo, ObjInfoCache};
pub use patterns::PatternList;

use crate::error::CollectError;
use crate::observability::collector_stats;
use crate::protocol::constants::*;
use crate::protocol::{Encoding, PcfCommand, PcfHeader, PcfMessage, PcfValue};
use crate::session::ConnectionInfo;
use crate::status::{self, ObjectClass, ObjectStatus, ParseContext, TopicQuery};
use crate::transport::{GetOptions, Message, MessageId, OpenedQueue, QueueHandle, Transport, NO_ID};
use chrono::Utc;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// Reasons meaning "nothing matched", reported as an empty result
const BENIGN_REASONS: [i32; 3] = [
    MQRCCF_NONE_FOUND,
    MQRCCF_CHL_STATUS_NOT_FOUND,
    MQRC_UNKNOWN_OBJECT_NAME,
];

/// Slack on top of the transport's own wait before a receive is abandoned
const RECEIVE_GRACE: Duration = Duration::from_secs(1);

/// Fresh correlation token: a v4 UUID padded with zeros to identifier length
pub(crate) fn new_message_id() -> MessageId {
    let mut id = NO_ID;
    id[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    id
}

/// Correlated request/reply exchange with the command server
pub(crate) struct CommandChannel<'a> {
    transport: &'a mut dyn Transport,
    command_queue: QueueHandle,
    reply: &'a OpenedQueue,
    wait: Duration,
    encoding: Encoding,
}

impl<'a> CommandChannel<'a> {
    pub(crate) fn new(
        transport: &'a mut dyn Transport,
        command_queue: QueueHandle,
        reply: &'a OpenedQueue,
        wait: Duration,
    ) -> Self {
        Self {
            transport,
            command_queue,
            reply,
            wait,
            encoding: Encoding::default(),
        }
    }

    pub(crate) fn transport(&mut self) -> &mut dyn Transport {
        &mut *self.transport
    }

    /// Send one request and hand every usable reply to `on_reply`.
    /// Returns the number of replies received.
    pub(crate) async fn request<F>(
        &mut self,
        class: ObjectClass,
        command: &PcfCommand,
        mut on_reply: F,
    ) -> Result<usize, CollectError>
    where
        F: FnMut(&PcfMessage),
    {
        let msg_id = new_message_id();
        let message = Message::admin(command.encode(self.encoding), msg_id, &self.reply.name, self.encoding);
        self.transport.put(self.command_queue, message).await?;
        collector_stats().request_sent();

        let options = GetOptions {
            wait: self.wait,
            correl_id: Some(msg_id),
        };
        let mut replies = 0usize;
        let mut failure: Option<CollectError> = None;

        loop {
            let received = tokio::time::timeout(
                self.wait + RECEIVE_GRACE,
                self.transport.get(self.reply.handle, &options),
            )
            .await;

            let message = match received {
                Ok(Ok(message)) => message,
                Ok(Err(e)) if !e.is_no_message() => return Err(e.into()),
                Ok(Err(_)) | Err(_) => {
                    collector_stats().receive_timeout();
                    if replies == 0 {
                        debug!(class = %class, command = command.command_code(), "No reply within wait interval");
                        return Ok(0);
                    }
                    warn!(class = %class, replies, "Reply sequence ended without a final message");
                    return Err(failure.unwrap_or(CollectError::Timeout { class }));
                }
            };

            replies += 1;
            collector_stats().reply_received();

            let reply = match PcfMessage::decode(&message.payload, message.encoding) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(class = %class, error = %e, "Skipping undecodable reply");
                    collector_stats().decode_error();
                    let last = PcfHeader::decode(&message.payload, message.encoding)
                        .map(|h| h.is_last())
                        .unwrap_or(false);
                    if last {
                        break;
                    }
                    continue;
                }
            };

            let header = &reply.header;
            if header.comp_code != MQCC_OK && !BENIGN_REASONS.contains(&header.reason) {
                warn!(
                    class = %class,
                    command = header.command,
                    comp_code = header.comp_code,
                    reason = header.reason,
                    "Command server reported an error"
                );
                failure.get_or_insert(CollectError::Protocol {
                    command: header.command,
                    comp_code: header.comp_code,
                    reason: header.reason,
                });
            }
            if header.comp_code != MQCC_FAILED {
                on_reply(&reply);
            }
            if reply.header.is_last() {
                break;
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(replies),
        }
    }
}

/// Run one collection pass for `class` over a comma-separated pattern list
pub async fn collect(conn: &mut ConnectionInfo, class: ObjectClass, patterns: &str) -> Result<(), CollectError> {
    let span = crate::collection_span!(class = %class, session = %conn.key);
    let started = Instant::now();
    collector_stats().pass_started();

    let result = run_pass(conn, class, patterns).instrument(span).await;
    match &result {
        Ok(instances) => {
            collector_stats().pass_completed(class.as_str(), *instances, started.elapsed());
        }
        Err(e) => {
            warn!(class = %class, error = %e, "Collection pass failed");
            collector_stats().pass_failed(class.as_str(), started.elapsed());
        }
    }
    result.map(|_| ())
}

async fn run_pass(conn: &mut ConnectionInfo, class: ObjectClass, patterns: &str) -> Result<usize, CollectError> {
    if !conn.is_connected() {
        return Err(CollectError::NotConnected);
    }
    let platform = conn.metadata.platform;
    if !class.supported_on(platform) {
        return Err(CollectError::UnsupportedClass { class });
    }

    let ConnectionInfo {
        transport,
        config,
        handles,
        objects,
        obj_info,
        ..
    } = conn;
    let command_queue = handles.command.ok_or(CollectError::NotConnected)?;
    let reply = handles
        .status_reply
        .as_ref()
        .or(handles.reply.as_ref())
        .ok_or(CollectError::NotConnected)?;
    let mut chan = CommandChannel::new(transport.as_mut(), command_queue, reply, config.wait_interval());

    let settings = &config.collection;
    let patterns = PatternList::parse(patterns);
    let base_ctx = ParseContext {
        platform,
        tz_offset_secs: settings.tz_offset_secs,
        hide_amqp_client_id: settings.hide_amqp_client_id,
        hide_mqtt_client_id: settings.hide_mqtt_client_id,
        topic_query: TopicQuery::Status,
        now: Utc::now(),
    };

    let status = objects.entry(class).or_insert_with(|| ObjectStatus::new(class));
    if status.init(platform) {
        debug!(class = %class, attributes = status.status_set().len(), "Attribute table populated");
    }

    if matches!(class, ObjectClass::Queue | ObjectClass::Channel) && obj_info.is_due(class) {
        refresh_definitions(&mut chan, obj_info, class, &patterns, platform).await;
    }

    status.begin_pass();
    let mut first_error: Option<CollectError> = None;

    let targets = if !requests::takes_pattern(class) {
        vec![String::new()]
    } else if patterns.has_excludes() {
        match resolve_names(&mut chan, class, &patterns, platform).await {
            Ok(Some(names)) => names,
            Ok(None) => patterns.includes().into_iter().map(str::to_string).collect(),
            Err(e @ CollectError::Transport(_)) => return Err(e),
            Err(e) => {
                first_error.get_or_insert(e);
                Vec::new()
            }
        }
    } else {
        patterns.includes().into_iter().map(str::to_string).collect()
    };

    for target in &targets {
        for &query in requests::queries(class) {
            let command = requests::status_request(class, target, query, platform);
            let ctx = ParseContext {
                topic_query: query,
                ..base_ctx
            };
            let result = chan
                .request(class, &command, |reply| fold_reply(status, class, reply, &ctx, &patterns))
                .await;
            match result {
                Ok(replies) => debug!(class = %class, object = %target, replies, "Status request complete"),
                Err(e @ CollectError::Transport(_)) => return Err(e),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
    }

    if class == ObjectClass::Queue && platform == MQPL_ZOS && settings.use_reset_q_stats {
        for target in &targets {
            let command = requests::reset_q_stats_request(target, platform);
            let result = chan
                .request(class, &command, |reply| fold_reply(status, class, reply, &base_ctx, &patterns))
                .await;
            match result {
                Ok(_) => {}
                Err(e @ CollectError::Transport(_)) => return Err(e),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
    }

    match class {
        ObjectClass::Queue => obj_info.merge_queues(status),
        ObjectClass::Channel => {
            obj_info.merge_channels(status);
            if settings.show_inactive_channels {
                let added = obj_info.add_inactive_channels(status, &patterns);
                debug!(added, "Inactive channel rows added");
            }
        }
        _ => {}
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            status.prune();
            Ok(status.seen().len())
        }
    }
}

/// Identity scan, pattern filter, then value fold of one reply
fn fold_reply(
    status: &mut ObjectStatus,
    class: ObjectClass,
    reply: &PcfMessage,
    ctx: &ParseContext,
    patterns: &PatternList,
) {
    let Some(row) = status::identify(class, &reply.parameters, ctx) else {
        return;
    };
    if patterns.excludes(&row.name) {
        return;
    }
    status.record(row, &reply.parameters);
}

/// Expand include patterns into concrete names with a names inquiry and
/// drop the excluded ones. `None` when the class has no names inquiry.
async fn resolve_names(
    chan: &mut CommandChannel<'_>,
    class: ObjectClass,
    patterns: &PatternList,
    platform: i32,
) -> Result<Option<Vec<String>>, CollectError> {
    let mut names = BTreeSet::new();
    for pattern in patterns.includes() {
        let Some((command, field)) = requests::names_request(class, pattern, platform) else {
            return Ok(None);
        };
        chan.request(class, &command, |reply| {
            for p in reply.parameters.iter().filter(|p| p.code == field) {
                if let PcfValue::StrList(list) = &p.value {
                    names.extend(list.iter().filter(|n| patterns.matches(n)).cloned());
                }
            }
        })
        .await?;
    }
    debug!(class = %class, names = names.len(), "Resolved pattern list to names");
    Ok(Some(names.into_iter().collect()))
}

/// Refresh cached definitions for a class. Failures are logged and the
/// previous cache contents are kept for the names that did not come back.
async fn refresh_definitions(
    chan: &mut CommandChannel<'_>,
    cache: &mut ObjInfoCache,
    class: ObjectClass,
    patterns: &PatternList,
    platform: i32,
) {
    let includes = patterns.includes();
    if includes.is_empty() {
        return;
    }

    let mut fetched = ObjInfoCache::new(Duration::ZERO);
    let mut ok = true;
    for pattern in includes {
        let (command, absorb): (PcfCommand, fn(&mut ObjInfoCache, &PcfMessage)) = match class {
            ObjectClass::Queue => (
                requests::queue_definitions_request(pattern, platform),
                ObjInfoCache::absorb_queue,
            ),
            _ => (
                requests::channel_definitions_request(pattern, platform),
                ObjInfoCache::absorb_channel,
            ),
        };
        if let Err(e) = chan.request(class, &command, |reply| absorb(&mut fetched, reply)).await {
            warn!(class = %class, pattern, error = %e, "Definition refresh failed");
            ok = false;
        }
    }

    if ok {
        match class {
            ObjectClass::Queue => cache.clear_queues(),
            _ => cache.clear_channels(),
        }
    }
    cache.absorb_all(fetched);
    cache.mark_refreshed(class);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_are_unique_and_padded() {
        let a = new_message_id();
        let b = new_message_id();
        assert_ne!(a, b);
        assert_eq!(&a[16..], &[0u8; 8]);
        assert_ne!(a, NO_ID);
    }

    #[test]
    fn test_benign_reasons() {
        assert!(BENIGN_REASONS.contains(&MQRCCF_CHL_STATUS_NOT_FOUND));
        assert!(!BENIGN_REASONS.contains(&MQRC_NOT_AUTHORIZED));
    }
}
