//! Publication-based collection
//!
//! Instead of polling, the collector subscribes to the broker's
//! resource-statistics topics and drains the delivered publications on each
//! pass. Discovery reads the retained metadata tree first, then opens one
//! data subscription per queue-manager-wide type and one per monitored queue
//! for object-specific types.
//!
//! Durable subscriptions carry a configured name prefix. Leftovers from
//! earlier runs are swept at startup and the collector's own are swept at
//! shutdown: each is resumed transiently and closed with removal.

pub mod catalog;

pub use catalog::{
    normalize_published, MonitorClass, MonitorElement, MonitorType, PublicationCatalog, QMGR_OBJECT_KEY,
};

use crate::collector::{requests, CommandChannel, PatternList};
use crate::config::SubscriptionDelivery;
use crate::error::CollectError;
use crate::observability::collector_stats;
use crate::protocol::constants::*;
use crate::protocol::topics::{durable_subscription_name, durable_subscription_pattern, expand_topic, metadata_classes_topic};
use crate::protocol::{PcfCommand, PcfMessage, PcfValue};
use crate::session::ConnectionInfo;
use crate::status::ObjectClass;
use crate::transport::{
    Destination, GetOptions, QueueHandle, SubscribeRequest, SubscriptionHandle, Transport, TransportError,
};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

/// One data subscription held by a session
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSubscription {
    pub topic: String,
    pub durable_name: Option<String>,
    /// Open handle; `None` once a durable subscription has been closed to
    /// save handles while it keeps delivering
    pub handle: Option<SubscriptionHandle>,
    pub delivery_queue: QueueHandle,
}

/// Publication state of one session
#[derive(Debug, Clone, Default)]
pub struct PublicationState {
    pub(crate) catalog: PublicationCatalog,
    pub(crate) subscriptions: Vec<ActiveSubscription>,
}

impl PublicationState {
    pub fn catalog(&self) -> &PublicationCatalog {
        &self.catalog
    }

    pub fn subscriptions(&self) -> &[ActiveSubscription] {
        &self.subscriptions
    }

    pub fn is_discovered(&self) -> bool {
        !self.catalog.is_empty()
    }
}

/// Read every retained publication on a topic through a temporary
/// non-durable subscription
async fn read_retained(
    transport: &mut dyn Transport,
    topic: &str,
    wait: Duration,
) -> Result<Vec<PcfMessage>, CollectError> {
    let request = SubscribeRequest {
        topic: topic.to_string(),
        durable_name: None,
        destination: Destination::Managed,
        resume: false,
    };
    let sub = transport.subscribe(&request).await?;

    let mut messages = Vec::new();
    let mut options = GetOptions { wait, correl_id: None };
    let outcome = loop {
        match transport.get(sub.delivery_queue, &options).await {
            Ok(m) => match PcfMessage::decode(&m.payload, m.encoding) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    warn!(topic, error = %e, "Skipping undecodable metadata publication");
                    collector_stats().decode_error();
                }
            },
            Err(e) if e.is_no_message() => break Ok(()),
            Err(e) => break Err(e),
        }
        options.wait = Duration::ZERO;
    };

    if let Err(e) = transport.close_subscription(sub.handle, false).await {
        warn!(topic, error = %e, "Failed to close metadata subscription");
    }
    outcome?;
    debug!(topic, count = messages.len(), "Read retained publications");
    Ok(messages)
}

/// Walk the metadata tree: classes, then types, then elements
async fn read_catalog(
    transport: &mut dyn Transport,
    qmgr: &str,
    wait: Duration,
) -> Result<PublicationCatalog, CollectError> {
    let mut catalog = PublicationCatalog::new();

    let mut types_topics = Vec::new();
    for msg in read_retained(transport, &metadata_classes_topic(qmgr), wait).await? {
        types_topics.extend(catalog.absorb_classes(&msg));
    }

    let mut element_topics = Vec::new();
    for topic in types_topics {
        for msg in read_retained(transport, &expand_topic(&topic, qmgr, None), wait).await? {
            element_topics.extend(catalog.absorb_types(&msg));
        }
    }

    for topic in element_topics {
        for msg in read_retained(transport, &expand_topic(&topic, qmgr, None), wait).await? {
            catalog.absorb_elements(&msg);
        }
    }
    Ok(catalog)
}

/// Queue names matching the configured queue patterns
async fn monitored_queues(
    chan: &mut CommandChannel<'_>,
    patterns: &PatternList,
    platform: i32,
) -> Result<Vec<String>, CollectError> {
    let mut names = BTreeSet::new();
    for pattern in patterns.includes() {
        let Some((command, field)) = requests::names_request(ObjectClass::Queue, pattern, platform) else {
            continue;
        };
        chan.request(ObjectClass::Queue, &command, |reply| {
            for p in reply.parameters.iter().filter(|p| p.code == field) {
                if let PcfValue::StrList(list) = &p.value {
                    names.extend(list.iter().filter(|n| patterns.matches(n)).cloned());
                }
            }
        })
        .await?;
    }
    Ok(names.into_iter().collect())
}

/// Resume and remove every durable subscription named with `prefix`.
/// Failures are logged. Returns how many were removed.
pub(crate) async fn sweep_durable(chan: &mut CommandChannel<'_>, prefix: &str) -> usize {
    let command = PcfCommand::new(MQCMD_INQUIRE_SUBSCRIPTION)
        .string(MQCACF_SUB_NAME, &durable_subscription_pattern(prefix));
    let mut found = Vec::new();
    let listed = chan
        .request(ObjectClass::Subscription, &command, |reply| {
            if let Some(name) = reply.find_str(MQCACF_SUB_NAME).filter(|n| !n.is_empty()) {
                let topic = reply.find_str(MQCA_TOPIC_STRING).unwrap_or_default();
                found.push((name.to_string(), topic.to_string()));
            }
        })
        .await;
    if let Err(e) = listed {
        warn!(prefix, error = %e, "Could not list durable subscriptions");
        return 0;
    }

    let transport = chan.transport();
    let mut removed = 0;
    for (name, topic) in found {
        let request = SubscribeRequest {
            topic,
            durable_name: Some(name.clone()),
            destination: Destination::Managed,
            resume: true,
        };
        let result = match transport.subscribe(&request).await {
            Ok(sub) => transport.close_subscription(sub.handle, true).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(subscription = %name, error = %e, "Failed to remove durable subscription");
                collector_stats().teardown_error();
            }
        }
    }
    if removed > 0 {
        info!(prefix, removed, "Removed durable subscriptions");
    }
    removed
}

/// Close every open subscription handle. Errors are logged only.
pub(crate) async fn close_subscriptions(transport: &mut dyn Transport, subscriptions: &mut Vec<ActiveSubscription>) {
    for sub in subscriptions.drain(..) {
        let Some(handle) = sub.handle else { continue };
        if let Err(e) = transport.close_subscription(handle, false).await {
            warn!(topic = %sub.topic, error = %e, "Failed to close subscription");
            collector_stats().teardown_error();
        }
    }
}

struct DataSubscriber<'a> {
    prefix: Option<&'a str>,
    delivery: SubscriptionDelivery,
    keep_durable_handles: bool,
    shared_queue: QueueHandle,
}

impl DataSubscriber<'_> {
    async fn subscribe(
        &self,
        transport: &mut dyn Transport,
        topic: String,
    ) -> Result<ActiveSubscription, TransportError> {
        let durable_name = self.prefix.map(|p| durable_subscription_name(p, &topic));
        let destination = match self.delivery {
            SubscriptionDelivery::Managed => Destination::Managed,
            SubscriptionDelivery::Queue => Destination::Queue(self.shared_queue),
        };
        let mut request = SubscribeRequest {
            topic,
            durable_name,
            destination,
            resume: false,
        };

        let sub = match transport.subscribe(&request).await {
            Ok(sub) => sub,
            Err(e) if e.reason == MQRC_SUB_ALREADY_EXISTS && request.durable_name.is_some() => {
                request.resume = true;
                transport.subscribe(&request).await?
            }
            Err(e) => return Err(e),
        };

        // A closed durable subscription keeps delivering to a queue the
        // session holds open, but a managed queue goes with its handle
        let mut handle = Some(sub.handle);
        if request.durable_name.is_some()
            && self.delivery == SubscriptionDelivery::Queue
            && !self.keep_durable_handles
        {
            match transport.close_subscription(sub.handle, false).await {
                Ok(()) => handle = None,
                Err(e) => warn!(topic = %request.topic, error = %e, "Could not release durable subscription handle"),
            }
        }

        Ok(ActiveSubscription {
            topic: request.topic,
            durable_name: request.durable_name,
            handle,
            delivery_queue: sub.delivery_queue,
        })
    }
}

fn type_selected(selector: &[String], type_name: &str) -> bool {
    selector.is_empty() || selector.iter().any(|s| s.eq_ignore_ascii_case(type_name))
}

/// Read the metadata tree and open data subscriptions.
/// Returns the number of subscriptions now held.
pub async fn discover(conn: &mut ConnectionInfo) -> Result<usize, CollectError> {
    if !conn.is_connected() {
        return Err(CollectError::NotConnected);
    }
    if !conn.metadata.publications_enabled {
        return Err(CollectError::PublicationsUnavailable);
    }
    let span = crate::publication_span!(session = %conn.key);
    run_discovery(conn).instrument(span).await
}

async fn run_discovery(conn: &mut ConnectionInfo) -> Result<usize, CollectError> {
    let ConnectionInfo {
        transport,
        config,
        metadata,
        handles,
        publications,
        ..
    } = conn;
    let settings = &config.collection;
    let wait = config.wait_interval();
    let qmgr = metadata.queue_manager_name.clone();
    let platform = metadata.platform;

    let command_queue = handles.command.ok_or(CollectError::NotConnected)?;
    let shared = handles.reply.as_ref().ok_or(CollectError::NotConnected)?;
    let status_reply = handles.status_reply.as_ref().unwrap_or(shared);

    close_subscriptions(transport.as_mut(), &mut publications.subscriptions).await;

    let mut chan = CommandChannel::new(transport.as_mut(), command_queue, status_reply, wait);
    if let Some(prefix) = settings.durable_sub_prefix.as_deref() {
        sweep_durable(&mut chan, prefix).await;
    }

    publications.catalog = read_catalog(chan.transport(), &qmgr, wait).await?;

    let needs_queues = publications.catalog.types().any(|(_, t)| t.object_specific);
    let queues = if needs_queues {
        monitored_queues(&mut chan, &PatternList::parse(&settings.queues), platform).await?
    } else {
        Vec::new()
    };

    let mut topics = Vec::new();
    for (class, ty) in publications.catalog.types() {
        if ty.data_topic.is_empty() {
            debug!(class = %class.name, r#type = %ty.name, "Type has no data topic");
            continue;
        }
        if ty.object_specific {
            if !type_selected(&settings.queue_subscription_selector, &ty.name) {
                continue;
            }
            topics.extend(queues.iter().map(|q| expand_topic(&ty.data_topic, &qmgr, Some(q))));
        } else {
            topics.push(expand_topic(&ty.data_topic, &qmgr, None));
        }
    }

    if topics.len() > metadata.max_handles.max(0) as usize {
        warn!(
            subscriptions = topics.len(),
            max_handles = metadata.max_handles,
            "More subscriptions than the queue manager allows handles"
        );
    }

    let subscriber = DataSubscriber {
        prefix: settings.durable_sub_prefix.as_deref(),
        delivery: settings.subscription_delivery,
        keep_durable_handles: settings.keep_durable_handles,
        shared_queue: shared.handle,
    };
    let transport = chan.transport();
    for topic in topics {
        match subscriber.subscribe(transport, topic.clone()).await {
            Ok(sub) => {
                collector_stats().subscription_opened();
                publications.subscriptions.push(sub);
            }
            Err(e) if e.is_connection_lost() => return Err(e.into()),
            Err(e) => warn!(topic = %topic, error = %e, "Subscription failed"),
        }
    }

    info!(
        classes = publications.catalog.classes.len(),
        subscriptions = publications.subscriptions.len(),
        "Publication discovery complete"
    );
    Ok(publications.subscriptions.len())
}

/// Drain every delivery queue and fold the publications into the catalog.
/// Values persist until a later publication overwrites them.
pub async fn process_publications(conn: &mut ConnectionInfo) -> Result<usize, CollectError> {
    if !conn.is_connected() {
        return Err(CollectError::NotConnected);
    }
    if !conn.metadata.publications_enabled {
        return Err(CollectError::PublicationsUnavailable);
    }

    let ConnectionInfo {
        transport,
        publications,
        ..
    } = conn;
    let queues: BTreeSet<QueueHandle> = publications
        .subscriptions
        .iter()
        .map(|s| s.delivery_queue)
        .collect();

    let options = GetOptions {
        wait: Duration::ZERO,
        correl_id: None,
    };
    let mut processed = 0;
    for queue in queues {
        loop {
            let message = match transport.get(queue, &options).await {
                Ok(m) => m,
                Err(e) if e.is_no_message() => break,
                Err(e) => return Err(e.into()),
            };
            match PcfMessage::decode(&message.payload, message.encoding) {
                Ok(msg) => {
                    publications.catalog.apply_data(&msg);
                    collector_stats().publication_processed();
                    processed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable publication");
                    collector_stats().decode_error();
                }
            }
        }
    }
    debug!(processed, "Processed publications");
    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_selection() {
        assert!(type_selected(&[], "GENERAL"));
        let selector = vec!["general".to_string(), "PUT".to_string()];
        assert!(type_selected(&selector, "GENERAL"));
        assert!(!type_selected(&selector, "GET"));
    }
}
