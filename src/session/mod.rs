//! Broker sessions
//!
//! A [`ConnectionInfo`] owns one transport connection and everything the
//! collector keeps for it: the command and reply queues, the queue
//! manager's metadata, the per-class registries, the definition cache and
//! the publication state. Sessions are independent of each other, so
//! several brokers can be monitored from one process; passes against one
//! session run one at a time.

pub mod registry;

pub use registry::{SessionRegistry, DEFAULT_SESSION_KEY};

use crate::collector::{self, CommandChannel, ObjInfoCache};
use crate::config::{CollectorConfig, ConfigError};
use crate::error::{CollectError, ConnectError, ConnectStep};
use crate::naming;
use crate::observability::collector_stats;
use crate::protocol::constants::*;
use crate::publication::{self, PublicationCatalog, PublicationState};
use crate::status::{self, ObjectClass, ObjectStatus, StatusSet};
use crate::transport::{AttrValue, OpenMode, OpenRequest, OpenedQueue, QueueHandle, Transport};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument};

/// Lowest command level that supports resource-statistics publications
pub const MIN_PUBLICATION_LEVEL: i32 = 900;

/// Name prefix for the dynamic reply queues
const DYNAMIC_QUEUE_PREFIX: &str = "MQMETRIC.*";

/// Queue manager facts discovered at connect time
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetadata {
    pub platform: i32,
    pub command_level: i32,
    pub queue_manager_name: String,
    pub max_handles: i32,
    pub monitoring_q: i32,
    /// Publications were requested and the platform supports them
    pub publications_enabled: bool,
}

impl SessionMetadata {
    fn from_attributes(attrs: &[(i32, AttrValue)], configured_name: &str, use_publications: bool) -> Self {
        let int = |selector: i32, default: i32| {
            attrs
                .iter()
                .find(|(s, _)| *s == selector)
                .and_then(|(_, v)| v.as_int())
                .map(|v| v as i32)
                .unwrap_or(default)
        };
        let name = attrs
            .iter()
            .find(|(s, _)| *s == MQCA_Q_MGR_NAME)
            .and_then(|(_, v)| v.as_str())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(configured_name)
            .to_string();
        let platform = int(MQIA_PLATFORM, MQPL_UNIX);

        Self {
            platform,
            command_level: int(MQIA_COMMAND_LEVEL, 0),
            queue_manager_name: name,
            max_handles: int(MQIA_MAX_HANDLES, 256),
            monitoring_q: int(MQIA_MONITORING_Q, MQMON_OFF),
            publications_enabled: use_publications && platform != MQPL_ZOS,
        }
    }
}

/// Open object handles held by a session
#[derive(Debug, Default)]
pub(crate) struct Handles {
    pub(crate) qmgr: Option<QueueHandle>,
    pub(crate) command: Option<QueueHandle>,
    pub(crate) reply: Option<OpenedQueue>,
    pub(crate) status_reply: Option<OpenedQueue>,
}

/// One connected broker session and its collection state
pub struct ConnectionInfo {
    pub(crate) key: String,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) config: CollectorConfig,
    pub(crate) metadata: SessionMetadata,
    pub(crate) handles: Handles,
    pub(crate) objects: HashMap<ObjectClass, ObjectStatus>,
    pub(crate) obj_info: ObjInfoCache,
    pub(crate) publications: PublicationState,
    connected: bool,
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("key", &self.key)
            .field("metadata", &self.metadata)
            .field("handles", &self.handles)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

/// Establish a session: connect, read the queue manager's metadata and open
/// the command and reply queues. Anything opened before a failure is closed
/// again before the error is returned.
pub async fn connect(
    key: &str,
    transport: Box<dyn Transport>,
    config: CollectorConfig,
) -> Result<ConnectionInfo, ConnectError> {
    let span = crate::session_span!(key = %key, queue_manager = %config.connection.queue_manager);
    let result = establish(key, transport, config).instrument(span).await;
    match &result {
        Ok(conn) => {
            collector_stats().session_connected();
            info!(
                key,
                queue_manager = %conn.metadata.queue_manager_name,
                platform = conn.metadata.platform,
                command_level = conn.metadata.command_level,
                publications = conn.metadata.publications_enabled,
                "Session established"
            );
        }
        Err(e) => {
            collector_stats().connect_failed();
            error!(key, error = %e, "Session establishment failed");
        }
    }
    result
}

async fn establish(
    key: &str,
    mut transport: Box<dyn Transport>,
    config: CollectorConfig,
) -> Result<ConnectionInfo, ConnectError> {
    let options = config.connect_options().map_err(|e| match e {
        ConfigError::EnvVarNotFound(name) => ConnectError::MissingCredential(name),
        other => ConnectError::MissingCredential(other.to_string()),
    })?;

    transport
        .connect(&options)
        .await
        .map_err(ConnectError::at(ConnectStep::Connect))?;
    debug!("Transport connected");

    let mut handles = Handles::default();
    let metadata = match open_session(transport.as_mut(), &config, &mut handles).await {
        Ok(metadata) => metadata,
        Err(e) => {
            close_queues(transport.as_mut(), &mut handles).await;
            if let Err(close_err) = transport.disconnect().await {
                warn!(error = %close_err, "Disconnect after failed connect also failed");
            }
            return Err(e);
        }
    };

    if let Err(current) = naming::set_mode(config.naming.metric_names) {
        warn!(
            requested = ?config.naming.metric_names,
            current = ?current,
            "Metric name mode is already set for this process, keeping it"
        );
    }

    let refresh = Duration::from_secs(config.collection.rediscover_interval_secs);
    Ok(ConnectionInfo {
        key: key.to_string(),
        transport,
        config,
        metadata,
        handles,
        objects: HashMap::new(),
        obj_info: ObjInfoCache::new(refresh),
        publications: PublicationState::default(),
        connected: true,
    })
}

async fn open_session(
    transport: &mut dyn Transport,
    config: &CollectorConfig,
    handles: &mut Handles,
) -> Result<SessionMetadata, ConnectError> {
    let conn = &config.connection;
    let settings = &config.collection;

    let qmgr = transport
        .open(&OpenRequest::queue_manager())
        .await
        .map_err(ConnectError::at(ConnectStep::OpenQueueManager))?;
    handles.qmgr = Some(qmgr.handle);

    let selectors = [
        MQIA_PLATFORM,
        MQIA_COMMAND_LEVEL,
        MQIA_MAX_HANDLES,
        MQIA_MONITORING_Q,
        MQCA_Q_MGR_NAME,
    ];
    let attrs = transport
        .inquire(qmgr.handle, &selectors)
        .await
        .map_err(ConnectError::at(ConnectStep::InquireQueueManager))?;
    let metadata = SessionMetadata::from_attributes(&attrs, &conn.queue_manager, settings.use_publications);

    if metadata.publications_enabled && metadata.command_level < MIN_PUBLICATION_LEVEL {
        return Err(ConnectError::UnsupportedVersion {
            level: metadata.command_level,
            required: MIN_PUBLICATION_LEVEL,
        });
    }
    if settings.use_publications && !metadata.publications_enabled {
        info!(platform = metadata.platform, "Publications unavailable on this platform, polling only");
    }

    if settings.require_queue_monitoring && metadata.monitoring_q == MQMON_NONE {
        return Err(ConnectError::EventMonitoringDisabled {
            queue_manager: metadata.queue_manager_name.clone(),
        });
    }

    let command = transport
        .open(&OpenRequest::queue(&conn.command_queue, OpenMode::Output))
        .await
        .map_err(ConnectError::at(ConnectStep::OpenCommandQueue))?;
    handles.command = Some(command.handle);

    let reply = transport
        .open(&OpenRequest::dynamic(&conn.reply_queue, DYNAMIC_QUEUE_PREFIX))
        .await
        .map_err(ConnectError::at(ConnectStep::OpenReplyQueue))?;
    debug!(queue = %reply.name, "Reply queue opened");
    handles.reply = Some(reply);

    if let Some(model) = &conn.reply_queue2 {
        let status_reply = transport
            .open(&OpenRequest::dynamic(model, DYNAMIC_QUEUE_PREFIX))
            .await
            .map_err(ConnectError::at(ConnectStep::OpenStatusReplyQueue))?;
        debug!(queue = %status_reply.name, "Status reply queue opened");
        handles.status_reply = Some(status_reply);
    }

    Ok(metadata)
}

/// Close every open queue handle, logging failures
async fn close_queues(transport: &mut dyn Transport, handles: &mut Handles) {
    let opened = [
        handles.status_reply.take().map(|q| q.handle),
        handles.reply.take().map(|q| q.handle),
        handles.command.take(),
        handles.qmgr.take(),
    ];
    for handle in opened.into_iter().flatten() {
        if let Err(e) = transport.close(handle).await {
            warn!(handle = handle.0, error = %e, "Failed to close queue");
            collector_stats().teardown_error();
        }
    }
}

impl ConnectionInfo {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn is_connected(&self) -> bool {
        self.connected && self.transport.is_connected()
    }

    pub fn resolved_queue_manager_name(&self) -> &str {
        &self.metadata.queue_manager_name
    }

    pub fn platform(&self) -> i32 {
        self.metadata.platform
    }

    pub fn command_level(&self) -> i32 {
        self.metadata.command_level
    }

    /// Populate a class's attribute table if that has not happened yet.
    /// Returns whether work was done.
    pub fn init_attributes(&mut self, class: ObjectClass) -> bool {
        let platform = self.metadata.platform;
        self.objects
            .entry(class)
            .or_insert_with(|| ObjectStatus::new(class))
            .init(platform)
    }

    /// Run one status collection pass
    pub async fn collect(&mut self, class: ObjectClass, patterns: &str) -> Result<(), CollectError> {
        collector::collect(self, class, patterns).await
    }

    /// Run one pass with the pattern list configured for the class
    pub async fn collect_configured(&mut self, class: ObjectClass) -> Result<(), CollectError> {
        let patterns = self.patterns_for(class).to_string();
        collector::collect(self, class, &patterns).await
    }

    /// Configured pattern list of a class. Classes polled without names get
    /// an empty list.
    pub fn patterns_for(&self, class: ObjectClass) -> &str {
        let settings = &self.config.collection;
        match class {
            ObjectClass::Queue => &settings.queues,
            ObjectClass::Channel => &settings.channels,
            ObjectClass::AmqpChannel => &settings.amqp_channels,
            ObjectClass::MqttChannel => &settings.mqtt_channels,
            ObjectClass::Topic => &settings.topics,
            ObjectClass::Subscription => &settings.subscriptions,
            ObjectClass::Cluster => "*",
            ObjectClass::QueueManager | ObjectClass::UsageBufferPool | ObjectClass::UsagePageSet => "",
        }
    }

    pub fn object_status(&self, class: ObjectClass) -> Option<&ObjectStatus> {
        self.objects.get(&class)
    }

    /// Attribute table and current values of a class
    pub fn status_set(&self, class: ObjectClass) -> Option<&StatusSet> {
        self.objects.get(&class).map(ObjectStatus::status_set)
    }

    /// Exported value of a raw reading. Unknown attributes are treated as
    /// plain non-negative gauges.
    pub fn normalize(&self, class: ObjectClass, attribute: &str, raw: i64) -> f64 {
        match self.status_set(class).and_then(|s| s.attribute(attribute)) {
            Some(attr) => status::normalize(attr, raw),
            None => raw.max(0) as f64,
        }
    }

    /// Cached definition data
    pub fn obj_info(&self) -> &ObjInfoCache {
        &self.obj_info
    }

    /// Read the publication metadata and open data subscriptions
    pub async fn discover_publications(&mut self) -> Result<usize, CollectError> {
        publication::discover(self).await
    }

    /// Drain delivered publications into the catalog
    pub async fn process_publications(&mut self) -> Result<usize, CollectError> {
        publication::process_publications(self).await
    }

    pub fn publication_catalog(&self) -> &PublicationCatalog {
        self.publications.catalog()
    }

    pub fn publications(&self) -> &PublicationState {
        &self.publications
    }

    /// Hand the values gathered since the last call to the caller and
    /// reset them. DELTA elements sum every publication in between.
    pub fn take_publication_values(&mut self) -> BTreeMap<(i32, i32, i32), HashMap<String, f64>> {
        self.publications.catalog.take_values()
    }

    /// Tear the session down: subscriptions first, then queues, then the
    /// connection. Every step runs whatever the previous ones reported.
    pub async fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        let span = crate::session_span!(key = %self.key, queue_manager = %self.metadata.queue_manager_name);
        self.teardown().instrument(span).await;
    }

    async fn teardown(&mut self) {
        let sweep = self.metadata.publications_enabled;
        let Self {
            transport,
            config,
            handles,
            publications,
            ..
        } = self;

        publication::close_subscriptions(transport.as_mut(), &mut publications.subscriptions).await;

        if let (Some(prefix), Some(command), Some(reply)) = (
            config.collection.durable_sub_prefix.as_deref(),
            handles.command,
            handles.status_reply.as_ref().or(handles.reply.as_ref()),
        ) {
            if sweep {
                let mut chan = CommandChannel::new(transport.as_mut(), command, reply, config.wait_interval());
                publication::sweep_durable(&mut chan, prefix).await;
            }
        }

        close_queues(transport.as_mut(), handles).await;

        if let Err(e) = transport.disconnect().await {
            warn!(error = %e, "Disconnect failed");
            collector_stats().teardown_error();
        }
        self.connected = false;
        info!("Session closed");
    }
}
