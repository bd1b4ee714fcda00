//! In-memory broker for tests
//!
//! [`MockBroker`] implements [`Transport`] and plays the command server:
//! requests put to the command queue are answered by scripted responders and
//! the replies are queued, correlated, on the request's reply-to queue. It
//! also keeps topics with retained publications and durable subscription
//! records, and logs everything the collector does to it.

use super::fixtures;
use crate::protocol::constants::*;
use crate::protocol::{Encoding, PcfMessage, PcfParameter};
use crate::transport::{
    AttrValue, ConnectOptions, Destination, GetOptions, Message, ObjectKind, OpenRequest,
    OpenedQueue, QueueHandle, SubscribeRequest, Subscription, SubscriptionHandle, Transport,
    TransportError, NO_ID,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Scripted answer to one command: the replies to queue, in order
pub type Responder = Arc<dyn Fn(&PcfMessage) -> Vec<PcfMessage> + Send + Sync>;

/// Something the collector did to the broker
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    Connect,
    Disconnect,
    Open(String),
    Close(String),
    Subscribe { topic: String, durable_name: Option<String>, resume: bool },
    CloseSubscription { topic: String, remove: bool },
}

#[derive(Debug, Clone)]
struct SubState {
    topic: String,
    durable_name: Option<String>,
    queue: String,
    /// Handle of the broker-managed delivery queue, released with the
    /// subscription
    managed: Option<u32>,
}

#[derive(Debug, Clone)]
struct DurableRecord {
    topic: String,
    queue: String,
}

struct BrokerState {
    qmgr_attrs: Vec<(i32, AttrValue)>,
    command_queue: String,
    responders: HashMap<i32, Responder>,
    queues: HashMap<String, VecDeque<Message>>,
    handles: HashMap<u32, String>,
    next_handle: u32,
    retained: HashMap<String, Vec<PcfMessage>>,
    subscriptions: BTreeMap<u32, SubState>,
    durable: BTreeMap<String, DurableRecord>,
    requests: Vec<PcfMessage>,
    events: Vec<BrokerEvent>,
    failures: HashMap<String, i32>,
}

impl Default for BrokerState {
    fn default() -> Self {
        Self {
            qmgr_attrs: vec![
                (MQIA_PLATFORM, AttrValue::Int(MQPL_UNIX as i64)),
                (MQIA_COMMAND_LEVEL, AttrValue::Int(930)),
                (MQIA_MAX_HANDLES, AttrValue::Int(256)),
                (MQIA_MONITORING_Q, AttrValue::Int(MQMON_OFF as i64)),
                (MQCA_Q_MGR_NAME, AttrValue::Str("QM1".to_string())),
            ],
            command_queue: "SYSTEM.ADMIN.COMMAND.QUEUE".to_string(),
            responders: HashMap::new(),
            queues: HashMap::new(),
            handles: HashMap::new(),
            next_handle: 1,
            retained: HashMap::new(),
            subscriptions: BTreeMap::new(),
            durable: BTreeMap::new(),
            requests: Vec::new(),
            events: Vec::new(),
            failures: HashMap::new(),
        }
    }
}

impl BrokerState {
    fn check(&self, operation: &'static str, detail: Option<&str>) -> Result<(), TransportError> {
        let keyed = detail.and_then(|d| self.failures.get(&format!("{operation}:{d}")));
        match keyed.or_else(|| self.failures.get(operation)) {
            Some(&reason) => Err(TransportError::new(operation, reason)),
            None => Ok(()),
        }
    }

    fn allocate(&mut self, queue: &str) -> QueueHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(handle, queue.to_string());
        self.queues.entry(queue.to_string()).or_default();
        QueueHandle(handle)
    }

    fn queue_name(&self, handle: QueueHandle, operation: &'static str) -> Result<String, TransportError> {
        self.handles
            .get(&handle.0)
            .cloned()
            .ok_or_else(|| TransportError::new(operation, MQRC_HOBJ_ERROR))
    }

    fn enqueue(&mut self, queue: &str, msg: &PcfMessage, correl_id: [u8; MQ_MSG_ID_LENGTH], encoding: Encoding) {
        let message = Message {
            payload: msg.encode(encoding),
            msg_id: NO_ID,
            correl_id,
            reply_to_queue: String::new(),
            format: MQFMT_ADMIN.to_string(),
            encoding,
        };
        self.queues.entry(queue.to_string()).or_default().push_back(message);
    }

    fn answer(&self, request: &PcfMessage) -> Vec<PcfMessage> {
        let command = request.header.command;
        if let Some(responder) = self.responders.get(&command) {
            return responder(request);
        }
        if command == MQCMD_INQUIRE_SUBSCRIPTION {
            return self.list_durable(request);
        }
        vec![fixtures::error_reply(command, MQCC_FAILED, MQRCCF_NONE_FOUND)]
    }

    fn list_durable(&self, request: &PcfMessage) -> Vec<PcfMessage> {
        let pattern = request.find_str(MQCACF_SUB_NAME).unwrap_or("*");
        let rows: Vec<Vec<PcfParameter>> = self
            .durable
            .iter()
            .filter(|(name, _)| glob_match(pattern, name))
            .map(|(name, record)| {
                vec![
                    PcfParameter::string(MQCACF_SUB_NAME, name),
                    PcfParameter::string(MQCA_TOPIC_STRING, &record.topic),
                ]
            })
            .collect();
        if rows.is_empty() {
            return vec![fixtures::error_reply(MQCMD_INQUIRE_SUBSCRIPTION, MQCC_FAILED, MQRCCF_NONE_FOUND)];
        }
        fixtures::paged(MQCMD_INQUIRE_SUBSCRIPTION, rows)
    }

    /// Queues a publication on `topic` reaches: open non-durable
    /// subscriptions and every durable subscription whose queue still exists
    fn destinations(&self, topic: &str) -> Vec<String> {
        let mut queues: Vec<String> = self
            .subscriptions
            .values()
            .filter(|s| s.topic == topic && s.durable_name.is_none())
            .map(|s| s.queue.clone())
            .collect();
        queues.extend(
            self.durable
                .values()
                .filter(|d| d.topic == topic && self.queues.contains_key(&d.queue))
                .map(|d| d.queue.clone()),
        );
        queues.sort();
        queues.dedup();
        queues
    }
}

fn glob_match(pattern: &str, name: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => pattern == name,
    }
}

/// Scripted in-memory broker. Clones share state, so a test keeps one clone
/// to script and inspect while the session owns another.
#[derive(Clone, Default)]
pub struct MockBroker {
    state: Arc<Mutex<BrokerState>>,
    connected: Arc<AtomicBool>,
}

impl fmt::Debug for MockBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBroker")
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed clone, ready to hand to a session
    pub fn transport(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }

    /// Replace one queue manager attribute
    pub async fn set_attribute(&self, selector: i32, value: AttrValue) {
        let mut state = self.state.lock().await;
        state.qmgr_attrs.retain(|(s, _)| *s != selector);
        state.qmgr_attrs.push((selector, value));
    }

    pub async fn set_platform(&self, platform: i32) {
        self.set_attribute(MQIA_PLATFORM, AttrValue::Int(platform as i64)).await;
    }

    pub async fn set_command_level(&self, level: i32) {
        self.set_attribute(MQIA_COMMAND_LEVEL, AttrValue::Int(level as i64)).await;
    }

    /// Answer every request with command code `command` using `responder`
    pub async fn on_command<F>(&self, command: i32, responder: F)
    where
        F: Fn(&PcfMessage) -> Vec<PcfMessage> + Send + Sync + 'static,
    {
        self.state.lock().await.responders.insert(command, Arc::new(responder));
    }

    /// Make every call of `operation` fail with `reason`
    pub async fn fail(&self, operation: &str, reason: i32) {
        self.state.lock().await.failures.insert(operation.to_string(), reason);
    }

    /// Make opening the named object fail with `reason`
    pub async fn fail_open(&self, name: &str, reason: i32) {
        self.state.lock().await.failures.insert(format!("open:{name}"), reason);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Store a retained publication, delivered to every later subscriber
    pub async fn retain(&self, topic: &str, publication: PcfMessage) {
        self.state
            .lock()
            .await
            .retained
            .entry(topic.to_string())
            .or_default()
            .push(publication);
    }

    /// Publish to current subscribers. Returns how many queues it reached.
    pub async fn publish(&self, topic: &str, publication: &PcfMessage) -> usize {
        let mut state = self.state.lock().await;
        let queues = state.destinations(topic);
        for queue in &queues {
            state.enqueue(queue, publication, NO_ID, Encoding::default());
        }
        queues.len()
    }

    /// Pre-existing durable subscription, as left behind by an earlier run
    pub async fn add_durable(&self, name: &str, topic: &str) {
        self.state.lock().await.durable.insert(
            name.to_string(),
            DurableRecord {
                topic: topic.to_string(),
                queue: String::new(),
            },
        );
    }

    pub async fn durable_names(&self) -> Vec<String> {
        self.state.lock().await.durable.keys().cloned().collect()
    }

    /// Topics of the subscriptions currently open
    pub async fn open_subscriptions(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .subscriptions
            .values()
            .map(|s| s.topic.clone())
            .collect()
    }

    /// Every decoded request the command server received
    pub async fn requests(&self) -> Vec<PcfMessage> {
        self.state.lock().await.requests.clone()
    }

    pub async fn requests_for(&self, command: i32) -> Vec<PcfMessage> {
        self.state
            .lock()
            .await
            .requests
            .iter()
            .filter(|r| r.header.command == command)
            .cloned()
            .collect()
    }

    pub async fn events(&self) -> Vec<BrokerEvent> {
        self.state.lock().await.events.clone()
    }

    pub async fn clear_history(&self) {
        let mut state = self.state.lock().await;
        state.requests.clear();
        state.events.clear();
    }

    /// Names of the queues currently open
    pub async fn open_queues(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut names: Vec<String> = state.handles.values().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl Transport for MockBroker {
    async fn connect(&mut self, _options: &ConnectOptions) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        state.check("connect", None)?;
        state.events.push(BrokerEvent::Connect);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        state.events.push(BrokerEvent::Disconnect);
        self.connected.store(false, Ordering::SeqCst);
        state.check("disconnect", None)
    }

    async fn open(&mut self, request: &OpenRequest) -> Result<OpenedQueue, TransportError> {
        let mut state = self.state.lock().await;
        let name = match (&request.kind, &request.dynamic_prefix) {
            (ObjectKind::QueueManager, _) => "QMGR".to_string(),
            (ObjectKind::Queue, Some(prefix)) => {
                format!("{}{:08X}", prefix.trim_end_matches('*'), state.next_handle)
            }
            (ObjectKind::Queue, None) => request.name.clone(),
        };
        state.check("open", Some(&request.name))?;
        state.events.push(BrokerEvent::Open(name.clone()));
        let handle = state.allocate(&name);
        Ok(OpenedQueue { handle, name })
    }

    async fn close(&mut self, handle: QueueHandle) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        let name = state.queue_name(handle, "close")?;
        state.handles.remove(&handle.0);
        state.events.push(BrokerEvent::Close(name));
        state.check("close", None)
    }

    async fn put(&mut self, handle: QueueHandle, message: Message) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        state.check("put", None)?;
        let name = state.queue_name(handle, "put")?;
        if name != state.command_queue {
            state.queues.entry(name).or_default().push_back(message);
            return Ok(());
        }

        let request = PcfMessage::decode(&message.payload, message.encoding)
            .map_err(|_| TransportError::new("put", MQRCCF_Q_MGR_CCSID_ERROR))?;
        let replies = state.answer(&request);
        state.requests.push(request);
        for reply in &replies {
            state.enqueue(&message.reply_to_queue, reply, message.msg_id, message.encoding);
        }
        Ok(())
    }

    async fn get(&mut self, handle: QueueHandle, options: &GetOptions) -> Result<Message, TransportError> {
        let mut state = self.state.lock().await;
        state.check("get", None)?;
        let name = state.queue_name(handle, "get")?;
        let queue = state.queues.entry(name).or_default();
        let position = match options.correl_id {
            Some(id) => queue.iter().position(|m| m.correl_id == id),
            None => (!queue.is_empty()).then_some(0),
        };
        position
            .and_then(|i| queue.remove(i))
            .ok_or_else(|| TransportError::new("get", MQRC_NO_MSG_AVAILABLE))
    }

    async fn inquire(&mut self, handle: QueueHandle, selectors: &[i32]) -> Result<Vec<(i32, AttrValue)>, TransportError> {
        let state = self.state.lock().await;
        state.check("inquire", None)?;
        state.queue_name(handle, "inquire")?;
        Ok(state
            .qmgr_attrs
            .iter()
            .filter(|(s, _)| selectors.contains(s))
            .cloned()
            .collect())
    }

    async fn subscribe(&mut self, request: &SubscribeRequest) -> Result<Subscription, TransportError> {
        let mut state = self.state.lock().await;
        state.check("subscribe", Some(&request.topic))?;
        state.events.push(BrokerEvent::Subscribe {
            topic: request.topic.clone(),
            durable_name: request.durable_name.clone(),
            resume: request.resume,
        });

        if let Some(name) = &request.durable_name {
            let exists = state.durable.contains_key(name);
            if exists && !request.resume {
                return Err(TransportError::new("subscribe", MQRC_SUB_ALREADY_EXISTS));
            }
            if !exists && request.resume {
                return Err(TransportError::new("subscribe", MQRC_NO_SUBSCRIPTION));
            }
        }

        let (delivery_queue, managed) = match request.destination {
            Destination::Queue(handle) => (handle, None),
            Destination::Managed => {
                let name = format!("SYSTEM.MANAGED.{:08X}", state.next_handle);
                let handle = state.allocate(&name);
                (handle, Some(handle.0))
            }
        };
        let queue = state.queue_name(delivery_queue, "subscribe")?;

        let handle = state.next_handle;
        state.next_handle += 1;
        state.subscriptions.insert(
            handle,
            SubState {
                topic: request.topic.clone(),
                durable_name: request.durable_name.clone(),
                queue: queue.clone(),
                managed,
            },
        );
        if let Some(name) = &request.durable_name {
            state.durable.insert(
                name.clone(),
                DurableRecord {
                    topic: request.topic.clone(),
                    queue: queue.clone(),
                },
            );
        }

        let retained = state.retained.get(&request.topic).cloned().unwrap_or_default();
        for publication in &retained {
            state.enqueue(&queue, publication, NO_ID, Encoding::default());
        }

        Ok(Subscription {
            handle: SubscriptionHandle(handle),
            delivery_queue,
        })
    }

    async fn close_subscription(&mut self, handle: SubscriptionHandle, remove: bool) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        let sub = state
            .subscriptions
            .remove(&handle.0)
            .ok_or_else(|| TransportError::new("close_subscription", MQRC_HOBJ_ERROR))?;
        state.events.push(BrokerEvent::CloseSubscription {
            topic: sub.topic.clone(),
            remove,
        });
        if let Some(managed) = sub.managed {
            state.handles.remove(&managed);
        }
        if remove {
            if let Some(name) = &sub.durable_name {
                state.durable.remove(name);
            }
        }
        state.check("close_subscription", None)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PcfCommand;
    use crate::transport::OpenMode;
    use std::time::Duration;

    fn no_wait(correl_id: Option<[u8; MQ_MSG_ID_LENGTH]>) -> GetOptions {
        GetOptions {
            wait: Duration::ZERO,
            correl_id,
        }
    }

    #[tokio::test]
    async fn test_replies_are_correlated_to_the_request() {
        let broker = MockBroker::new();
        broker
            .on_command(MQCMD_INQUIRE_Q_MGR_STATUS, |req| {
                vec![fixtures::reply(req.header.command, vec![], true)]
            })
            .await;

        let mut transport = broker.clone();
        let command = transport
            .open(&OpenRequest::queue("SYSTEM.ADMIN.COMMAND.QUEUE", OpenMode::Output))
            .await
            .unwrap();
        let reply = transport
            .open(&OpenRequest::dynamic("SYSTEM.DEFAULT.MODEL.QUEUE", "MQMETRIC.*"))
            .await
            .unwrap();
        assert!(reply.name.starts_with("MQMETRIC."));

        let mut id = NO_ID;
        id[0] = 7;
        let payload = PcfCommand::new(MQCMD_INQUIRE_Q_MGR_STATUS).encode(Encoding::default());
        transport
            .put(command.handle, Message::admin(payload, id, &reply.name, Encoding::default()))
            .await
            .unwrap();

        let other = transport.get(reply.handle, &no_wait(Some(NO_ID))).await.unwrap_err();
        assert!(other.is_no_message());
        let got = transport.get(reply.handle, &no_wait(Some(id))).await.unwrap();
        assert_eq!(got.correl_id, id);
        assert_eq!(broker.requests_for(MQCMD_INQUIRE_Q_MGR_STATUS).await.len(), 1);
    }

    #[tokio::test]
    async fn test_durable_subscription_conflicts() {
        let broker = MockBroker::new();
        broker.add_durable("PFX_$SYS/A", "$SYS/A").await;
        let mut transport = broker.clone();

        let mut request = SubscribeRequest {
            topic: "$SYS/A".to_string(),
            durable_name: Some("PFX_$SYS/A".to_string()),
            destination: Destination::Managed,
            resume: false,
        };
        let err = transport.subscribe(&request).await.unwrap_err();
        assert_eq!(err.reason, MQRC_SUB_ALREADY_EXISTS);

        request.resume = true;
        let sub = transport.subscribe(&request).await.unwrap();
        transport.close_subscription(sub.handle, true).await.unwrap();
        assert!(broker.durable_names().await.is_empty());
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("PFX_*", "PFX_$SYS/A"));
        assert!(!glob_match("PFX_*", "OTHER"));
        assert!(glob_match("EXACT", "EXACT"));
    }
}
