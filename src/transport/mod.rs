//! Transport boundary to the queue manager
//!
//! The collector never talks to a concrete client library. It consumes the
//! small capability set below: open and close queues, put a message, get a
//! message with a bounded wait and optional correlation match, inquire a few
//! object attributes, and create or close topic subscriptions. A binding to a
//! real client implements [`Transport`]; tests use
//! [`crate::testing::mocks::MockBroker`].

use crate::protocol::constants::*;
use crate::protocol::Encoding;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Message or correlation identifier
pub type MessageId = [u8; MQ_MSG_ID_LENGTH];

/// All-zero identifier, meaning "none" on the wire
pub const NO_ID: MessageId = [0u8; MQ_MSG_ID_LENGTH];

/// Opaque handle to an open queue or queue manager object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueHandle(pub u32);

/// Opaque handle to an open subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u32);

/// Options for establishing the connection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectOptions {
    pub queue_manager: String,
    /// Client (network) mode rather than local bindings
    pub client_mode: bool,
    /// `host(port)` list for client mode
    pub connection_name: Option<String>,
    /// Server-connection channel for client mode
    pub channel: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub application_name: String,
}

/// What kind of object is being opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Queue,
    QueueManager,
}

/// How a queue is to be used once open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Put only
    Output,
    /// Get only, no other reader
    ExclusiveInput,
    /// Attribute inquiry only
    Inquire,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    pub kind: ObjectKind,
    /// Object name. For a model queue this names the model and a dynamic
    /// queue is created from it.
    pub name: String,
    pub mode: OpenMode,
    /// Name prefix for a dynamic queue created from a model
    pub dynamic_prefix: Option<String>,
}

impl OpenRequest {
    pub fn queue(name: &str, mode: OpenMode) -> Self {
        Self {
            kind: ObjectKind::Queue,
            name: name.to_string(),
            mode,
            dynamic_prefix: None,
        }
    }

    pub fn dynamic(model: &str, prefix: &str) -> Self {
        Self {
            kind: ObjectKind::Queue,
            name: model.to_string(),
            mode: OpenMode::ExclusiveInput,
            dynamic_prefix: Some(prefix.to_string()),
        }
    }

    pub fn queue_manager() -> Self {
        Self {
            kind: ObjectKind::QueueManager,
            name: String::new(),
            mode: OpenMode::Inquire,
            dynamic_prefix: None,
        }
    }
}

/// An opened object and the name it actually resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedQueue {
    pub handle: QueueHandle,
    pub name: String,
}

/// A message as seen by the collector
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub payload: Bytes,
    pub msg_id: MessageId,
    pub correl_id: MessageId,
    pub reply_to_queue: String,
    pub format: String,
    pub encoding: Encoding,
}

impl Message {
    /// An administrative request asking for replies on `reply_to_queue`
    pub fn admin(payload: Bytes, msg_id: MessageId, reply_to_queue: &str, encoding: Encoding) -> Self {
        Self {
            payload,
            msg_id,
            correl_id: NO_ID,
            reply_to_queue: reply_to_queue.to_string(),
            format: MQFMT_ADMIN.to_string(),
            encoding,
        }
    }
}

/// Options for a get
#[derive(Debug, Clone, PartialEq)]
pub struct GetOptions {
    /// Longest time to wait for a message to arrive
    pub wait: Duration,
    /// Only accept a message with this correlation identifier
    pub correl_id: Option<MessageId>,
}

/// Attribute value returned from an inquire
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Str(String),
}

impl AttrValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s.as_str()),
            AttrValue::Int(_) => None,
        }
    }
}

/// Where publications for a subscription are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The broker creates and owns a queue for this subscription
    Managed,
    /// Deliver onto a queue the caller already holds open
    Queue(QueueHandle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeRequest {
    pub topic: String,
    /// Durable subscriptions carry a name; non-durable ones do not
    pub durable_name: Option<String>,
    pub destination: Destination,
    /// Reattach to an existing durable subscription instead of creating one
    pub resume: bool,
}

/// An open subscription and the queue its publications arrive on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub delivery_queue: QueueHandle,
}

/// Failure reported by the transport, in completion/reason code terms
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{operation} failed: completion code {comp_code}, reason {reason}")]
pub struct TransportError {
    pub operation: &'static str,
    pub comp_code: i32,
    pub reason: i32,
}

impl TransportError {
    pub fn new(operation: &'static str, reason: i32) -> Self {
        Self {
            operation,
            comp_code: MQCC_FAILED,
            reason,
        }
    }

    /// The normal outcome of a get that found nothing within its wait
    pub fn is_no_message(&self) -> bool {
        self.reason == MQRC_NO_MSG_AVAILABLE
    }

    /// Authentication and authorization failures
    pub fn is_not_authorized(&self) -> bool {
        self.reason == MQRC_NOT_AUTHORIZED
    }

    /// The session itself is gone and must be re-established
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self.reason,
            MQRC_CONNECTION_BROKEN | MQRC_Q_MGR_NOT_AVAILABLE | MQRC_HOST_NOT_AVAILABLE
        )
    }
}

/// Message-queue capability set consumed by the collector
#[async_trait]
pub trait Transport: Send {
    /// Connect to the queue manager
    async fn connect(&mut self, options: &ConnectOptions) -> Result<(), TransportError>;

    /// Disconnect from the queue manager
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Open a queue or the queue manager object
    async fn open(&mut self, request: &OpenRequest) -> Result<OpenedQueue, TransportError>;

    /// Close a previously opened object
    async fn close(&mut self, handle: QueueHandle) -> Result<(), TransportError>;

    /// Put one message
    async fn put(&mut self, handle: QueueHandle, message: Message) -> Result<(), TransportError>;

    /// Get one message, waiting at most `options.wait`
    async fn get(
        &mut self,
        handle: QueueHandle,
        options: &GetOptions,
    ) -> Result<Message, TransportError>;

    /// Inquire integer and string attributes of an open object
    async fn inquire(
        &mut self,
        handle: QueueHandle,
        selectors: &[i32],
    ) -> Result<Vec<(i32, AttrValue)>, TransportError>;

    /// Create or resume a subscription
    async fn subscribe(&mut self, request: &SubscribeRequest)
        -> Result<Subscription, TransportError>;

    /// Close a subscription, removing it from the broker when `remove` is set
    async fn close_subscription(
        &mut self,
        handle: SubscriptionHandle,
        remove: bool,
    ) -> Result<(), TransportError>;

    /// Check if the transport believes it is connected
    fn is_connected(&self) -> bool;
}
