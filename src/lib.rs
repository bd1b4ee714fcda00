//! mqmetric - status and statistics collection for MQ queue managers
//!
//! A client library that speaks the broker's PCF administrative protocol to
//! pull runtime status and performance data out of a queue manager and
//! keeps it in a stable, named attribute model for a metrics exporter.
//!
//! # Overview
//!
//! - PCF wire codec and protocol constants
//! - Session management over an abstract message-queue transport
//! - Per-class attribute registries with delta tracking and status squashing
//! - Status polling for queues, channels, topics, subscriptions, the queue
//!   manager, cluster membership and z/OS storage usage
//! - Resource-statistics publications as an alternative to polling
//! - Metric name derivation from broker element descriptions
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mqmetric::{CollectorConfig, ObjectClass, SessionRegistry};
//! use mqmetric::testing::MockBroker;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CollectorConfig::from_toml(r#"
//! [connection]
//! queue_manager = "QM1"
//!
//! [collection]
//! queues = "APP.*,!APP.TEMP*"
//! "#)?;
//!
//! let mut sessions = SessionRegistry::new();
//! let session = sessions.connect_default(MockBroker::new().transport(), config).await?;
//! session.collect_configured(ObjectClass::Queue).await?;
//!
//! if let Some(set) = session.status_set(ObjectClass::Queue) {
//!     for (attribute, values) in set.snapshot() {
//!         println!("{attribute}: {values:?}");
//!     }
//! }
//! sessions.disconnect_all().await;
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod naming;
pub mod observability;
pub mod protocol;
pub mod publication;
pub mod session;
pub mod status;
pub mod testing;
pub mod transport;

pub use config::{CollectorConfig, ConfigError, SubscriptionDelivery};
pub use error::{CollectError, ConnectError, ConnectStep, ErrorKind, MetricError, MetricResult};
pub use naming::MetricNameMode;
pub use protocol::{Encoding, PcfCommand, PcfMessage, PcfParameter, PcfValue};
pub use publication::PublicationCatalog;
pub use session::{ConnectionInfo, SessionMetadata, SessionRegistry, DEFAULT_SESSION_KEY};
pub use status::{HealthState, ObjectClass, StatusAttribute, StatusSet, StatusValue};
pub use transport::{Transport, TransportError};
