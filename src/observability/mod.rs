//! Logging setup and collector self-telemetry

pub mod logging;
pub mod metrics;

pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{collector_stats, CollectorStats, CollectorStatsSnapshot};

pub use logging::{collection_span, publication_span, session_span};
