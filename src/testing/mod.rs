//! Testing utilities
//!
//! An in-memory broker implementing the transport trait, and canned command
//! replies and publications to script it with.

pub mod fixtures;
pub mod mocks;

pub use mocks::{BrokerEvent, MockBroker, Responder};
