//! Collapse fine-grained status codes into three health states
//!
//! Every raw code maps to exactly one state. Codes that are not recognised
//! map to stopped.

use crate::protocol::constants::*;
use serde::{Deserialize, Serialize};

pub const SQUASH_STOPPED: i64 = 0;
pub const SQUASH_TRANSITION: i64 = 1;
pub const SQUASH_RUNNING: i64 = 2;

/// Coarse health state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Stopped,
    Transition,
    Running,
}

impl HealthState {
    pub fn as_i64(self) -> i64 {
        match self {
            HealthState::Stopped => SQUASH_STOPPED,
            HealthState::Transition => SQUASH_TRANSITION,
            HealthState::Running => SQUASH_RUNNING,
        }
    }
}

/// Which raw status vocabulary an attribute carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Squash {
    ChannelStatus,
    QueueManagerStatus,
}

impl Squash {
    pub fn state(self, raw: i64) -> HealthState {
        match self {
            Squash::ChannelStatus => channel_status(raw),
            Squash::QueueManagerStatus => queue_manager_status(raw),
        }
    }

    pub fn apply(self, raw: i64) -> i64 {
        self.state(raw).as_i64()
    }
}

pub fn channel_status(raw: i64) -> HealthState {
    let Ok(code) = i32::try_from(raw) else {
        return HealthState::Stopped;
    };
    match code {
        MQCHS_RUNNING => HealthState::Running,
        MQCHS_BINDING | MQCHS_STARTING | MQCHS_STOPPING | MQCHS_RETRYING | MQCHS_REQUESTING
        | MQCHS_PAUSED | MQCHS_INITIALIZING | MQCHS_SWITCHING => HealthState::Transition,
        MQCHS_INACTIVE | MQCHS_STOPPED | MQCHS_DISCONNECTED => HealthState::Stopped,
        _ => HealthState::Stopped,
    }
}

pub fn queue_manager_status(raw: i64) -> HealthState {
    let Ok(code) = i32::try_from(raw) else {
        return HealthState::Stopped;
    };
    match code {
        MQQMSTA_RUNNING => HealthState::Running,
        MQQMSTA_STARTING | MQQMSTA_QUIESCING => HealthState::Transition,
        _ => HealthState::Stopped,
    }
}
