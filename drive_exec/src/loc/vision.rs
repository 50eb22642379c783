//! # Vision updates
//!
//! Vision runs on its own thread and reports the targets it sees as JSON
//! blobs. Updates are handed to the control loop through a
//! [`VisionMailbox`] which holds only the most recent one, and the
//! [`VisionProcessor`] feeds them into the [`RobotState`] once per cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RobotState;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A target seen by the camera, as a direction in the camera frame.
///
/// `x` points out of the lens and is always 1, `y` is horizontal and `z`
/// vertical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    #[serde(default = "unit_x")]
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The targets seen in one camera frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionUpdate {
    /// Age of the frame when it was reported, in milliseconds
    pub captured_ago_ms: u64,

    /// Time at which the frame was captured, in seconds
    pub captured_at_timestamp: f64,

    pub targets: Vec<TargetInfo>,
}

/// Wire format of a vision update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVisionUpdate {
    #[serde(default)]
    captured_ago_ms: u64,

    #[serde(default)]
    targets: Vec<TargetInfo>,
}

/// Single slot hand-off of vision updates between threads.
///
/// Posting overwrites any update which has not yet been taken.
#[derive(Debug, Default)]
pub struct VisionMailbox {
    slot: Mutex<Option<VisionUpdate>>,
}

/// Drains the mailbox into the robot state once per cycle.
#[derive(Debug, Clone)]
pub struct VisionProcessor {
    mailbox: Arc<VisionMailbox>,
    robot_state: Arc<RobotState>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Cannot parse the vision update: {0}")]
    ParseError(serde_json::Error),

    #[error("The vision update has no capture latency")]
    NoLatency,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TargetInfo {
    pub fn new(y: f64, z: f64) -> Self {
        Self { x: 1.0, y, z }
    }
}

impl VisionUpdate {
    /// Parse an update received at time `now`, for example
    /// `{ "capturedAgoMs": 100, "targets": [{"y": 5.4, "z": 5.5}] }`.
    ///
    /// Updates without a latency can't be placed in time and are rejected.
    pub fn from_json(now: f64, blob: &str) -> Result<Self, VisionError> {
        let raw: RawVisionUpdate = serde_json::from_str(blob).map_err(VisionError::ParseError)?;

        if raw.captured_ago_ms == 0 {
            return Err(VisionError::NoLatency);
        }

        Ok(Self {
            captured_ago_ms: raw.captured_ago_ms,
            captured_at_timestamp: now - raw.captured_ago_ms as f64 / 1000.0,
            targets: raw.targets,
        })
    }
}

impl VisionMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a new update. Returns `true` if an unconsumed update was
    /// dropped to make room for it.
    pub fn post(&self, update: VisionUpdate) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        let dropped = slot.replace(update).is_some();
        if dropped {
            trace!("Dropped stale vision update");
        }
        dropped
    }

    /// Take the pending update, if any.
    pub fn take(&self) -> Option<VisionUpdate> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl VisionProcessor {
    pub fn new(mailbox: Arc<VisionMailbox>, robot_state: Arc<RobotState>) -> Self {
        Self {
            mailbox,
            robot_state,
        }
    }

    /// Feed the pending update into the robot state. Returns `true` if
    /// there was an update.
    pub fn process(&self) -> bool {
        match self.mailbox.take() {
            Some(update) => {
                debug!(
                    "Processing vision update with {} target(s) captured at {:.3} s",
                    update.targets.len(),
                    update.captured_at_timestamp
                );
                self.robot_state
                    .add_vision_update(update.captured_at_timestamp, &update.targets);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn unit_x() -> f64 {
    1.0
}
