//! A single goal track

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;

use ordered_float::NotNan;

use crate::pose::Translation;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One hypothesis of where a goal is, built from the observations which
/// have been associated with it.
#[derive(Debug, Clone)]
pub struct GoalTrack {
    id: usize,

    /// Observed positions keyed by capture time.
    observed_positions: BTreeMap<NotNan<f64>, Translation>,

    /// Mean of the observed positions, `None` once the track has died.
    smoothed_position: Option<Translation>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GoalTrack {
    /// Start a new track from its first observation.
    pub fn new(timestamp: NotNan<f64>, first_observation: Translation, id: usize) -> Self {
        let mut observed_positions = BTreeMap::new();
        observed_positions.insert(timestamp, first_observation);

        Self {
            id,
            observed_positions,
            smoothed_position: Some(first_observation),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The track is alive while it has observations within the age window.
    pub fn is_alive(&self) -> bool {
        !self.observed_positions.is_empty()
    }

    pub fn smoothed_position(&self) -> Option<Translation> {
        self.smoothed_position
    }

    /// Distance from the smoothed position to `point`, infinite for a dead
    /// track.
    pub fn distance_to(&self, point: &Translation) -> f64 {
        match self.smoothed_position {
            Some(p) => Translation::between(&p, point).norm(),
            None => std::f64::INFINITY,
        }
    }

    /// Add an observation, then drop any which are older than `max_age`
    /// relative to `timestamp`.
    pub fn update(&mut self, timestamp: NotNan<f64>, observation: Translation, max_age: f64) {
        self.observed_positions.insert(timestamp, observation);
        self.prune(timestamp.into_inner(), max_age);
    }

    /// Update without a new observation, ageing the track.
    pub fn empty_update(&mut self, timestamp: NotNan<f64>, max_age: f64) {
        self.prune(timestamp.into_inner(), max_age);
    }

    /// Time of the most recent observation, or zero for a dead track.
    pub fn latest_timestamp(&self) -> f64 {
        self.observed_positions
            .keys()
            .next_back()
            .map(|t| t.into_inner())
            .unwrap_or(0.0)
    }

    /// Fraction of the frames in the age window in which the goal was seen,
    /// capped at 1.
    pub fn stability(&self, camera_frame_rate: f64, max_age: f64) -> f64 {
        (self.observed_positions.len() as f64 / (camera_frame_rate * max_age)).min(1.0)
    }

    fn prune(&mut self, now: f64, max_age: f64) {
        let delete_before = now - max_age;
        self.observed_positions
            .retain(|t, _| t.into_inner() >= delete_before);
        self.smooth();
    }

    fn smooth(&mut self) {
        let n = self.observed_positions.len();
        self.smoothed_position = if n == 0 {
            None
        } else {
            let sum = self
                .observed_positions
                .values()
                .fold(Translation::identity(), |acc, p| acc + *p);
            Some(sum.scale(1.0 / n as f64))
        }
    }
}
