//! Motion profiles

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};
use util::maths::epsilon_eq;

use super::{MotionSegment, MotionState, EPSILON};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A sequence of constant acceleration segments, contiguous in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    segments: Vec<MotionSegment>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionProfile {
    /// Create an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a profile from existing segments. The segments are not checked,
    /// see [`MotionProfile::is_valid`].
    pub fn from_segments(segments: Vec<MotionSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[MotionSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Replace the profile with a single zero length segment at
    /// `initial_state`.
    pub fn reset(&mut self, initial_state: MotionState) {
        self.clear();
        self.segments
            .push(MotionSegment::new(initial_state, initial_state));
    }

    /// Whether every segment is valid and each one starts where the previous
    /// one ended.
    pub fn is_valid(&self) -> bool {
        let segments_valid = self.segments.iter().all(|s| s.is_valid());
        let segments_contiguous = self
            .segments
            .windows(2)
            .all(|pair| pair[1].start.coincident(&pair[0].end));

        segments_valid && segments_contiguous
    }

    /// The state at time `t`, or `None` if `t` is outside the profile.
    ///
    /// Times within [`EPSILON`] of either end snap to that end.
    pub fn state_by_time(&self, t: f64) -> Option<MotionState> {
        let start = self.start_state()?;
        let end = self.end_state()?;

        if t < start.t && t + EPSILON >= start.t {
            return Some(start);
        }
        if t > end.t && t - EPSILON <= end.t {
            return Some(end);
        }

        self.segments
            .iter()
            .find(|s| s.contains_time(t))
            .map(|s| s.start.extrapolate(t))
    }

    /// The state at time `t`, holding the first or last state outside the
    /// profile. `None` only if the profile is empty.
    pub fn state_by_time_clamped(&self, t: f64) -> Option<MotionState> {
        let start = self.start_state()?;
        let end = self.end_state()?;

        if t < start.t {
            return Some(start);
        } else if t > end.t {
            return Some(end);
        }

        self.segments
            .iter()
            .find(|s| s.contains_time(t))
            .map(|s| s.start.extrapolate(t))
            .or(Some(end))
    }

    /// The first state in which the profile reaches `pos`.
    pub fn first_state_by_pos(&self, pos: f64) -> Option<MotionState> {
        for s in self.segments.iter() {
            if s.contains_pos(pos) {
                if epsilon_eq(s.end.pos, pos, EPSILON) {
                    return Some(s.end);
                }

                let t = s.start.next_time_at_pos(pos).min(s.end.t);
                if t.is_nan() {
                    warn!("Profile segment contains {} but never reaches it", pos);
                    return None;
                }
                return Some(s.start.extrapolate(t));
            }
        }

        None
    }

    /// Remove everything before time `t`, cutting the segment which contains
    /// `t` so that it starts at `t`.
    pub fn trim_before_time(&mut self, t: f64) {
        let first_kept = self
            .segments
            .iter()
            .position(|s| s.end.t > t)
            .unwrap_or_else(|| self.segments.len());
        self.segments.drain(..first_kept);

        if let Some(first) = self.segments.first_mut() {
            if first.start.t <= t {
                first.start = first.start.extrapolate(t);
            }
        }
    }

    /// Append a segment of constant acceleration `acc` lasting `dt` from the
    /// current end state.
    pub fn append_control(&mut self, acc: f64, dt: f64) {
        let last_end_state = match self.end_state() {
            Some(s) => s,
            None => {
                warn!("Cannot append a control to an empty profile");
                return;
            }
        };

        let new_start_state =
            MotionState::new(last_end_state.t, last_end_state.pos, last_end_state.vel, acc);
        self.append_segment(MotionSegment::new(
            new_start_state,
            new_start_state.extrapolate(new_start_state.t + dt),
        ));
    }

    /// Append a segment. Contiguity is not checked.
    pub fn append_segment(&mut self, segment: MotionSegment) {
        self.segments.push(segment);
    }

    /// Append all of `profile`'s segments.
    pub fn append_profile(&mut self, profile: &MotionProfile) {
        self.segments.extend_from_slice(&profile.segments);
    }

    /// Remove zero length segments, keeping at least one.
    pub fn consolidate(&mut self) {
        if self.segments.is_empty() || !self.is_valid() {
            return;
        }

        let mut i = 0;
        while i < self.segments.len() && self.segments.len() > 1 {
            let s = &self.segments[i];
            if s.start.coincident(&s.end) {
                self.segments.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Mirror every segment about zero position.
    pub fn flip(&mut self) {
        for s in self.segments.iter_mut() {
            *s = s.flipped();
        }
    }

    pub fn start_state(&self) -> Option<MotionState> {
        self.segments.first().map(|s| s.start)
    }

    pub fn end_state(&self) -> Option<MotionState> {
        self.segments.last().map(|s| s.end)
    }

    pub fn start_time(&self) -> f64 {
        self.start_state().map_or(std::f64::NAN, |s| s.t)
    }

    pub fn end_time(&self) -> f64 {
        self.end_state().map_or(std::f64::NAN, |s| s.t)
    }

    pub fn start_pos(&self) -> f64 {
        self.start_state().map_or(std::f64::NAN, |s| s.pos)
    }

    pub fn end_pos(&self) -> f64 {
        self.end_state().map_or(std::f64::NAN, |s| s.pos)
    }

    /// Time from start to end, `NAN` for an empty profile.
    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    /// Total distance travelled, counting motion in both directions.
    pub fn length(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| (s.end.pos - s.start.pos).abs())
            .sum()
    }
}

impl std::fmt::Display for MotionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Profile:")?;
        for s in self.segments.iter() {
            write!(f, "\n\t{} -> {}", s.start, s.end)?;
        }
        Ok(())
    }
}
