//! # Goal tracker
//!
//! Turns the stream of goal positions reported by vision into a small set of
//! tracks, each one a smoothed hypothesis of where a goal is. Tracks smooth
//! out camera jitter and let the robot keep aiming at the same goal when
//! several are visible.
//!
//! Observations are assigned to tracks greedily: tracks are visited in order
//! of creation and each claims the nearest unclaimed observation within
//! `max_tracker_distance`. This is not a globally optimal assignment, so two
//! tracks close to two observations can swap.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod track;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cmp::Ordering;

use log::{debug, warn};
use ordered_float::NotNan;
use serde::Serialize;

use crate::pose::Translation;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::GoalTrackerParams;
pub use track::GoalTrack;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracks the goals seen by vision.
#[derive(Debug, Clone)]
pub struct GoalTracker {
    params: GoalTrackerParams,
    current_tracks: Vec<GoalTrack>,
    next_id: usize,
}

/// Summary of a live track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackReport {
    /// Smoothed position of the goal in the field frame
    pub field_to_goal: Translation,

    /// Time at which the goal was last observed
    pub latest_timestamp: f64,

    /// Fraction of the age window during which the goal was observed, 0 to 1
    pub stability: f64,

    pub id: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GoalTracker {
    pub fn new(params: GoalTrackerParams) -> Self {
        Self {
            params,
            current_tracks: Vec::new(),
            next_id: 0,
        }
    }

    pub fn params(&self) -> &GoalTrackerParams {
        &self.params
    }

    /// Drop all tracks. Ids keep increasing so new tracks are never confused
    /// with old ones.
    pub fn reset(&mut self) {
        self.current_tracks.clear();
    }

    /// Add the goal positions observed at `timestamp`.
    pub fn update(&mut self, timestamp: f64, field_to_goals: &[Translation]) {
        let now = match NotNan::new(timestamp) {
            Ok(t) => t,
            Err(_) => {
                warn!("Ignoring goal observations with a NaN timestamp");
                return;
            }
        };

        let max_age = self.params.max_track_age;
        let max_distance = self.params.max_tracker_distance;
        let mut claimed = vec![false; field_to_goals.len()];

        for track in self.current_tracks.iter_mut() {
            let nearest = field_to_goals
                .iter()
                .enumerate()
                .filter(|(i, _)| !claimed[*i])
                .map(|(i, p)| (i, track.distance_to(p)))
                .filter(|(_, d)| *d < max_distance)
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

            match nearest {
                Some((i, _)) => {
                    claimed[i] = true;
                    track.update(now, field_to_goals[i], max_age);
                }
                None => track.empty_update(now, max_age),
            }
        }

        let num_tracks = self.current_tracks.len();
        self.current_tracks.retain(|t| t.is_alive());
        if self.current_tracks.len() != num_tracks {
            debug!(
                "Dropped {} dead goal track(s)",
                num_tracks - self.current_tracks.len()
            );
        }

        // Only start new tracks once every existing one has died
        if self.current_tracks.is_empty() {
            for goal in field_to_goals {
                debug!("Starting goal track {} at {}", self.next_id, goal);
                self.current_tracks
                    .push(GoalTrack::new(now, *goal, self.next_id));
                self.next_id += 1;
            }
        }
    }

    pub fn has_tracks(&self) -> bool {
        !self.current_tracks.is_empty()
    }

    /// Reports for the live tracks in order of creation.
    pub fn tracks(&self) -> Vec<TrackReport> {
        self.current_tracks
            .iter()
            .filter_map(|t| self.report(t))
            .collect()
    }

    /// Reports for the live tracks, best first.
    ///
    /// Tracks are scored on stability, on how recently they were seen at
    /// time `now`, and get a bonus if they are the track `last_track_id`
    /// which was aimed at before. Equal scores keep their creation order.
    ///
    /// Tracks are only pruned when vision reports, so tracks not seen within
    /// `max_track_age` of `now` are left out here.
    pub fn ranked_tracks(&self, now: f64, last_track_id: Option<usize>) -> Vec<TrackReport> {
        let oldest = now - self.params.max_track_age;

        let mut reports: Vec<(f64, TrackReport)> = self
            .tracks()
            .into_iter()
            .filter(|r| r.latest_timestamp >= oldest)
            .map(|r| (self.score(&r, now, last_track_id), r))
            .collect();

        reports.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        reports.into_iter().map(|(_, r)| r).collect()
    }

    fn report(&self, track: &GoalTrack) -> Option<TrackReport> {
        Some(TrackReport {
            field_to_goal: track.smoothed_position()?,
            latest_timestamp: track.latest_timestamp(),
            stability: track
                .stability(self.params.camera_frame_rate, self.params.max_track_age),
            id: track.id(),
        })
    }

    fn score(&self, report: &TrackReport, now: f64, last_track_id: Option<usize>) -> f64 {
        let max_age = self.params.max_track_age;

        let stability_score = self.params.stability_weight * report.stability;
        let age_score = self.params.age_weight
            * ((max_age - (now - report.latest_timestamp)) / max_age).max(0.0);
        let switching_score = if Some(report.id) == last_track_id {
            self.params.switching_weight
        } else {
            0.0
        };

        stability_score + age_score + switching_score
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_single_detection() {
        let mut tracker = GoalTracker::new(GoalTrackerParams::default());
        assert!(!tracker.has_tracks());

        tracker.update(0.0, &[Translation::new(100.0, 20.0)]);

        let tracks = tracker.tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 0);
        assert_eq!(tracks[0].field_to_goal, Translation::new(100.0, 20.0));
        assert!(tracks[0].stability > 0.0);
    }

    #[test]
    fn test_track_pruned_after_max_age() {
        let mut tracker = GoalTracker::new(GoalTrackerParams::default());
        tracker.update(0.0, &[Translation::new(100.0, 20.0)]);

        tracker.update(0.5, &[]);
        assert!(tracker.has_tracks());

        tracker.update(1.01, &[]);
        assert!(!tracker.has_tracks());
        assert!(tracker.tracks().is_empty());

        // A new detection gets a fresh id
        tracker.update(2.0, &[Translation::new(100.0, 20.0)]);
        assert_eq!(tracker.tracks()[0].id, 1);
    }

    #[test]
    fn test_steady_stream_keeps_one_track() {
        let mut tracker = GoalTracker::new(GoalTrackerParams::default());

        for i in 0..50 {
            let t = i as f64 * 0.1;
            let jitter = if i % 2 == 0 { 2.0 } else { -2.0 };
            tracker.update(t, &[Translation::new(100.0 + jitter, 20.0 - jitter)]);

            let tracks = tracker.tracks();
            assert_eq!(tracks.len(), 1);
            assert_eq!(tracks[0].id, 0);
        }

        // Eleven observations in the one second window at 30 fps
        let report = tracker.tracks()[0];
        assert_abs_diff_eq!(report.stability, 11.0 / 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(report.field_to_goal.x(), 100.0 - 2.0 / 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nearest_observation_claimed() {
        let mut tracker = GoalTracker::new(GoalTrackerParams::default());
        tracker.update(0.0, &[Translation::new(0.0, 0.0), Translation::new(100.0, 0.0)]);
        assert_eq!(tracker.tracks().len(), 2);

        tracker.update(0.1, &[Translation::new(104.0, 0.0), Translation::new(2.0, 0.0)]);

        let tracks = tracker.tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, 0);
        assert_abs_diff_eq!(tracks[0].field_to_goal.x(), 1.0, epsilon = 1e-9);
        assert_eq!(tracks[1].id, 1);
        assert_abs_diff_eq!(tracks[1].field_to_goal.x(), 102.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ranking() {
        let mut tracker = GoalTracker::new(GoalTrackerParams::default());
        tracker.update(0.0, &[Translation::new(0.0, 0.0), Translation::new(100.0, 0.0)]);

        // Only the second goal keeps being seen
        for i in 1..6 {
            tracker.update(i as f64 * 0.1, &[Translation::new(100.0, 0.0)]);
        }

        let ranked = tracker.ranked_tracks(0.5, None);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, 1);

        // The switching bonus outweighs stability and age
        let ranked = tracker.ranked_tracks(0.5, Some(0));
        assert_eq!(ranked[0].id, 0);
    }

    #[test]
    fn test_ranking_skips_tracks_without_recent_vision() {
        let mut tracker = GoalTracker::new(GoalTrackerParams::default());
        tracker.update(0.0, &[Translation::new(0.0, 0.0), Translation::new(100.0, 0.0)]);
        tracker.update(0.8, &[Translation::new(100.0, 0.0)]);

        // Both tracks were seen within the age window
        assert_eq!(tracker.ranked_tracks(1.0, None).len(), 2);

        // Vision goes quiet, only the second track is recent enough
        let ranked = tracker.ranked_tracks(1.5, None);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, 1);

        assert!(tracker.ranked_tracks(100.0, Some(1)).is_empty());
    }
}
