//! Smooth progress display between snapshots.

use std::time::Instant;

use super::state::PlaybackSnapshot;

/// Interpolates track progress between snapshot arrivals.
///
/// The remote service only reports progress when a snapshot lands, which can
/// be seconds apart; a progress bar redrawn every frame needs more. Whenever
/// the snapshot's progress differs from the last one seen, the current time
/// is captured as an anchor. While playing, the displayed value is the
/// snapshot progress plus the wall time elapsed since the anchor, clamped to
/// the track duration. While paused the anchor is dropped and the snapshot
/// progress is shown verbatim. Every new snapshot re-anchors, so drift never
/// accumulates across snapshots.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    anchor: Option<Instant>,
    last_progress_ms: u32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress to display for this render pass, in milliseconds.
    pub fn displayed_ms(&mut self, snapshot: &PlaybackSnapshot) -> u32 {
        self.displayed_at(snapshot, Instant::now())
    }

    fn displayed_at(&mut self, snapshot: &PlaybackSnapshot, now: Instant) -> u32 {
        if snapshot.progress_ms != self.last_progress_ms {
            self.anchor = Some(now);
            self.last_progress_ms = snapshot.progress_ms;
        }

        if !snapshot.is_playing {
            self.anchor = None;
        }

        let duration = snapshot.track.duration_ms;
        match self.anchor {
            Some(anchored_at) => {
                let elapsed = now.duration_since(anchored_at).as_millis() as u32;
                snapshot.progress_ms.saturating_add(elapsed).min(duration)
            }
            None => snapshot.progress_ms.min(duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::player::state::TrackInfo;

    fn playing_snapshot(progress_ms: u32, duration_ms: u32) -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_playing: true,
            progress_ms,
            track: TrackInfo {
                id: Some("track".to_string()),
                duration_ms,
                ..TrackInfo::default()
            },
            ..PlaybackSnapshot::default()
        }
    }

    #[test]
    fn advances_with_wall_time_while_playing() {
        let mut tracker = ProgressTracker::new();
        let snapshot = playing_snapshot(10_000, 200_000);
        let t0 = Instant::now();

        assert_eq!(tracker.displayed_at(&snapshot, t0), 10_000);
        assert_eq!(
            tracker.displayed_at(&snapshot, t0 + Duration::from_millis(5_000)),
            15_000
        );
    }

    #[test]
    fn clamps_at_track_duration() {
        let mut tracker = ProgressTracker::new();
        let snapshot = playing_snapshot(10_000, 200_000);
        let t0 = Instant::now();

        tracker.displayed_at(&snapshot, t0);
        assert_eq!(
            tracker.displayed_at(&snapshot, t0 + Duration::from_millis(300_000)),
            200_000
        );
    }

    #[test]
    fn freezes_on_literal_progress_while_paused() {
        let mut tracker = ProgressTracker::new();
        let playing = playing_snapshot(10_000, 200_000);
        let t0 = Instant::now();

        tracker.displayed_at(&playing, t0);
        tracker.displayed_at(&playing, t0 + Duration::from_millis(2_000));

        let mut paused = playing_snapshot(12_000, 200_000);
        paused.is_playing = false;

        let t1 = t0 + Duration::from_millis(3_000);
        assert_eq!(tracker.displayed_at(&paused, t1), 12_000);
        assert_eq!(
            tracker.displayed_at(&paused, t1 + Duration::from_millis(60_000)),
            12_000
        );
    }

    #[test]
    fn resuming_stays_on_snapshot_progress_until_it_moves() {
        let mut tracker = ProgressTracker::new();
        let t0 = Instant::now();

        let mut paused = playing_snapshot(12_000, 200_000);
        paused.is_playing = false;
        tracker.displayed_at(&paused, t0);

        // Same progress value, now playing: nothing to anchor on yet.
        let resumed = playing_snapshot(12_000, 200_000);
        assert_eq!(
            tracker.displayed_at(&resumed, t0 + Duration::from_millis(4_000)),
            12_000
        );

        // The next snapshot moves progress and interpolation picks back up.
        let moved = playing_snapshot(13_000, 200_000);
        let t1 = t0 + Duration::from_millis(5_000);
        tracker.displayed_at(&moved, t1);
        assert_eq!(
            tracker.displayed_at(&moved, t1 + Duration::from_millis(1_000)),
            14_000
        );
    }

    #[test]
    fn new_snapshot_re_anchors_after_a_seek_backwards() {
        let mut tracker = ProgressTracker::new();
        let t0 = Instant::now();

        tracker.displayed_at(&playing_snapshot(60_000, 200_000), t0);

        let seeked = playing_snapshot(5_000, 200_000);
        let t1 = t0 + Duration::from_millis(10_000);
        assert_eq!(tracker.displayed_at(&seeked, t1), 5_000);
        assert_eq!(
            tracker.displayed_at(&seeked, t1 + Duration::from_millis(2_000)),
            7_000
        );
    }
}
