use log::info;

use crate::config::Config;
use crate::core::clock::PlaybackClock;
use crate::core::input::LaneState;
use crate::game::feedback::PlayerFeedback;
use crate::game::judgment::JudgeWindows;
use crate::game::note::{Note, Timeline};
use crate::game::play_status::PlayStatus;
use crate::game::processor::{self, ScoreProcessor};

/// One play of a chart: the timeline, the playback clock and the processor
/// judging it.
pub struct PlaySession {
    timeline: Timeline,
    clock: PlaybackClock,
    processor: Box<dyn ScoreProcessor>,
}

impl PlaySession {
    pub fn new(
        timeline: Timeline,
        clock: PlaybackClock,
        mut processor: Box<dyn ScoreProcessor>,
    ) -> Self {
        processor.reset(timeline.notes());
        Self {
            timeline,
            clock,
            processor,
        }
    }

    pub fn from_config(timeline: Timeline, cfg: &Config) -> Self {
        let windows = JudgeWindows {
            critical_s: cfg.judge_critical_seconds,
            near_s: cfg.judge_near_seconds,
            edge_s: cfg.judge_edge_seconds,
            adjust_s: cfg.judge_adjust_seconds,
        };
        let processor = processor::create(cfg.autoplay, windows, cfg.gauge_max);
        info!(
            "play session: {} notes, {}",
            timeline.len(),
            if cfg.autoplay { "autoplay" } else { "human input" }
        );
        Self::new(timeline, PlaybackClock::new(cfg.seen_duration), processor)
    }

    /// Restarts the chart from the current clock position.
    pub fn reset(&mut self) {
        self.processor.reset(self.timeline.notes());
    }

    /// Advances playback by `delta` seconds and judges the new frame.
    pub fn update(&mut self, delta: f64, lanes: &LaneState, fx: &mut dyn PlayerFeedback) {
        self.clock.advance(delta);
        self.processor
            .update(self.timeline.notes_mut(), &self.clock, lanes, fx);
    }

    /// Jumps playback by `relative` seconds, re-deriving which notes are done.
    pub fn move_position(&mut self, relative: f64, fx: &mut dyn PlayerFeedback) {
        self.processor
            .move_position(self.timeline.notes_mut(), &self.clock, relative, fx);
        self.clock.seek(relative);
    }

    pub fn draw(&self, lanes: &LaneState, fx: &mut dyn PlayerFeedback) {
        self.processor.draw(lanes, fx);
    }

    pub fn play_status(&self) -> &PlayStatus {
        self.processor.play_status()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// True once every event of the chart is behind the sound clock and
    /// every judgable event has been resolved, hit or missed.
    pub fn is_over(&self) -> bool {
        self.clock.current_sound_time > self.timeline.end_time()
            && self.timeline.notes().iter().all(Note::is_resolved)
    }
}
