use crate::core::clock::PlaybackClock;
use crate::core::input::LaneState;
use crate::game::feedback::PlayerFeedback;
use crate::game::note::{Note, NoteType};
use crate::game::play_status::PlayStatus;

use super::{FrameActivity, JudgeCore, ScoreProcessor};

/// Plays the chart by itself: every note lands as a justice critical the
/// moment it reaches the judgment line. Never misses.
#[derive(Debug)]
pub struct AutoPlayer {
    core: JudgeCore,
}

impl AutoPlayer {
    pub fn new(gauge_max: f64) -> Self {
        Self {
            core: JudgeCore::new(gauge_max),
        }
    }

    fn process_score(
        &mut self,
        note: &mut Note,
        clock: &PlaybackClock,
        fx: &mut dyn PlayerFeedback,
    ) {
        if clock.relative_position(note.start_time) >= 0.0 {
            return;
        }
        if note.is_finished() && note.extras.is_empty() {
            return;
        }

        let ty = note.note_type;
        if ty.contains(NoteType::HOLD) {
            self.core.process_hold(note, clock, fx);
        } else if ty.contains(NoteType::SLIDE) {
            self.core.process_slide(note, clock, fx);
        } else if ty.contains(NoteType::AIR_ACTION) {
            self.core.process_air_action(note, clock, fx);
        } else if ty.contains(NoteType::AIR) {
            self.core.process_air(note, fx);
        } else if ty.intersects(NoteType::TAP | NoteType::EX_TAP | NoteType::FLICK) {
            JudgeCore::short_note_feedback(note, fx);
            self.core.increment_combo();
            note.finish();
        }
    }
}

impl ScoreProcessor for AutoPlayer {
    fn reset(&mut self, notes: &[Note]) {
        self.core.reset(notes);
    }

    fn update(
        &mut self,
        notes: &mut [Note],
        clock: &PlaybackClock,
        _lanes: &LaneState,
        fx: &mut dyn PlayerFeedback,
    ) {
        let mut frame = FrameActivity::default();
        for note in notes.iter_mut() {
            self.process_score(note, clock, fx);
            self.core.observe(&mut frame);
        }
        self.core.finish_frame(frame, fx);
    }

    fn move_position(
        &mut self,
        notes: &mut [Note],
        clock: &PlaybackClock,
        relative: f64,
        fx: &mut dyn PlayerFeedback,
    ) {
        self.core.move_position(notes, clock, relative, fx);
    }

    fn draw(&self, _lanes: &LaneState, _fx: &mut dyn PlayerFeedback) {}

    fn play_status(&self) -> &PlayStatus {
        &self.core.status
    }
}
