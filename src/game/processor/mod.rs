//! Judgment engine.
//!
//! Both policies share [`JudgeCore`]: the play status, hold/slide tracking,
//! the long-note walkers and seeking. They only differ in how a note becomes
//! eligible and how short notes resolve.

mod autoplay;
mod playable;

pub use autoplay::AutoPlayer;
pub use playable::Playable;

use log::debug;

use crate::core::clock::PlaybackClock;
use crate::core::input::LaneState;
use crate::game::feedback::{PlayerFeedback, SoundKind};
use crate::game::judgment::{JudgeTier, JudgeType, JudgeWindows};
use crate::game::note::{Note, NoteType};
use crate::game::play_status::PlayStatus;

pub trait ScoreProcessor {
    /// Starts a new play over `notes`: zero counters, recount judgable notes.
    fn reset(&mut self, notes: &[Note]);

    /// Judges one frame. `notes` may be the whole chart or only the part
    /// currently on screen.
    fn update(
        &mut self,
        notes: &mut [Note],
        clock: &PlaybackClock,
        lanes: &LaneState,
        fx: &mut dyn PlayerFeedback,
    );

    /// Prepares for a jump of `relative` seconds from the clock's current
    /// sound time. The caller moves the clock itself.
    fn move_position(
        &mut self,
        notes: &mut [Note],
        clock: &PlaybackClock,
        relative: f64,
        fx: &mut dyn PlayerFeedback,
    );

    fn draw(&self, lanes: &LaneState, fx: &mut dyn PlayerFeedback);

    fn play_status(&self) -> &PlayStatus;
}

/// Builds the processor for a session.
pub fn create(autoplay: bool, windows: JudgeWindows, gauge_max: f64) -> Box<dyn ScoreProcessor> {
    if autoplay {
        Box::new(AutoPlayer::new(gauge_max))
    } else {
        Box::new(Playable::new(windows, gauge_max))
    }
}

#[derive(Debug, Default)]
pub(crate) struct JudgeCore {
    pub status: PlayStatus,
    in_hold: bool,
    in_slide: bool,
    was_in_hold: bool,
    was_in_slide: bool,
}

/// Aggregated long-note activity over one frame.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct FrameActivity {
    hold: bool,
    slide: bool,
}

#[inline(always)]
fn has_passed(clock: &PlaybackClock, start_time: f64) -> bool {
    clock.relative_position(start_time) < 0.0
}

impl JudgeCore {
    pub fn new(gauge_max: f64) -> Self {
        Self {
            status: PlayStatus::new(gauge_max),
            ..Self::default()
        }
    }

    pub fn reset(&mut self, notes: &[Note]) {
        self.status.reset(notes);
        self.clear_long_tracking();
        debug!("judge reset: {} judgable notes", self.status.all_notes);
    }

    fn clear_long_tracking(&mut self) {
        self.in_hold = false;
        self.in_slide = false;
        self.was_in_hold = false;
        self.was_in_slide = false;
    }

    /// Automatic hits always land as justice critical.
    #[inline(always)]
    pub fn increment_combo(&mut self) {
        self.status.record_hit(JudgeTier::Critical);
    }

    #[inline(always)]
    pub fn observe(&self, frame: &mut FrameActivity) {
        frame.hold |= self.in_hold;
        frame.slide |= self.in_slide;
    }

    /// Starts or stops the loop sounds when activity changed since the last
    /// frame.
    pub fn finish_frame(&mut self, frame: FrameActivity, fx: &mut dyn PlayerFeedback) {
        if !self.was_in_slide && frame.slide {
            fx.play_sound(SoundKind::SlideLoop);
        }
        if self.was_in_slide && !frame.slide {
            fx.stop_sound(SoundKind::SlideLoop);
        }
        if !self.was_in_hold && frame.hold {
            fx.play_sound(SoundKind::HoldLoop);
        }
        if self.was_in_hold && !frame.hold {
            fx.stop_sound(SoundKind::HoldLoop);
        }
        self.was_in_hold = frame.hold;
        self.was_in_slide = frame.slide;
    }

    pub fn process_hold(
        &mut self,
        note: &mut Note,
        clock: &PlaybackClock,
        fx: &mut dyn PlayerFeedback,
    ) {
        self.in_hold = true;
        let anchor = note.anchor();
        if !note.is_finished() {
            fx.play_sound(SoundKind::Tap);
            fx.spawn_judge_effect(anchor, JudgeType::ShortNormal);
            self.increment_combo();
            note.finish();
        }

        for extra in note.extras.iter_mut() {
            if !has_passed(clock, extra.start_time) {
                continue;
            }
            if extra.note_type.contains(NoteType::END) {
                self.in_hold = false;
            }
            if extra.is_finished() {
                continue;
            }
            if extra.note_type.contains(NoteType::EX_TAP) {
                self.increment_combo();
                extra.finish();
                return;
            }
            if !extra.note_type.contains(NoteType::TAP) {
                fx.play_sound(SoundKind::Tap);
            }
            // Hold children flash on the hold itself.
            fx.spawn_judge_effect(anchor, JudgeType::ShortNormal);
            self.increment_combo();
            extra.finish();
            return;
        }
    }

    pub fn process_slide(
        &mut self,
        note: &mut Note,
        clock: &PlaybackClock,
        fx: &mut dyn PlayerFeedback,
    ) {
        self.in_slide = true;
        if !note.is_finished() {
            fx.play_sound(SoundKind::Tap);
            fx.spawn_slide_loop_effect(note.anchor());
            self.increment_combo();
            note.finish();
            return;
        }

        for extra in note.extras.iter_mut() {
            if !has_passed(clock, extra.start_time) {
                continue;
            }
            if extra.note_type.contains(NoteType::END) {
                self.in_slide = false;
            }
            if extra.note_type.contains(NoteType::CONTROL) || extra.is_finished() {
                continue;
            }
            if extra.note_type.contains(NoteType::EX_TAP) {
                self.increment_combo();
                extra.finish();
                return;
            }
            if !extra.note_type.contains(NoteType::TAP) {
                fx.play_sound(SoundKind::Tap);
            }
            fx.spawn_judge_effect(extra.anchor(), JudgeType::SlideTap);
            self.increment_combo();
            extra.finish();
            return;
        }
    }

    pub fn process_air_action(
        &mut self,
        note: &mut Note,
        clock: &PlaybackClock,
        fx: &mut dyn PlayerFeedback,
    ) {
        for extra in note.extras.iter_mut() {
            if !has_passed(clock, extra.start_time) {
                continue;
            }
            if extra
                .note_type
                .intersects(NoteType::CONTROL | NoteType::TAP)
                || extra.is_finished()
            {
                continue;
            }
            if extra.note_type.contains(NoteType::EX_TAP) {
                self.increment_combo();
                extra.finish();
                return;
            }
            fx.play_sound(SoundKind::AirAction);
            fx.spawn_judge_effect(extra.anchor(), JudgeType::Action);
            self.increment_combo();
            extra.finish();
        }
    }

    pub fn process_air(&mut self, note: &mut Note, fx: &mut dyn PlayerFeedback) {
        let anchor = note.anchor();
        fx.play_sound(SoundKind::Air);
        fx.spawn_judge_effect(anchor, JudgeType::ShortNormal);
        fx.spawn_judge_effect(anchor, JudgeType::ShortEx);
        self.increment_combo();
        note.finish();
    }

    /// Feedback for a resolved tap, exact tap or flick.
    pub fn short_note_feedback(note: &Note, fx: &mut dyn PlayerFeedback) {
        let anchor = note.anchor();
        if note.note_type.contains(NoteType::TAP) {
            fx.play_sound(SoundKind::Tap);
            fx.spawn_judge_effect(anchor, JudgeType::ShortNormal);
        } else if note.note_type.contains(NoteType::EX_TAP) {
            fx.play_sound(SoundKind::ExTap);
            fx.spawn_judge_effect(anchor, JudgeType::ShortNormal);
            fx.spawn_judge_effect(anchor, JudgeType::ShortEx);
        } else if note.note_type.contains(NoteType::FLICK) {
            fx.play_sound(SoundKind::Flick);
            fx.spawn_judge_effect(anchor, JudgeType::ShortNormal);
        }
    }

    pub fn move_position(
        &mut self,
        notes: &mut [Note],
        clock: &PlaybackClock,
        relative: f64,
        fx: &mut dyn PlayerFeedback,
    ) {
        let new_time = clock.current_sound_time + relative;
        let forward = relative >= 0.0;
        self.status.clear_counters();
        self.clear_long_tracking();
        fx.stop_sound(SoundKind::HoldLoop);
        fx.stop_sound(SoundKind::SlideLoop);
        fx.remove_slide_effect();

        // Forward: everything skipped over is done. Backward: everything that
        // is ahead again becomes judgable.
        for note in notes.iter_mut() {
            reseek(note, forward, new_time);
            if !note.note_type.is_long() {
                continue;
            }
            for extra in note.extras.iter_mut() {
                if extra
                    .note_type
                    .intersects(NoteType::TAP | NoteType::EX_TAP | NoteType::CONTROL)
                {
                    continue;
                }
                reseek(extra, forward, new_time);
            }
        }
        debug!(
            "seek {relative:+.3}s to {new_time:.3}s ({})",
            if forward { "forward" } else { "backward" }
        );
    }
}

#[inline(always)]
fn reseek(event: &mut Note, forward: bool, new_time: f64) {
    if forward {
        if event.start_time <= new_time {
            event.finish();
        }
    } else if event.start_time >= new_time {
        event.unfinish();
    }
}

#[cfg(test)]
mod tests {
    use super::{JudgeCore, ScoreProcessor, create};
    use crate::core::clock::PlaybackClock;
    use crate::core::input::LaneState;
    use crate::game::feedback::SoundKind;
    use crate::game::feedback::testing::{Event, Recorder};
    use crate::game::judgment::JudgeWindows;
    use crate::game::note::{Note, NoteType};
    use crate::game::play_status::GAUGE_DEFAULT_MAX;

    fn hold_chart() -> Vec<Note> {
        vec![
            Note::new(NoteType::HOLD, 1.0, 0, 4)
                .with_extra(Note::new(NoteType::TAP, 1.5, 0, 4))
                .with_extra(Note::new(NoteType::EX_TAP, 1.6, 0, 4))
                .with_extra(Note::new(NoteType::END, 2.0, 0, 4)),
            Note::new(NoteType::TAP, 3.0, 4, 2),
        ]
    }

    #[test]
    fn forward_seek_finishes_passed_events_only() {
        let mut notes = hold_chart();
        let mut core = JudgeCore::new(GAUGE_DEFAULT_MAX);
        core.reset(&notes);
        let clock = PlaybackClock::new(1.0);
        let mut fx = Recorder::default();

        core.move_position(&mut notes, &clock, 1.8, &mut fx);

        assert!(notes[0].is_finished(), "hold head passed");
        assert!(!notes[0].extras[0].is_finished(), "inner tap is never seeked");
        assert!(!notes[0].extras[1].is_finished(), "inner ex-tap is never seeked");
        assert!(!notes[0].extras[2].is_finished(), "end still ahead");
        assert!(!notes[1].is_finished());
        assert_eq!(
            fx.events,
            vec![
                Event::Stop(SoundKind::HoldLoop),
                Event::Stop(SoundKind::SlideLoop),
                Event::RemoveSlide,
            ]
        );
    }

    #[test]
    fn backward_seek_clears_events_ahead_again() {
        let mut notes = hold_chart();
        let mut core = JudgeCore::new(GAUGE_DEFAULT_MAX);
        core.reset(&notes);
        let mut fx = Recorder::default();
        let mut clock = PlaybackClock::new(1.0);

        core.move_position(&mut notes, &clock, 3.5, &mut fx);
        clock.seek(3.5);
        notes[0].extras[0].finish();
        assert!(notes[0].is_finished() && notes[0].extras[2].is_finished());
        assert!(notes[1].is_finished());

        core.move_position(&mut notes, &clock, -3.0, &mut fx);
        assert!(!notes[0].is_finished(), "hold head is ahead of 0.5s");
        assert!(!notes[0].extras[2].is_finished());
        assert!(!notes[1].is_finished());
        assert!(notes[0].extras[0].is_finished(), "inner tap keeps its flag");
    }

    #[test]
    fn seek_never_touches_slide_control_points() {
        let mut notes = vec![
            Note::new(NoteType::SLIDE, 1.0, 0, 4)
                .with_extra(Note::new(NoteType::CONTROL, 1.2, 2, 4))
                .with_extra(Note::new(NoteType::STEP, 1.4, 4, 4))
                .with_extra(Note::new(NoteType::END, 2.0, 6, 4)),
        ];
        let mut core = JudgeCore::new(GAUGE_DEFAULT_MAX);
        core.reset(&notes);
        let mut fx = Recorder::default();
        let mut clock = PlaybackClock::new(1.0);

        core.move_position(&mut notes, &clock, 1.8, &mut fx);
        clock.seek(1.8);
        assert!(notes[0].is_finished());
        assert!(!notes[0].extras[0].is_finished(), "control skipped going forward");
        assert!(notes[0].extras[1].is_finished());
        assert!(!notes[0].extras[2].is_finished());

        notes[0].extras[0].finish();
        core.move_position(&mut notes, &clock, -1.8, &mut fx);
        assert!(!notes[0].is_finished());
        assert!(notes[0].extras[0].is_finished(), "control skipped going backward");
        assert!(!notes[0].extras[1].is_finished());
    }

    #[test]
    fn seek_clears_counters_but_keeps_note_total() {
        let mut notes = hold_chart();
        let mut core = JudgeCore::new(GAUGE_DEFAULT_MAX);
        core.reset(&notes);
        let all_notes = core.status.all_notes;
        core.increment_combo();
        core.increment_combo();
        core.status.record_miss();

        core.move_position(&mut notes, &PlaybackClock::new(1.0), 0.5, &mut Recorder::default());
        assert_eq!(core.status.combo, 0);
        assert_eq!(core.status.justice_critical, 0);
        assert_eq!(core.status.miss, 0);
        assert!(core.status.current_gauge.abs() <= f64::EPSILON);
        assert_eq!(core.status.all_notes, all_notes);
    }

    #[test]
    fn loop_sounds_follow_hold_edges() {
        let mut notes = vec![
            Note::new(NoteType::HOLD, 0.1, 0, 4).with_extra(Note::new(NoteType::END, 0.5, 0, 4)),
        ];
        let mut processor = create(true, JudgeWindows::default(), GAUGE_DEFAULT_MAX);
        processor.reset(&notes);
        let lanes = LaneState::default();
        let mut fx = Recorder::default();
        let mut clock = PlaybackClock::new(1.0);

        clock.advance(0.2);
        processor.update(&mut notes, &clock, &lanes, &mut fx);
        assert_eq!(fx.played(SoundKind::HoldLoop), 1);

        fx.clear();
        clock.advance(0.1);
        processor.update(&mut notes, &clock, &lanes, &mut fx);
        assert!(fx.events.is_empty(), "no edge while still holding");

        clock.advance(0.3);
        processor.update(&mut notes, &clock, &lanes, &mut fx);
        assert!(fx.events.contains(&Event::Stop(SoundKind::HoldLoop)));
    }
}
