use log::debug;

use crate::core::clock::PlaybackClock;
use crate::core::input::{LANE_COUNT, LaneState};
use crate::game::feedback::PlayerFeedback;
use crate::game::judgment::{JudgeWindows, Judgement};
use crate::game::note::{Note, NoteType};
use crate::game::play_status::PlayStatus;

use super::{FrameActivity, JudgeCore, ScoreProcessor};

/// Human play. Taps, exact taps and flicks wait for a lane trigger inside
/// the judgment window and miss once it expires; long notes and air notes
/// still resolve on their own.
#[derive(Debug)]
pub struct Playable {
    core: JudgeCore,
    windows: JudgeWindows,
}

impl Playable {
    pub fn new(windows: JudgeWindows, gauge_max: f64) -> Self {
        Self {
            core: JudgeCore::new(gauge_max),
            windows,
        }
    }

    /// Judges a short note against this frame's lane triggers.
    pub fn check_judgement(
        &mut self,
        note: &mut Note,
        clock: &PlaybackClock,
        lanes: &LaneState,
    ) -> Judgement {
        if note.is_finished() {
            return Judgement::Pending;
        }
        let offset = self.windows.offset(clock.current_time, note.start_time);
        if offset < -self.windows.edge_s {
            return Judgement::Pending;
        }
        if offset > self.windows.edge_s {
            note.finish();
            self.core.status.record_miss();
            return Judgement::Miss;
        }
        if !note.lanes(LANE_COUNT).any(|lane| lanes.is_triggered(lane)) {
            return Judgement::Pending;
        }

        debug!("{:+}ms", (offset * 1000.0) as i32);
        let tier = self.windows.classify(offset);
        note.finish();
        self.core.status.record_hit(tier);
        Judgement::Hit(tier)
    }

    fn process_score(
        &mut self,
        note: &mut Note,
        clock: &PlaybackClock,
        lanes: &LaneState,
        fx: &mut dyn PlayerFeedback,
    ) {
        if note.is_finished() && note.extras.is_empty() {
            return;
        }
        let passed = clock.relative_position(note.start_time) <= 0.0;

        let ty = note.note_type;
        if ty.contains(NoteType::HOLD) {
            if passed {
                self.core.process_hold(note, clock, fx);
            }
        } else if ty.contains(NoteType::SLIDE) {
            if passed {
                self.core.process_slide(note, clock, fx);
            }
        } else if ty.contains(NoteType::AIR_ACTION) {
            if passed {
                self.core.process_air_action(note, clock, fx);
            }
        } else if ty.contains(NoteType::AIR) {
            if passed {
                self.core.process_air(note, fx);
            }
        } else if ty.intersects(NoteType::TAP | NoteType::EX_TAP | NoteType::FLICK)
            && self.check_judgement(note, clock, lanes).is_hit()
        {
            JudgeCore::short_note_feedback(note, fx);
        }
    }
}

impl ScoreProcessor for Playable {
    fn reset(&mut self, notes: &[Note]) {
        self.core.reset(notes);
    }

    fn update(
        &mut self,
        notes: &mut [Note],
        clock: &PlaybackClock,
        lanes: &LaneState,
        fx: &mut dyn PlayerFeedback,
    ) {
        let mut frame = FrameActivity::default();
        for note in notes.iter_mut() {
            self.process_score(note, clock, lanes, fx);
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

    fn draw(&self, lanes: &LaneState, fx: &mut dyn PlayerFeedback) {
        for lane in 0..LANE_COUNT {
            if lanes.is_held(lane) {
                fx.draw_lane_light(lane);
            }
        }
    }

    fn play_status(&self) -> &PlayStatus {
        &self.core.status
    }
}

#[cfg(test)]
mod tests {
    use super::Playable;
    use crate::core::clock::PlaybackClock;
    use crate::core::input::LaneState;
    use crate::game::feedback::SoundKind;
    use crate::game::feedback::testing::{Event, Recorder};
    use crate::game::judgment::{JudgeTier, JudgeType, JudgeWindows, Judgement};
    use crate::game::note::{Note, NoteType};
    use crate::game::play_status::GAUGE_DEFAULT_MAX;
    use crate::game::processor::ScoreProcessor;

    fn playable_over(notes: &[Note]) -> Playable {
        let mut p = Playable::new(JudgeWindows::default(), GAUGE_DEFAULT_MAX);
        p.reset(notes);
        p
    }

    fn clock_at(time: f64) -> PlaybackClock {
        PlaybackClock {
            current_time: time,
            current_sound_time: time,
            seen_duration: 1.0,
        }
    }

    #[test]
    fn near_hit_increments_combo_without_miss() {
        let mut notes = vec![Note::new(NoteType::TAP, 1.0, 4, 3)];
        let mut p = playable_over(&notes);
        let mut lanes = LaneState::default();
        lanes.set(5, true);

        // 1.02 - 1.0 + 0.020 adjust = 0.04s late
        let result = p.check_judgement(&mut notes[0], &clock_at(1.02), &lanes);

        assert_eq!(result, Judgement::Hit(JudgeTier::Near));
        assert!(notes[0].is_finished());
        let status = p.play_status();
        assert_eq!(status.combo, 1);
        assert_eq!(status.justice, 1);
        assert_eq!(status.miss, 0);
    }

    #[test]
    fn expired_window_misses_and_breaks_combo() {
        let mut notes = vec![
            Note::new(NoteType::TAP, 0.5, 0, 2),
            Note::new(NoteType::TAP, 1.0, 0, 2),
        ];
        let mut p = playable_over(&notes);
        let mut lanes = LaneState::default();
        lanes.set(0, true);
        assert!(p.check_judgement(&mut notes[0], &clock_at(0.5), &lanes).is_hit());
        assert_eq!(p.play_status().combo, 1);

        // 1.06 - 1.0 + 0.020 = 0.08s, past the 0.072s window
        let result = p.check_judgement(&mut notes[1], &clock_at(1.06), &LaneState::default());

        assert_eq!(result, Judgement::Miss);
        assert!(notes[1].is_finished());
        assert_eq!(p.play_status().combo, 0);
        assert_eq!(p.play_status().miss, 1);
    }

    #[test]
    fn early_or_untriggered_notes_stay_pending() {
        let mut notes = vec![Note::new(NoteType::TAP, 1.0, 0, 2)];
        let mut p = playable_over(&notes);
        let mut lanes = LaneState::default();
        lanes.set(0, true);

        let early = p.check_judgement(&mut notes[0], &clock_at(0.8), &lanes);
        assert_eq!(early, Judgement::Pending);

        let other_lane = {
            let mut l = LaneState::default();
            l.set(7, true);
            l
        };
        let in_window = p.check_judgement(&mut notes[0], &clock_at(1.0), &other_lane);
        assert_eq!(in_window, Judgement::Pending);
        assert!(!notes[0].is_finished());

        let held_only = {
            let mut l = lanes.clone();
            l.end_frame();
            l
        };
        let result = p.check_judgement(&mut notes[0], &clock_at(1.0), &held_only);
        assert_eq!(result, Judgement::Pending, "holding is not triggering");
    }

    #[test]
    fn finished_note_is_never_rejudged() {
        let mut notes = vec![Note::new(NoteType::TAP, 1.0, 0, 2)];
        let mut p = playable_over(&notes);
        notes[0].finish();
        let result = p.check_judgement(&mut notes[0], &clock_at(2.0), &LaneState::default());
        assert_eq!(result, Judgement::Pending);
        assert_eq!(p.play_status().miss, 0);
    }

    #[test]
    fn tiers_follow_offsets() {
        let mut lanes = LaneState::default();
        lanes.set(0, true);
        let cases = [
            (0.98, JudgeTier::Critical), // 0.000s
            (1.005, JudgeTier::Critical), // +0.025s
            (0.94, JudgeTier::Near), // -0.040s
            (1.04, JudgeTier::Edge), // +0.060s
        ];
        for (time, expected) in cases {
            let mut notes = vec![Note::new(NoteType::TAP, 1.0, 0, 1)];
            let mut p = playable_over(&notes);
            let result = p.check_judgement(&mut notes[0], &clock_at(time), &lanes);
            assert_eq!(result, Judgement::Hit(expected), "hit at {time}");
        }
    }

    #[test]
    fn update_plays_feedback_only_on_hit() {
        let mut notes = vec![
            Note::new(NoteType::EX_TAP, 1.0, 0, 2),
            Note::new(NoteType::FLICK, 1.0, 8, 2),
        ];
        let mut p = playable_over(&notes);
        let mut lanes = LaneState::default();
        lanes.set(1, true);
        let mut fx = Recorder::default();

        p.update(&mut notes, &clock_at(0.99), &lanes, &mut fx);

        assert!(notes[0].is_finished());
        assert!(!notes[1].is_finished());
        assert_eq!(fx.played(SoundKind::ExTap), 1);
        assert_eq!(fx.played(SoundKind::Flick), 0);
        assert_eq!(fx.judged(JudgeType::ShortNormal), 1);
        assert_eq!(fx.judged(JudgeType::ShortEx), 1);

        fx.clear();
        p.update(&mut notes, &clock_at(1.2), &LaneState::default(), &mut fx);
        assert!(notes[1].is_finished());
        assert!(fx.events.is_empty(), "misses are silent");
        assert_eq!(p.play_status().miss, 1);
    }

    #[test]
    fn long_notes_never_miss() {
        let mut notes = vec![
            Note::new(NoteType::HOLD, 0.5, 0, 4)
                .with_extra(Note::new(NoteType::STEP, 0.8, 0, 4))
                .with_extra(Note::new(NoteType::END, 1.0, 0, 4)),
        ];
        let mut p = playable_over(&notes);
        let lanes = LaneState::default();
        let mut fx = Recorder::default();

        for i in 0..60 {
            p.update(&mut notes, &clock_at(0.4 + i as f64 * 0.02), &lanes, &mut fx);
        }
        assert!(notes[0].is_finished());
        assert!(notes[0].extras.iter().all(Note::is_finished));
        assert_eq!(p.play_status().miss, 0);
        assert_eq!(p.play_status().combo, 3);
    }

    #[test]
    fn draw_lights_held_lanes() {
        let p = playable_over(&[]);
        let mut lanes = LaneState::default();
        lanes.set(2, true);
        lanes.set(15, true);
        let mut fx = Recorder::default();
        p.draw(&lanes, &mut fx);
        assert_eq!(fx.events, vec![Event::LaneLight(2), Event::LaneLight(15)]);
    }
}
