use log::{debug, trace};

use crate::game::judgment::JudgeType;
use crate::game::note::NoteAnchor;

/// Sound categories the judgment engine can ask for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SoundKind {
    Tap,
    ExTap,
    Flick,
    Air,
    AirAction,
    // Looping sounds, started and stopped on hold/slide edges.
    HoldLoop,
    SlideLoop,
}

/// Audio/visual collaborators driven by a score processor.
pub trait PlayerFeedback {
    fn play_sound(&mut self, sound: SoundKind);
    fn stop_sound(&mut self, sound: SoundKind);
    fn spawn_judge_effect(&mut self, at: NoteAnchor, judge: JudgeType);
    fn spawn_slide_loop_effect(&mut self, at: NoteAnchor);
    fn remove_slide_effect(&mut self);
    /// Lights a lane the player is currently holding.
    fn draw_lane_light(&mut self, _lane: usize) {}
}

/// Feedback sink that only logs. Used by the headless runner.
#[derive(Debug, Default)]
pub struct LoggingFeedback {
    pub sounds_played: u64,
    pub effects_spawned: u64,
}

impl PlayerFeedback for LoggingFeedback {
    fn play_sound(&mut self, sound: SoundKind) {
        self.sounds_played += 1;
        trace!("play {sound:?}");
    }

    fn stop_sound(&mut self, sound: SoundKind) {
        trace!("stop {sound:?}");
    }

    fn spawn_judge_effect(&mut self, at: NoteAnchor, judge: JudgeType) {
        self.effects_spawned += 1;
        trace!(
            "judge effect {judge:?} at {:.3}s lanes {}+{}",
            at.start_time, at.start_lane, at.length
        );
    }

    fn spawn_slide_loop_effect(&mut self, at: NoteAnchor) {
        debug!("slide loop effect at {:.3}s", at.start_time);
    }

    fn remove_slide_effect(&mut self) {
        debug!("slide loop effect removed");
    }
}
