/// Playback time as seen by the judgment engine.
///
/// `current_sound_time` follows the music stream and drives note visibility,
/// `current_time` is the wall-clock side used for human timing judgments.
/// `seen_duration` is how long a note is on screen before it reaches the
/// judgment line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaybackClock {
    pub current_time: f64,
    pub current_sound_time: f64,
    pub seen_duration: f64,
}

impl PlaybackClock {
    pub const fn new(seen_duration: f64) -> Self {
        Self {
            current_time: 0.0,
            current_sound_time: 0.0,
            seen_duration,
        }
    }

    pub fn advance(&mut self, delta: f64) {
        self.current_time += delta;
        self.current_sound_time += delta;
    }

    pub fn seek(&mut self, relative: f64) {
        self.current_time += relative;
        self.current_sound_time += relative;
    }

    /// Position of an event relative to the judgment line, in units of
    /// `seen_duration`. Negative once the event has passed.
    #[inline(always)]
    pub fn relative_position(&self, start_time: f64) -> f64 {
        let seen = if self.seen_duration.is_finite() && self.seen_duration > 0.0 {
            self.seen_duration
        } else {
            1.0
        };
        (start_time - self.current_sound_time) / seen
    }
}
