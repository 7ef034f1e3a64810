use crate::game::judgment::JudgeTier;
use crate::game::note::{Note, NoteType};

pub const GAUGE_DEFAULT_MAX: f64 = 60000.0;

// Gauge segments start at this size and grow by the step below each time one
// is filled.
pub const GAUGE_FIRST_SEGMENT: f64 = 12000.0;
pub const GAUGE_SEGMENT_GROWTH: f64 = 2000.0;

pub const SCORE_MAX: f64 = 1_000_000.0;

const SCORE_WEIGHT_JUSTICE_CRITICAL: f64 = 1.01;
const SCORE_WEIGHT_JUSTICE: f64 = 1.00;
const SCORE_WEIGHT_ATTACK: f64 = 0.50;

#[derive(Clone, Debug, PartialEq)]
pub struct PlayStatus {
    pub justice_critical: u32,
    pub justice: u32,
    pub attack: u32,
    pub miss: u32,
    pub combo: u32,
    pub current_gauge: f64,
    pub all_notes: u32,
    pub gauge_max: f64,
}

impl Default for PlayStatus {
    fn default() -> Self {
        Self::new(GAUGE_DEFAULT_MAX)
    }
}

impl PlayStatus {
    pub const fn new(gauge_max: f64) -> Self {
        Self {
            justice_critical: 0,
            justice: 0,
            attack: 0,
            miss: 0,
            combo: 0,
            current_gauge: 0.0,
            all_notes: 0,
            gauge_max,
        }
    }

    /// Zeroes every per-segment counter. `all_notes` and `gauge_max` survive.
    pub fn clear_counters(&mut self) {
        self.justice_critical = 0;
        self.justice = 0;
        self.attack = 0;
        self.miss = 0;
        self.combo = 0;
        self.current_gauge = 0.0;
    }

    /// Clears the counters and recounts judgable notes for a new chart.
    pub fn reset(&mut self, notes: &[Note]) {
        self.clear_counters();
        self.all_notes = count_judgable(notes);
    }

    /// Gauge share of a single note.
    #[inline(always)]
    pub fn gauge_per_note(&self) -> f64 {
        if self.all_notes == 0 {
            return 0.0;
        }
        self.gauge_max / self.all_notes as f64
    }

    /// Records a hit of the given tier: combo, tier counter and gauge.
    pub fn record_hit(&mut self, tier: JudgeTier) {
        match tier {
            JudgeTier::Critical => self.justice_critical += 1,
            JudgeTier::Near => self.justice += 1,
            JudgeTier::Edge => self.attack += 1,
        }
        self.combo += 1;
        self.current_gauge += self.gauge_per_note() * tier.gauge_scale();
    }

    pub fn record_miss(&mut self) {
        self.miss += 1;
        self.combo = 0;
    }

    pub fn score(&self) -> u32 {
        if self.all_notes == 0 {
            return 0;
        }
        let base = SCORE_MAX / self.all_notes as f64;
        let total = self.justice_critical as f64 * base * SCORE_WEIGHT_JUSTICE_CRITICAL
            + self.justice as f64 * base * SCORE_WEIGHT_JUSTICE
            + self.attack as f64 * base * SCORE_WEIGHT_ATTACK;
        total.round() as u32
    }

    /// Folds the raw gauge into filled segments and the 0..1 fill ratio of
    /// the segment in progress.
    pub fn gauge_value(&self) -> (u32, f64) {
        let mut fulfilled = 0;
        let mut calc = self.current_gauge.round();
        let mut segment = GAUGE_FIRST_SEGMENT;
        while calc >= segment {
            fulfilled += 1;
            calc -= segment;
            segment += GAUGE_SEGMENT_GROWTH;
        }
        (fulfilled, calc / segment)
    }
}

/// Number of judgable units in a chart. Long notes count their head (air
/// actions have none) plus every end, step and exact-tap child.
pub fn count_judgable(notes: &[Note]) -> u32 {
    let mut total = 0;
    for note in notes {
        if note.note_type.is_long() {
            if !note.note_type.contains(NoteType::AIR_ACTION) {
                total += 1;
            }
            total += note
                .extras
                .iter()
                .filter(|ex| {
                    ex.note_type
                        .intersects(NoteType::END | NoteType::STEP | NoteType::EX_TAP)
                })
                .count() as u32;
        } else if note.note_type.is_short() {
            total += 1;
        }
    }
    total
}
