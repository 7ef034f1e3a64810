use bitflags::bitflags;

bitflags! {
    /// Note and child-event type flags. A note carries one primary type plus
    /// optional modifiers; child events reuse the same set.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct NoteType: u16 {
        const TAP        = 1 << 0;
        const EX_TAP     = 1 << 1;
        const FLICK      = 1 << 2;
        const AIR        = 1 << 3;
        const HOLD       = 1 << 4;
        const SLIDE      = 1 << 5;
        const AIR_ACTION = 1 << 6;
        const START      = 1 << 7;
        const STEP       = 1 << 8;
        const CONTROL    = 1 << 9;
        const END        = 1 << 10;
        const UP         = 1 << 11;
        const DOWN       = 1 << 12;

        const SHORT = Self::TAP.bits()
            | Self::EX_TAP.bits()
            | Self::FLICK.bits()
            | Self::AIR.bits();
        const LONG  = Self::HOLD.bits() | Self::SLIDE.bits() | Self::AIR_ACTION.bits();
    }
}

bitflags! {
    /// Per-play state that changes while a chart is running.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct NoteFlags: u8 {
        const FINISHED = 1 << 0;
    }
}

impl NoteType {
    #[inline(always)]
    pub fn is_long(self) -> bool {
        self.intersects(Self::LONG)
    }

    #[inline(always)]
    pub fn is_short(self) -> bool {
        !self.is_long() && self.intersects(Self::SHORT)
    }
}

/// Where on the field an effect should appear.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NoteAnchor {
    pub start_time: f64,
    pub start_lane: u8,
    pub length: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub note_type: NoteType,
    pub start_time: f64,
    pub start_lane: u8,
    pub length: u8,
    /// Child events of a long note (steps, ends, control points, inner taps),
    /// kept in time order.
    pub extras: Vec<Note>,
    pub flags: NoteFlags,
}

impl Note {
    pub fn new(note_type: NoteType, start_time: f64, start_lane: u8, length: u8) -> Self {
        Self {
            note_type,
            start_time,
            start_lane,
            length,
            extras: Vec::new(),
            flags: NoteFlags::empty(),
        }
    }

    /// Builder-style helper for long notes.
    pub fn with_extra(mut self, extra: Note) -> Self {
        self.extras.push(extra);
        self
    }

    #[inline(always)]
    pub fn is_finished(&self) -> bool {
        self.flags.contains(NoteFlags::FINISHED)
    }

    #[inline(always)]
    pub fn finish(&mut self) {
        self.flags.insert(NoteFlags::FINISHED);
    }

    #[inline(always)]
    pub fn unfinish(&mut self) {
        self.flags.remove(NoteFlags::FINISHED);
    }

    #[inline(always)]
    pub fn anchor(&self) -> NoteAnchor {
        NoteAnchor {
            start_time: self.start_time,
            start_lane: self.start_lane,
            length: self.length,
        }
    }

    /// True once every event of this note that play can resolve is finished.
    /// Slide control points and air-action inner taps never resolve, and an
    /// air action's head is only a marker.
    pub fn is_resolved(&self) -> bool {
        let ty = self.note_type;
        let extras_done = |skip: NoteType| {
            self.extras
                .iter()
                .filter(|e| !e.note_type.intersects(skip))
                .all(Note::is_finished)
        };
        if ty.contains(NoteType::HOLD) {
            self.is_finished() && extras_done(NoteType::empty())
        } else if ty.contains(NoteType::SLIDE) {
            self.is_finished() && extras_done(NoteType::CONTROL)
        } else if ty.contains(NoteType::AIR_ACTION) {
            extras_done(NoteType::CONTROL | NoteType::TAP)
        } else if ty.intersects(NoteType::SHORT) {
            self.is_finished()
        } else {
            true
        }
    }

    /// Lanes covered by this note, clamped to `lane_count`.
    pub fn lanes(&self, lane_count: usize) -> std::ops::Range<usize> {
        let start = (self.start_lane as usize).min(lane_count);
        let end = (start + self.length as usize).min(lane_count);
        start..end
    }
}

/// Ordered note list for a play session.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    notes: Vec<Note>,
}

impl Timeline {
    pub fn new(mut notes: Vec<Note>) -> Self {
        for note in &mut notes {
            note.extras.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        }
        notes.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut [Note] {
        &mut self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Time of the last event in the chart, children included.
    pub fn end_time(&self) -> f64 {
        self.notes
            .iter()
            .flat_map(|n| {
                std::iter::once(n.start_time).chain(n.extras.iter().map(|e| e.start_time))
            })
            .fold(0.0_f64, f64::max)
    }
}
