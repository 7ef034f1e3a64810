/// Number of slider lanes on the integrated controller.
pub const LANE_COUNT: usize = 16;

/// Number of tracked keyboard scan codes.
pub const KEY_COUNT: usize = 256;

/// Held/trigger view over a fixed set of digital inputs.
///
/// `current` mirrors the raw held state as of the last poll. `trigger` is
/// only true on the poll where an input went from released to held.
#[derive(Clone, Debug)]
pub struct EdgeState<const N: usize> {
    current: [bool; N],
    trigger: [bool; N],
}

impl<const N: usize> Default for EdgeState<N> {
    fn default() -> Self {
        Self {
            current: [false; N],
            trigger: [false; N],
        }
    }
}

impl<const N: usize> EdgeState<N> {
    /// Feeds the held state for this frame and recomputes the rising edges.
    pub fn poll(&mut self, held: &[bool; N]) {
        for (i, &now) in held.iter().enumerate() {
            self.trigger[i] = now && !self.current[i];
            self.current[i] = now;
        }
    }

    /// Marks a single input pressed or released, updating its edge.
    pub fn set(&mut self, index: usize, pressed: bool) {
        let Some(current) = self.current.get_mut(index) else {
            return;
        };
        self.trigger[index] = pressed && !*current;
        *current = pressed;
    }

    /// Clears every trigger while keeping the held state. Call once the
    /// frame that observed the edges is over.
    pub fn end_frame(&mut self) {
        self.trigger = [false; N];
    }

    #[inline(always)]
    pub fn is_held(&self, index: usize) -> bool {
        self.current.get(index).copied().unwrap_or(false)
    }

    #[inline(always)]
    pub fn is_triggered(&self, index: usize) -> bool {
        self.trigger.get(index).copied().unwrap_or(false)
    }
}

/// Slider lanes (the "integrated sliders" source).
pub type LaneState = EdgeState<LANE_COUNT>;

/// Keyboard keys, indexed by scan code.
pub type KeyState = EdgeState<KEY_COUNT>;

#[cfg(test)]
mod tests {
    use super::{LANE_COUNT, LaneState};

    #[test]
    fn trigger_is_rising_edge_of_held() {
        let mut lanes = LaneState::default();
        let mut held = [false; LANE_COUNT];
        held[3] = true;

        lanes.poll(&held);
        assert!(lanes.is_held(3));
        assert!(lanes.is_triggered(3));

        lanes.poll(&held);
        assert!(lanes.is_held(3), "still held on the second poll");
        assert!(!lanes.is_triggered(3), "edge only fires once");

        held[3] = false;
        lanes.poll(&held);
        assert!(!lanes.is_held(3));
        assert!(!lanes.is_triggered(3));
    }

    #[test]
    fn out_of_range_lanes_read_as_released() {
        let mut lanes = LaneState::default();
        lanes.set(LANE_COUNT + 4, true);
        assert!(!lanes.is_held(LANE_COUNT + 4));
        assert!(!lanes.is_triggered(LANE_COUNT + 4));
    }

    #[test]
    fn end_frame_drops_triggers_but_keeps_held() {
        let mut lanes = LaneState::default();
        lanes.set(0, true);
        lanes.end_frame();
        assert!(lanes.is_held(0));
        assert!(!lanes.is_triggered(0));
    }
}
