//! Pin state machine
//!
//! A pinned trigger holds its element still while progress is strictly
//! between 0 and 1. Re-entering the current state never emits anything.

/// Where a pinned element currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinState {
    /// Before the trigger start; element in normal flow, ready to pin
    #[default]
    Armed,
    /// Held at a fixed viewport position
    Pinned,
    /// Past the trigger end; element resumes normal flow
    Released,
}

/// Emitted when a pin changes state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinTransition {
    /// Element became fixed (entering forward or re-entering from the end)
    Pinned,
    /// Element released at the end of the range
    Released,
    /// Element returned to normal flow before the start
    Unpinned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    state: PinState,
    distance: f64,
    /// Whether later content is pushed down by `distance`
    spacing: bool,
}

impl Pin {
    pub fn new(spacing: bool) -> Self {
        Self {
            state: PinState::Armed,
            distance: 0.0,
            spacing,
        }
    }

    #[inline]
    pub fn state(&self) -> PinState {
        self.state
    }

    /// Scroll distance over which the element is held
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[inline]
    pub fn has_spacing(&self) -> bool {
        self.spacing
    }

    pub(crate) fn set_distance(&mut self, distance: f64) {
        self.distance = distance.max(0.0);
    }

    /// Scroll distance currently reserved by the active pin
    #[inline]
    pub fn reserved(&self) -> f64 {
        match self.state {
            PinState::Pinned => self.distance,
            PinState::Armed | PinState::Released => 0.0,
        }
    }

    /// Translation that keeps the element visually fixed
    pub fn offset(&self, smoothed: f64, start: f64) -> f64 {
        match self.state {
            PinState::Armed => 0.0,
            PinState::Pinned => (smoothed - start).clamp(0.0, self.distance),
            PinState::Released => self.distance,
        }
    }

    /// Move to the state matching `progress`
    ///
    /// Jumping over the pinned range emits the intermediate transition too,
    /// so every `Released`/`Unpinned` is preceded by a `Pinned`.
    pub fn update(&mut self, progress: f64) -> Vec<PinTransition> {
        let next = if progress <= 0.0 {
            PinState::Armed
        } else if progress >= 1.0 {
            PinState::Released
        } else {
            PinState::Pinned
        };

        let transitions = match (self.state, next) {
            (a, b) if a == b => Vec::new(),
            (_, PinState::Pinned) => vec![PinTransition::Pinned],
            (PinState::Armed, PinState::Released) => {
                vec![PinTransition::Pinned, PinTransition::Released]
            }
            (PinState::Pinned, PinState::Released) => vec![PinTransition::Released],
            (PinState::Released, PinState::Armed) => {
                vec![PinTransition::Pinned, PinTransition::Unpinned]
            }
            (PinState::Pinned, PinState::Armed) => vec![PinTransition::Unpinned],
            _ => Vec::new(),
        };

        self.state = next;
        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin() -> Pin {
        let mut pin = Pin::new(true);
        pin.set_distance(800.0);
        pin
    }

    #[test]
    fn test_reserves_distance_while_pinned() {
        let mut pin = pin();
        assert_eq!(pin.update(0.3), vec![PinTransition::Pinned]);
        assert_eq!(pin.reserved(), 800.0);
        assert!(pin.update(0.6).is_empty());
        assert_eq!(pin.reserved(), 800.0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut pin = pin();
        pin.update(0.5);
        assert_eq!(pin.update(1.0), vec![PinTransition::Released]);
        assert_eq!(pin.reserved(), 0.0);
        assert!(pin.update(1.0).is_empty());
        assert!(pin.update(1.0).is_empty());
    }

    #[test]
    fn test_repins_when_scrolling_back() {
        let mut pin = pin();
        pin.update(0.5);
        pin.update(1.0);
        assert_eq!(pin.update(0.9), vec![PinTransition::Pinned]);
        assert_eq!(pin.update(0.0), vec![PinTransition::Unpinned]);
        assert_eq!(pin.state(), PinState::Armed);
        assert_eq!(pin.update(0.1), vec![PinTransition::Pinned]);
    }

    #[test]
    fn test_jump_over_range_emits_both() {
        let mut pin = pin();
        assert_eq!(
            pin.update(1.0),
            vec![PinTransition::Pinned, PinTransition::Released]
        );
        assert_eq!(
            pin.update(0.0),
            vec![PinTransition::Pinned, PinTransition::Unpinned]
        );
    }

    #[test]
    fn test_offset_holds_element() {
        let mut pin = pin();
        assert_eq!(pin.offset(50.0, 100.0), 0.0);
        pin.update(0.5);
        assert_eq!(pin.offset(500.0, 100.0), 400.0);
        pin.update(1.0);
        assert_eq!(pin.offset(5000.0, 100.0), 800.0);
    }
}
