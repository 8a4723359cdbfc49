//! Scrubbing: property values of a timeline at a given progress

use std::collections::HashMap;

use super::segment::Segment;
use crate::layout::ElementRef;
use crate::timing::{clamp_unit, lerp};

/// Value of one (element, property) pair at the scrubbed position
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
    pub element: ElementRef,
    pub property: String,
    pub value: f64,
}

/// A composed, absolute schedule of segments
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    segments: Vec<Segment>,
    total_duration: f64,
    killed: bool,
}

impl Timeline {
    pub(super) fn new(segments: Vec<Segment>, total_duration: f64) -> Self {
        Self {
            segments,
            total_duration,
            killed: false,
        }
    }

    /// Composed segments in authored order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    /// Make every further scrub a no-op
    pub fn kill(&mut self) {
        self.killed = true;
    }

    /// Every (element, property) pair the timeline animates, in order of
    /// first appearance
    pub fn pairs(&self) -> Vec<(&ElementRef, &str)> {
        let mut seen = Vec::new();
        for tween in self.segments.iter().flat_map(|s| s.tweens.iter()) {
            let pair = (&tween.element, tween.property.as_str());
            if !seen.contains(&pair) {
                seen.push(pair);
            }
        }
        seen
    }

    /// Evaluate every animated property at `progress`
    ///
    /// A pure function of `progress`. A segment still running decides its
    /// pairs, the one declared last winning where several overlap. Once every
    /// started segment on a pair has finished, the one that finished last
    /// holds its end value (later start, then later declaration, break
    /// ties). Before any segment on a pair has started, the pair holds the
    /// `from` of its earliest segment. Killed timelines yield nothing.
    pub fn evaluate(&self, progress: f64) -> Vec<PropertyValue> {
        if self.killed {
            return Vec::new();
        }
        let tau = clamp_unit(progress) * self.total_duration;

        struct Slot {
            running: Option<f64>,
            /// (end, start, value) of the most recently finished segment
            finished: Option<(f64, f64, f64)>,
            earliest: (f64, f64),
        }

        let mut index: HashMap<(&ElementRef, &str), usize> = HashMap::new();
        let mut order: Vec<(&ElementRef, &str)> = Vec::new();
        let mut slots: Vec<Slot> = Vec::new();

        for segment in &self.segments {
            let eased = segment.local_progress(tau).map(|t| match t {
                t if t <= 0.0 => 0.0,
                t if t >= 1.0 => 1.0,
                t => segment.ease.apply(t),
            });

            for tween in &segment.tweens {
                let key = (&tween.element, tween.property.as_str());
                let slot = match index.get(&key) {
                    Some(&i) => &mut slots[i],
                    None => {
                        index.insert(key, slots.len());
                        order.push(key);
                        slots.push(Slot {
                            running: None,
                            finished: None,
                            earliest: (segment.start, tween.from),
                        });
                        let last = slots.len() - 1;
                        &mut slots[last]
                    }
                };

                if segment.start < slot.earliest.0 {
                    slot.earliest = (segment.start, tween.from);
                }
                match eased {
                    Some(t) if tau < segment.end => {
                        slot.running = Some(lerp(tween.from, tween.to, t));
                    }
                    Some(_) => {
                        let newer = slot.finished.map_or(true, |(end, start, _)| {
                            segment.end > end || (segment.end == end && segment.start >= start)
                        });
                        if newer {
                            slot.finished = Some((segment.end, segment.start, tween.to));
                        }
                    }
                    None => {}
                }
            }
        }

        order
            .into_iter()
            .zip(slots)
            .map(|((element, property), slot)| PropertyValue {
                element: element.clone(),
                property: property.to_string(),
                value: slot
                    .running
                    .or(slot.finished.map(|(_, _, value)| value))
                    .unwrap_or(slot.earliest.1),
            })
            .collect()
    }
}
