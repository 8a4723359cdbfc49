//! Turns authored segment specs into an absolute schedule
//!
//! Runs once per timeline at setup time. Stagger templates are expanded,
//! every position reference is resolved, implicit start values are filled
//! in and authoring mistakes are reported. Nothing here runs per frame.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::position::Position;
use super::scrub::Timeline;
use super::segment::{Segment, SegmentSpec, Tween};
use crate::error::CompositionError;
use crate::layout::ElementRef;

/// Property values an element holds before any segment touches it
pub type InitialValues = BTreeMap<ElementRef, BTreeMap<String, f64>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeOptions {
    /// Pull staggered segments back so none ends after this time.
    /// Without a limit stagger may extend the timeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_limit: Option<f64>,
}

/// Start and end of the previously authored spec (all of its expanded
/// segments for a stagger template)
#[derive(Debug, Clone, Copy)]
struct Span {
    start: f64,
    end: f64,
}

fn check_finite(segment: usize, property: &str, value: f64) -> Result<(), CompositionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CompositionError::NonFiniteValue {
            segment,
            property: property.to_string(),
        })
    }
}

fn validate(index: usize, spec: &SegmentSpec) -> Result<(), CompositionError> {
    check_finite(index, "duration", spec.duration)?;
    check_finite(index, "position", spec.position.value())?;
    if spec.duration < 0.0 {
        return Err(CompositionError::NegativeDuration {
            segment: index,
            duration: spec.duration,
        });
    }
    if let Some(stagger) = spec.stagger {
        check_finite(index, "stagger", stagger)?;
        if stagger < 0.0 {
            return Err(CompositionError::NegativeStagger {
                segment: index,
                stagger,
            });
        }
    }

    if spec.is_hold() {
        return Ok(());
    }
    if spec.targets.is_empty() {
        return Err(CompositionError::EmptyTargets { segment: index });
    }
    if spec.duration == 0.0 {
        return Err(CompositionError::ZeroLengthChange { segment: index });
    }
    for (property, tween) in &spec.properties {
        check_finite(index, property, tween.to)?;
        if let Some(from) = tween.from {
            check_finite(index, property, from)?;
        }
    }
    Ok(())
}

fn resolve_start(position: Position, previous: Option<Span>, timeline_end: f64) -> f64 {
    let previous_start = previous.map_or(0.0, |span| span.start);
    let previous_end = previous.map_or(0.0, |span| span.end);
    match position {
        Position::Sequential => previous_end,
        Position::Absolute(t) => t,
        Position::RelativeToPreviousStart(delta) => previous_start + delta,
        Position::RelativeToPreviousEnd(delta) => previous_end + delta,
        Position::RelativeToTimelineEnd(delta) => timeline_end + delta,
    }
}

/// Value `property` holds on `element` when a segment starting at `start`
/// begins: the end value of the earlier segment that started last by then
/// (later declaration breaks ties), else the initial value.
fn implicit_from(
    composed: &[Segment],
    initial: &InitialValues,
    element: &ElementRef,
    property: &str,
    start: f64,
) -> Option<f64> {
    let mut latest: Option<(f64, f64)> = None;
    for segment in composed.iter().filter(|segment| segment.start <= start) {
        let Some(tween) = segment
            .tweens
            .iter()
            .find(|tween| &tween.element == element && tween.property == property)
        else {
            continue;
        };
        if latest.map_or(true, |(begin, _)| segment.start >= begin) {
            latest = Some((segment.start, tween.to));
        }
    }
    latest
        .map(|(_, to)| to)
        .or_else(|| initial.get(element)?.get(property).copied())
}

/// Compose `specs` into a timeline
///
/// Segments keep authored order; `total_duration` is the latest end.
pub fn compose(
    specs: &[SegmentSpec],
    initial: &InitialValues,
    options: &ComposeOptions,
) -> Result<Timeline, CompositionError> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut previous: Option<Span> = None;
    let mut timeline_end = 0.0_f64;

    for (index, spec) in specs.iter().enumerate() {
        validate(index, spec)?;

        let anchor = resolve_start(spec.position, previous, timeline_end);
        if anchor < 0.0 {
            return Err(CompositionError::NegativeStart {
                segment: index,
                start: anchor,
            });
        }

        // (targets, start) of every concrete segment this spec expands to
        let placements: Vec<(Vec<ElementRef>, f64)> = match spec.stagger {
            Some(delta) if !spec.is_hold() => {
                let latest = options
                    .duration_limit
                    .map(|limit| (limit - spec.duration).max(anchor));
                spec.targets
                    .iter()
                    .enumerate()
                    .map(|(i, target)| {
                        let start = anchor + i as f64 * delta;
                        let start = latest.map_or(start, |latest| start.min(latest));
                        (vec![target.clone()], start)
                    })
                    .collect()
            }
            _ => vec![(spec.targets.clone(), anchor)],
        };

        let mut span = Span {
            start: f64::INFINITY,
            end: f64::NEG_INFINITY,
        };
        for (targets, start) in placements {
            let end = start + spec.duration;
            let mut tweens = Vec::with_capacity(targets.len() * spec.properties.len());
            for element in &targets {
                for (property, tween) in &spec.properties {
                    let from = match tween.from {
                        Some(from) => from,
                        None => implicit_from(&segments, initial, element, property, start)
                            .ok_or_else(|| CompositionError::UnresolvedFrom {
                                segment: index,
                                element: element.to_string(),
                                property: property.clone(),
                            })?,
                    };
                    tweens.push(Tween {
                        element: element.clone(),
                        property: property.clone(),
                        from,
                        to: tween.to,
                    });
                }
            }

            span.start = span.start.min(start);
            span.end = span.end.max(end);
            segments.push(Segment {
                source: index,
                targets,
                tweens,
                start,
                end,
                ease: spec.ease,
            });
        }

        // a stagger template without targets expands to nothing
        if span.start.is_finite() {
            timeline_end = timeline_end.max(span.end);
            previous = Some(span);
        }
    }

    debug!(
        segments = segments.len(),
        total_duration = timeline_end,
        "Composed timeline"
    );
    Ok(Timeline::new(segments, timeline_end))
}

/// Authoring helper that collects specs and initial values
#[derive(Debug, Clone, Default)]
pub struct TimelineBuilder {
    specs: Vec<SegmentSpec>,
    initial: InitialValues,
    options: ComposeOptions,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the value `property` holds before the timeline touches it
    pub fn set(mut self, element: impl Into<ElementRef>, property: impl Into<String>, value: f64) -> Self {
        self.initial
            .entry(element.into())
            .or_default()
            .insert(property.into(), value);
        self
    }

    pub fn segment(mut self, spec: SegmentSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn hold(self, duration: f64) -> Self {
        self.segment(SegmentSpec::hold(duration))
    }

    pub fn duration_limit(mut self, limit: f64) -> Self {
        self.options.duration_limit = Some(limit);
        self
    }

    pub fn specs(&self) -> &[SegmentSpec] {
        &self.specs
    }

    pub fn compose(&self) -> Result<Timeline, CompositionError> {
        compose(&self.specs, &self.initial, &self.options)
    }
}
