use std::fmt;

use tracing::{debug, info, warn};

use super::bounds::{BoundsSpec, ResolveInput, ResolvedBounds};
use super::pin::{Pin, PinState, PinTransition};
use crate::config::TriggerConfig;
use crate::layout::{ElementBox, LayoutCache, LayoutProvider};
use crate::timeline::Timeline;
use crate::timing::exponential_decay_factor;

/// Identifies a registered trigger; never reused within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerHandle(u64);

impl TriggerHandle {
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TriggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger#{}", self.0)
    }
}

/// How a trigger is set up
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSpec {
    pub bounds: BoundsSpec,
    /// Hold the element fixed while progress is in (0, 1)
    pub pin: bool,
    /// Push later content down by the pin distance
    pub pin_spacing: bool,
    /// Seconds the bound timeline's playhead takes to catch up with progress
    pub scrub: Option<f64>,
}

impl TriggerSpec {
    pub fn new(bounds: BoundsSpec) -> Self {
        Self {
            bounds,
            pin: false,
            pin_spacing: true,
            scrub: None,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pin = true;
        self
    }

    pub fn without_pin_spacing(mut self) -> Self {
        self.pin_spacing = false;
        self
    }

    pub fn with_scrub(mut self, seconds: f64) -> Self {
        self.scrub = Some(seconds);
        self
    }
}

/// Which end of a trigger range was crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossDirection {
    Forward,
    Backward,
}

/// Discrete, non-interpolated notifications for collaborators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerEvent {
    Boundary {
        trigger: TriggerHandle,
        edge: Boundary,
        direction: CrossDirection,
    },
    Pin {
        trigger: TriggerHandle,
        transition: PinTransition,
        /// Scroll distance reserved after the transition
        reserved: f64,
    },
}

/// A trigger whose bound timeline needs scrubbing this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerUpdate {
    pub trigger: TriggerHandle,
    pub progress: f64,
    /// Position the timeline is scrubbed to
    pub playhead: f64,
    /// Translation holding a pinned element in place
    pub pin_offset: Option<f64>,
}

/// A registered trigger and its per-frame state
#[derive(Debug)]
pub struct Trigger {
    handle: TriggerHandle,
    spec: TriggerSpec,
    bounds: Option<ResolvedBounds>,
    progress: f64,
    playhead: f64,
    notified: Option<f64>,
    pin: Option<Pin>,
    pin_offset: Option<f64>,
    timeline: Option<Timeline>,
}

impl Trigger {
    fn new(handle: TriggerHandle, spec: TriggerSpec, timeline: Option<Timeline>) -> Self {
        let pin = spec.pin.then(|| Pin::new(spec.pin_spacing));
        Self {
            handle,
            spec,
            bounds: None,
            progress: 0.0,
            playhead: 0.0,
            notified: None,
            pin,
            pin_offset: None,
            timeline,
        }
    }

    pub fn handle(&self) -> TriggerHandle {
        self.handle
    }

    pub fn spec(&self) -> &TriggerSpec {
        &self.spec
    }

    /// Resolved scroll range, `None` until layout has been read or while the
    /// trigger element is missing
    pub fn bounds(&self) -> Option<ResolvedBounds> {
        self.bounds
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    pub fn pin(&self) -> Option<&Pin> {
        self.pin.as_ref()
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn timeline_mut(&mut self) -> Option<&mut Timeline> {
        self.timeline.as_mut()
    }

    /// Replace the bound timeline; the next frame scrubs it
    pub fn set_timeline(&mut self, timeline: Option<Timeline>) {
        self.timeline = timeline;
        self.notified = None;
    }

    fn advance_playhead(&mut self, dt: f64, epsilon: f64) {
        self.playhead = match self.spec.scrub {
            Some(lag) if lag > 0.0 => {
                let k = exponential_decay_factor(dt, lag);
                let next = self.playhead + (self.progress - self.playhead) * k;
                if (self.progress - next).abs() < epsilon {
                    self.progress
                } else {
                    next
                }
            }
            _ => self.progress,
        };
    }

    /// Whether the playhead moved enough to scrub again
    fn playhead_changed(&self, epsilon: f64) -> bool {
        match self.notified {
            None => true,
            Some(last) if last == self.playhead => false,
            // always land exactly on the ends
            Some(_) if self.playhead == 0.0 || self.playhead == 1.0 => true,
            Some(last) => (self.playhead - last).abs() > epsilon,
        }
    }
}

/// Computes progress for every registered trigger, in registration order
#[derive(Debug)]
pub struct TriggerRegistry {
    config: TriggerConfig,
    next_id: u64,
    triggers: Vec<Trigger>,
    /// Layout generation the current bounds were resolved against
    resolved_generation: Option<u64>,
    stale: bool,
    /// (natural bottom, distance) of every pin that adds spacing
    spacers: Vec<(f64, f64)>,
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::new(TriggerConfig::default())
    }
}

impl TriggerRegistry {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            next_id: 1,
            triggers: Vec::new(),
            resolved_generation: None,
            stale: true,
            spacers: Vec::new(),
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TriggerConfig) {
        self.config = config;
        self.stale = true;
    }

    pub fn register(&mut self, spec: TriggerSpec, timeline: Option<Timeline>) -> TriggerHandle {
        let handle = TriggerHandle(self.next_id);
        self.next_id += 1;

        info!(
            trigger = %handle,
            element = %spec.bounds.element,
            start = %spec.bounds.start,
            end = %spec.bounds.end,
            pin = spec.pin,
            "Registered trigger"
        );
        self.triggers.push(Trigger::new(handle, spec, timeline));
        self.stale = true;
        handle
    }

    /// Remove a trigger, dropping its timeline
    pub fn unregister(&mut self, handle: TriggerHandle) -> Option<Trigger> {
        let index = self.triggers.iter().position(|t| t.handle == handle)?;
        info!(trigger = %handle, "Unregistered trigger");
        self.stale = true;
        Some(self.triggers.remove(index))
    }

    pub fn get(&self, handle: TriggerHandle) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.handle == handle)
    }

    pub fn get_mut(&mut self, handle: TriggerHandle) -> Option<&mut Trigger> {
        self.triggers.iter_mut().find(|t| t.handle == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Scroll room added to the document by pins with spacing
    pub fn total_spacing(&self) -> f64 {
        self.spacers.iter().map(|(_, distance)| distance).sum()
    }

    /// Spacing inserted above content whose natural top is at `top`
    pub fn spacing_before(&self, top: f64) -> f64 {
        spacing_before(&self.spacers, top)
    }

    /// Force bounds to be resolved again on the next frame
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Resolve every trigger's bounds against the current layout
    ///
    /// Idempotent: does nothing unless a trigger was added or removed, or the
    /// layout generation moved on since the last resolution.
    pub fn refresh(&mut self, cache: &mut LayoutCache, provider: &dyn LayoutProvider) {
        if !self.stale && self.resolved_generation == Some(cache.generation()) {
            return;
        }

        let viewport = cache.viewport(provider);
        let horizontal_margin = self.config.horizontal_margin;
        // (natural bottom, distance) of spaced pins resolved so far
        let mut pins: Vec<(f64, f64)> = Vec::new();

        for trigger in &mut self.triggers {
            let bounds_spec = &trigger.spec.bounds;
            let Some(natural) = cache.element_box(provider, &bounds_spec.element) else {
                warn!(
                    trigger = %trigger.handle,
                    element = %bounds_spec.element,
                    "Trigger element not found, trigger inactive"
                );
                trigger.bounds = None;
                continue;
            };

            let track = match bounds_spec.track() {
                Some(track) => match cache.element_box(provider, track) {
                    Some(track_box) => Some(track_box),
                    None => {
                        warn!(trigger = %trigger.handle, track = %track, "Track element not found");
                        trigger.bounds = None;
                        continue;
                    }
                },
                None => None,
            };

            let shift = spacing_before(&pins, natural.top);
            let element = ElementBox {
                top: natural.top + shift,
                ..natural
            };

            let resolved = bounds_spec.resolve(&ResolveInput {
                viewport,
                element,
                track: track.as_ref(),
                horizontal_margin,
            });

            if let Some(bounds) = resolved {
                if bounds.is_degenerate() {
                    warn!(
                        trigger = %trigger.handle,
                        start = bounds.start,
                        end = bounds.end,
                        "Degenerate trigger bounds, completes at start"
                    );
                }
                if let Some(pin) = trigger.pin.as_mut() {
                    pin.set_distance(bounds.distance());
                    if pin.has_spacing() {
                        pins.push((natural.top + natural.height, pin.distance()));
                    }
                }
                debug!(trigger = %trigger.handle, start = bounds.start, end = bounds.end, "Resolved bounds");
            }
            trigger.bounds = resolved;
        }

        self.spacers = pins;
        self.resolved_generation = Some(cache.generation());
        self.stale = false;
    }

    /// Recompute progress for every trigger at scroll `offset`
    ///
    /// Boundary and pin events are appended to `events`; triggers whose
    /// playhead or pin offset moved are returned in registration order.
    pub fn update(
        &mut self,
        offset: f64,
        dt: f64,
        cache: &mut LayoutCache,
        provider: &dyn LayoutProvider,
        events: &mut Vec<TriggerEvent>,
    ) -> Vec<TriggerUpdate> {
        self.refresh(cache, provider);

        let epsilon = self.config.progress_epsilon;
        let mut updates = Vec::new();

        for trigger in &mut self.triggers {
            let Some(bounds) = trigger.bounds else {
                continue;
            };

            let previous = trigger.progress;
            let progress = bounds.progress(offset);
            trigger.progress = progress;
            push_boundary_events(trigger.handle, previous, progress, events);

            let mut pin_offset = None;
            if let Some(pin) = trigger.pin.as_mut() {
                for transition in pin.update(progress) {
                    let reserved = match transition {
                        PinTransition::Pinned => pin.distance(),
                        PinTransition::Released | PinTransition::Unpinned => 0.0,
                    };
                    debug!(trigger = %trigger.handle, ?transition, reserved, "Pin transition");
                    events.push(TriggerEvent::Pin {
                        trigger: trigger.handle,
                        transition,
                        reserved,
                    });
                }
                pin_offset = Some(pin.offset(offset, bounds.start));
            }

            trigger.advance_playhead(dt, epsilon);
            let playhead_changed = trigger.playhead_changed(epsilon);
            let pin_changed = pin_offset.is_some() && pin_offset != trigger.pin_offset;

            if playhead_changed || pin_changed {
                if playhead_changed {
                    trigger.notified = Some(trigger.playhead);
                }
                trigger.pin_offset = pin_offset;
                updates.push(TriggerUpdate {
                    trigger: trigger.handle,
                    progress,
                    playhead: trigger.playhead,
                    pin_offset,
                });
            }
        }

        updates
    }

    /// Whether any scrub-lagged playhead is still catching up
    pub fn is_catching_up(&self) -> bool {
        self.triggers
            .iter()
            .any(|t| t.bounds.is_some() && t.playhead != t.progress)
    }

    /// Pin states of every pinned trigger, in registration order
    pub fn pin_states(&self) -> impl Iterator<Item = (TriggerHandle, PinState)> + '_ {
        self.triggers
            .iter()
            .filter_map(|t| t.pin.as_ref().map(|p| (t.handle, p.state())))
    }
}

/// Content below a spaced pin sits lower by the pin distance
fn spacing_before(spacers: &[(f64, f64)], top: f64) -> f64 {
    spacers
        .iter()
        .filter(|(bottom, _)| top >= *bottom)
        .map(|(_, distance)| distance)
        .sum()
}

fn push_boundary_events(
    trigger: TriggerHandle,
    previous: f64,
    progress: f64,
    events: &mut Vec<TriggerEvent>,
) {
    let mut push = |edge, direction| {
        events.push(TriggerEvent::Boundary {
            trigger,
            edge,
            direction,
        })
    };

    if progress > previous {
        if previous <= 0.0 && progress > 0.0 {
            push(Boundary::Start, CrossDirection::Forward);
        }
        if previous < 1.0 && progress >= 1.0 {
            push(Boundary::End, CrossDirection::Forward);
        }
    } else if progress < previous {
        if previous >= 1.0 && progress < 1.0 {
            push(Boundary::End, CrossDirection::Backward);
        }
        if previous > 0.0 && progress <= 0.0 {
            push(Boundary::Start, CrossDirection::Backward);
        }
    }
}
