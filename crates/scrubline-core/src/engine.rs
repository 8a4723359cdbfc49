//! The frame driver
//!
//! [`ScrollEngine`] owns the simulator, the trigger registry and the layout
//! cache. The host owns the engine and calls [`ScrollEngine::frame`] from its
//! display-refresh callback; nothing in here is global, so several engines
//! can live side by side.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::layout::{ElementRef, LayoutCache, LayoutProvider};
use crate::scroll::{InertialScroller, InputSource, JumpOptions, ScrollFrame, VirtualScrollState};
use crate::timeline::{compose, ComposeOptions, InitialValues, SegmentSpec, Timeline};
use crate::trigger::{TriggerEvent, TriggerHandle, TriggerRegistry, TriggerSpec, TriggerUpdate};
use crate::{Error, Result};

/// Where anchor navigation goes
#[derive(Debug, Clone, PartialEq)]
pub enum JumpTarget {
    Position(f64),
    /// Top of an element, after pin spacing
    Element(ElementRef),
}

impl From<f64> for JumpTarget {
    fn from(position: f64) -> Self {
        JumpTarget::Position(position)
    }
}

impl From<ElementRef> for JumpTarget {
    fn from(element: ElementRef) -> Self {
        JumpTarget::Element(element)
    }
}

impl From<&str> for JumpTarget {
    fn from(element: &str) -> Self {
        JumpTarget::Element(ElementRef::from(element))
    }
}

/// One property change to apply to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub trigger: TriggerHandle,
    pub element: ElementRef,
    pub property: String,
    pub value: f64,
}

/// Everything a frame produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    /// `None` while the simulator is stopped or the frame was skipped
    pub scroll: Option<ScrollFrame>,
    pub triggers: Vec<TriggerUpdate>,
    pub properties: Vec<PropertyUpdate>,
    pub events: Vec<TriggerEvent>,
}

impl FrameOutput {
    /// Nothing for the host to apply
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty() && self.properties.is_empty() && self.events.is_empty()
    }
}

/// Explicit context object for one scroll-driven page
#[derive(Debug)]
pub struct ScrollEngine {
    config: EngineConfig,
    scroller: InertialScroller,
    triggers: TriggerRegistry,
    layout: LayoutCache,
    last_frame: Option<Instant>,
    /// Last frame was settled and fully processed
    idle: bool,
    frames: u64,
}

impl Default for ScrollEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ScrollEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scroller: InertialScroller::new(config.scroll.clone()),
            triggers: TriggerRegistry::new(config.trigger.clone()),
            layout: LayoutCache::new(),
            config,
            last_frame: None,
            idle: false,
            frames: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.scroller.set_config(config.scroll.clone());
        self.triggers.set_config(config.trigger.clone());
        self.config = config;
        self.idle = false;
    }

    pub fn scroll_state(&self) -> VirtualScrollState {
        self.scroller.state()
    }

    pub fn scroller(&self) -> &InertialScroller {
        &self.scroller
    }

    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    /// Number of frames driven so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Feed a raw input delta
    pub fn scroll_by(&mut self, delta: f64, source: InputSource) {
        self.scroller.scroll_by(delta, source);
        self.idle = false;
    }

    /// Viewport resized or content changed; bounds are resolved again on the
    /// next frame
    pub fn invalidate_layout(&mut self) {
        debug!("Layout invalidated");
        self.layout.invalidate();
        self.idle = false;
    }

    /// Compose a timeline from authored segments
    pub fn compose_timeline(
        &self,
        specs: &[SegmentSpec],
        initial: &InitialValues,
        options: &ComposeOptions,
    ) -> Result<Timeline> {
        Ok(compose(specs, initial, options)?)
    }

    pub fn register_trigger(&mut self, spec: TriggerSpec, timeline: Option<Timeline>) -> TriggerHandle {
        self.idle = false;
        self.triggers.register(spec, timeline)
    }

    pub fn unregister(&mut self, handle: TriggerHandle) -> Result<()> {
        match self.triggers.unregister(handle) {
            Some(_) => {
                self.idle = false;
                Ok(())
            }
            None => Err(Error::TriggerNotFound(handle)),
        }
    }

    /// Bind (or replace) the timeline scrubbed by a trigger
    pub fn bind_timeline(&mut self, handle: TriggerHandle, timeline: Timeline) -> Result<()> {
        let trigger = self
            .triggers
            .get_mut(handle)
            .ok_or(Error::TriggerNotFound(handle))?;
        trigger.set_timeline(Some(timeline));
        self.idle = false;
        Ok(())
    }

    /// Stop scrubbing a trigger's timeline; the trigger keeps reporting
    /// progress and events
    pub fn kill_timeline(&mut self, handle: TriggerHandle) -> Result<()> {
        let trigger = self
            .triggers
            .get_mut(handle)
            .ok_or(Error::TriggerNotFound(handle))?;
        if let Some(timeline) = trigger.timeline_mut() {
            timeline.kill();
            info!(trigger = %handle, "Timeline killed");
        }
        Ok(())
    }

    /// Anchor navigation
    ///
    /// Returns `Ok(false)` when the simulator is stopped and the jump was not
    /// forced.
    pub fn jump_to(
        &mut self,
        target: impl Into<JumpTarget>,
        options: JumpOptions,
        provider: &dyn LayoutProvider,
    ) -> Result<bool> {
        let position = match target.into() {
            JumpTarget::Position(position) => position,
            JumpTarget::Element(element) => {
                let bounds = self
                    .layout
                    .element_box(provider, &element)
                    .ok_or_else(|| Error::ElementNotFound(element.to_string()))?;
                bounds.top + self.triggers.spacing_before(bounds.top)
            }
        };
        self.sync_limit(provider);
        let jumped = self.scroller.jump_to(position, options);
        if jumped {
            self.idle = false;
        }
        Ok(jumped)
    }

    /// Freeze scrolling (e.g. while a modal overlay is open)
    pub fn stop(&mut self) {
        self.scroller.stop();
    }

    pub fn start(&mut self) {
        self.scroller.start();
        self.idle = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.scroller.is_stopped()
    }

    /// Whether the next frame has work to do
    pub fn needs_frame(&self) -> bool {
        !self.idle || self.scroller.needs_update() || self.triggers.is_catching_up()
    }

    /// Drive a frame from the host's clock
    pub fn frame_at(&mut self, now: Instant, provider: &dyn LayoutProvider) -> FrameOutput {
        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.frame(dt, provider)
    }

    /// Advance everything by `dt` seconds
    ///
    /// Scroll simulation, trigger progress, then scrubbing of every trigger
    /// whose playhead moved, in registration order.
    pub fn frame(&mut self, dt: f64, provider: &dyn LayoutProvider) -> FrameOutput {
        self.frames += 1;
        self.layout.begin_frame();

        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.scroll.max_frame_secs())
        } else {
            0.0
        };

        self.triggers.refresh(&mut self.layout, provider);
        self.sync_limit(provider);

        let Some(scroll) = self.scroller.tick(dt) else {
            return FrameOutput::default();
        };

        let mut output = FrameOutput {
            scroll: Some(scroll),
            ..Default::default()
        };

        if scroll.settled && self.idle && !self.triggers.is_catching_up() {
            return output;
        }

        output.triggers = self.triggers.update(
            scroll.offset,
            dt,
            &mut self.layout,
            provider,
            &mut output.events,
        );

        for update in &output.triggers {
            let Some(timeline) = self.triggers.get(update.trigger).and_then(|t| t.timeline()) else {
                continue;
            };
            for value in timeline.evaluate(update.playhead) {
                if self.layout.element_box(provider, &value.element).is_none() {
                    warn!(
                        trigger = %update.trigger,
                        element = %value.element,
                        property = %value.property,
                        "Element detached, skipping update"
                    );
                    continue;
                }
                output.properties.push(PropertyUpdate {
                    trigger: update.trigger,
                    element: value.element,
                    property: value.property,
                    value: value.value,
                });
            }
        }

        debug!(
            offset = scroll.offset,
            triggers = output.triggers.len(),
            properties = output.properties.len(),
            events = output.events.len(),
            "Frame"
        );
        self.idle = scroll.settled;
        output
    }

    /// Keep the scroll limit at the document height plus pin spacing
    fn sync_limit(&mut self, provider: &dyn LayoutProvider) {
        let viewport = self.layout.viewport(provider);
        let document = self.layout.document_height(provider) + self.triggers.total_spacing();
        let limit = (document - viewport.height).max(0.0);
        if limit != self.scroller.limit() {
            debug!(limit, "Scroll limit changed");
            self.scroller.set_limit(limit);
        }
    }
}
