//! Inertial scroll simulator
//!
//! Input handlers move a raw target; once per display frame `tick` pulls the
//! smoothed virtual position toward it with a frame-rate independent decay.

use tracing::{debug, info, warn};

use crate::config::{DecayCurve, ScrollConfig};
use crate::timing::{exponential_decay_factor, is_settled, lerp_decay_factor};

/// Where the raw input came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Wheel,
    Touch,
    /// Deltas that bypass the configured multipliers (keyboard, scripted)
    Direct,
}

/// Direction of travel of the smoothed position this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    Forward,
    Backward,
    #[default]
    Idle,
}

/// Scroll state shared with the rest of the engine
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VirtualScrollState {
    /// Latest absolute input-driven position
    pub raw_target: f64,
    /// Position every downstream consumer reads
    pub smoothed: f64,
    /// Units per second over the last frame
    pub velocity: f64,
}

/// One simulator emission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollFrame {
    pub offset: f64,
    pub velocity: f64,
    pub direction: ScrollDirection,
    /// The smoothed position has reached its target
    pub settled: bool,
}

/// Options for anchor navigation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpOptions {
    /// Approach the target with the usual smoothing instead of snapping
    pub animated: bool,
    /// Added to the target before clamping (e.g. -80 for a fixed header)
    pub offset: f64,
    /// Jump even while the simulator is stopped
    pub force: bool,
}

impl Default for JumpOptions {
    fn default() -> Self {
        Self {
            animated: true,
            offset: 0.0,
            force: false,
        }
    }
}

impl JumpOptions {
    pub fn immediate() -> Self {
        Self {
            animated: false,
            ..Default::default()
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}

/// Inertial scroll simulator
///
/// Call `scroll_by()` from input handlers and `tick()` once per frame to
/// advance the smoothed position.
#[derive(Debug, Clone)]
pub struct InertialScroller {
    config: ScrollConfig,
    state: VirtualScrollState,
    /// Largest reachable scroll position
    limit: f64,
    stopped: bool,
}

impl Default for InertialScroller {
    fn default() -> Self {
        Self::new(ScrollConfig::default())
    }
}

impl InertialScroller {
    /// Create a new simulator with configuration
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            state: VirtualScrollState::default(),
            limit: f64::INFINITY,
            stopped: false,
        }
    }

    /// Update configuration
    pub fn set_config(&mut self, config: ScrollConfig) {
        self.config = config;
    }

    /// Get current configuration
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> VirtualScrollState {
        self.state
    }

    /// Current smoothed position
    #[inline]
    pub fn smoothed(&self) -> f64 {
        self.state.smoothed
    }

    /// Position the smoothed value is heading to
    #[inline]
    pub fn target(&self) -> f64 {
        self.state.raw_target
    }

    #[inline]
    pub fn limit(&self) -> f64 {
        self.limit
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Check if there's remaining distance to cover
    #[inline]
    pub fn needs_update(&self) -> bool {
        !self.stopped && self.state.raw_target != self.state.smoothed
    }

    /// Set the largest reachable position, clamping the current state into it
    pub fn set_limit(&mut self, limit: f64) {
        if !limit.is_finite() || limit < 0.0 {
            warn!(limit, "Ignoring invalid scroll limit");
            return;
        }
        self.limit = limit;
        self.state.raw_target = self.clamp(self.state.raw_target);
        self.state.smoothed = self.clamp(self.state.smoothed);
    }

    fn clamp(&self, position: f64) -> f64 {
        // NaN passes through untouched and is caught by tick()
        position.clamp(0.0, self.limit)
    }

    /// Accumulate an input delta (positive = forward)
    ///
    /// Ignored while stopped.
    pub fn scroll_by(&mut self, delta: f64, source: InputSource) {
        if self.stopped {
            debug!(delta, "Scroll input ignored while stopped");
            return;
        }

        let multiplier = match source {
            InputSource::Wheel => self.config.wheel_multiplier,
            InputSource::Touch => self.config.touch_multiplier,
            InputSource::Direct => 1.0,
        };
        self.state.raw_target = self.clamp(self.state.raw_target + delta * multiplier);

        if !self.config.is_smooth() {
            self.state.smoothed = self.state.raw_target;
        }
    }

    /// Move the raw target to an absolute position
    pub fn set_target(&mut self, position: f64) {
        if self.stopped {
            debug!(position, "Scroll target ignored while stopped");
            return;
        }
        self.state.raw_target = self.clamp(position);
        if !self.config.is_smooth() {
            self.state.smoothed = self.state.raw_target;
        }
    }

    /// Anchor navigation to an absolute position
    ///
    /// Returns `false` when the jump was ignored because the simulator is
    /// stopped and the jump was not forced.
    pub fn jump_to(&mut self, position: f64, options: JumpOptions) -> bool {
        if self.stopped && !options.force {
            debug!(position, "Jump ignored while stopped");
            return false;
        }

        let target = self.clamp(position + options.offset);
        if !target.is_finite() {
            warn!(position, "Ignoring jump to non-finite position");
            return false;
        }

        self.state.raw_target = target;
        if !options.animated || !self.config.is_smooth() {
            self.state.smoothed = target;
            self.state.velocity = 0.0;
        }
        debug!(target, animated = options.animated, "Jump");
        true
    }

    /// Freeze the smoothed position and ignore input (modal overlays)
    pub fn stop(&mut self) {
        if !self.stopped {
            info!(offset = self.state.smoothed, "Scroll stopped");
            self.stopped = true;
            self.state.velocity = 0.0;
        }
    }

    /// Resume convergence from wherever it left off
    pub fn start(&mut self) {
        if self.stopped {
            info!(offset = self.state.smoothed, "Scroll started");
            self.stopped = false;
        }
    }

    /// Cancel the remaining approach and stay at the current position
    pub fn cancel(&mut self) {
        self.state.raw_target = self.state.smoothed;
        self.state.velocity = 0.0;
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.state = VirtualScrollState::default();
        self.stopped = false;
    }

    /// Advance one frame by `dt` seconds
    ///
    /// Returns `None` when no frame is emitted: the simulator is stopped, or
    /// the raw target became non-finite (the target is then restored to the
    /// last valid position and the frame is skipped).
    pub fn tick(&mut self, dt: f64) -> Option<ScrollFrame> {
        if self.stopped {
            return None;
        }

        if !self.state.raw_target.is_finite() {
            warn!(
                smoothed = self.state.smoothed,
                "Non-finite scroll target, skipping frame"
            );
            self.state.raw_target = self.state.smoothed;
            self.state.velocity = 0.0;
            return None;
        }

        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_frame_secs())
        } else {
            0.0
        };
        let previous = self.state.smoothed;
        let target = self.state.raw_target;

        let next = if self.config.is_smooth() {
            let k = match self.config.decay {
                DecayCurve::Exponential => exponential_decay_factor(dt, self.config.decay_secs()),
                DecayCurve::Lerp { factor } => lerp_decay_factor(dt, factor),
            };
            let next = previous + (target - previous) * k;
            if is_settled(next, target, self.config.stop_epsilon) {
                target
            } else {
                next
            }
        } else {
            target
        };

        self.state.smoothed = next;
        self.state.velocity = if dt > 0.0 { (next - previous) / dt } else { 0.0 };

        let direction = if next > previous {
            ScrollDirection::Forward
        } else if next < previous {
            ScrollDirection::Backward
        } else {
            ScrollDirection::Idle
        };

        Some(ScrollFrame {
            offset: next,
            velocity: self.state.velocity,
            direction,
            settled: next == target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn scroller() -> InertialScroller {
        InertialScroller::new(ScrollConfig {
            duration_ms: 1000,
            ..Default::default()
        })
    }

    #[test]
    fn test_instant_scroll_when_disabled() {
        let config = ScrollConfig {
            smooth_enabled: false,
            ..Default::default()
        };
        let mut sim = InertialScroller::new(config);

        sim.scroll_by(100.0, InputSource::Wheel);
        assert_eq!(sim.smoothed(), 100.0);
        assert!(!sim.needs_update());
    }

    #[test]
    fn test_converges_without_overshoot() {
        for duration_ms in [50, 400, 1400, 5000] {
            let mut sim = InertialScroller::new(ScrollConfig {
                duration_ms,
                ..Default::default()
            });
            sim.set_target(1000.0);

            let mut ticks = 0;
            loop {
                let frame = sim.tick(DT).unwrap();
                assert!(frame.offset <= 1000.0, "overshoot at D={}ms", duration_ms);
                ticks += 1;
                if frame.settled {
                    break;
                }
                assert!(ticks < 10_000, "no convergence at D={}ms", duration_ms);
            }
            assert_eq!(sim.smoothed(), 1000.0);
        }
    }

    #[test]
    fn test_monotone_approach() {
        let mut sim = scroller();
        sim.set_target(500.0);
        let mut prev = sim.smoothed();
        for _ in 0..120 {
            let frame = sim.tick(DT).unwrap();
            assert!(frame.offset >= prev);
            assert!(frame.offset <= 500.0);
            prev = frame.offset;
        }
    }

    #[test]
    fn test_frame_rate_independent() {
        let mut fast = scroller();
        let mut slow = scroller();
        fast.set_target(1000.0);
        slow.set_target(1000.0);

        for _ in 0..12 {
            fast.tick(1.0 / 120.0);
        }
        for _ in 0..6 {
            slow.tick(1.0 / 60.0);
        }
        assert!((fast.smoothed() - slow.smoothed()).abs() < 1e-6);
    }

    #[test]
    fn test_reaches_most_of_distance_after_duration() {
        let mut sim = scroller();
        sim.set_target(1000.0);
        for _ in 0..60 {
            sim.tick(DT);
        }
        assert!(sim.smoothed() > 999.0);
    }

    #[test]
    fn test_stop_freezes_and_start_resumes() {
        let mut sim = scroller();
        sim.scroll_by(400.0, InputSource::Wheel);
        sim.tick(DT);
        let frozen = sim.smoothed();

        sim.stop();
        sim.scroll_by(300.0, InputSource::Wheel);
        assert!(sim.tick(DT).is_none());
        assert_eq!(sim.smoothed(), frozen);
        assert_eq!(sim.target(), 400.0);

        sim.start();
        let frame = sim.tick(DT).unwrap();
        assert!(frame.offset > frozen);
        assert!(frame.offset < 400.0);
    }

    #[test]
    fn test_non_finite_target_skips_frame() {
        let mut sim = scroller();
        sim.set_target(200.0);
        sim.tick(DT);
        let held = sim.smoothed();

        sim.scroll_by(f64::NAN, InputSource::Wheel);
        assert!(sim.tick(DT).is_none());
        assert_eq!(sim.smoothed(), held);

        // recovers on the next input
        sim.scroll_by(50.0, InputSource::Direct);
        let frame = sim.tick(DT).unwrap();
        assert!(frame.offset.is_finite());
        assert_eq!(sim.target(), held + 50.0);
    }

    #[test]
    fn test_jump_modes() {
        let mut sim = scroller();
        assert!(sim.jump_to(800.0, JumpOptions::immediate().with_offset(-80.0)));
        assert_eq!(sim.smoothed(), 720.0);
        assert_eq!(sim.target(), 720.0);

        assert!(sim.jump_to(100.0, JumpOptions::default()));
        assert_eq!(sim.smoothed(), 720.0);
        assert_eq!(sim.target(), 100.0);
        let frame = sim.tick(DT).unwrap();
        assert_eq!(frame.direction, ScrollDirection::Backward);
    }

    #[test]
    fn test_jump_ignored_while_stopped_unless_forced() {
        let mut sim = scroller();
        sim.stop();
        assert!(!sim.jump_to(300.0, JumpOptions::immediate()));
        assert_eq!(sim.smoothed(), 0.0);

        let forced = JumpOptions {
            force: true,
            ..JumpOptions::immediate()
        };
        assert!(sim.jump_to(300.0, forced));
        assert_eq!(sim.smoothed(), 300.0);
    }

    #[test]
    fn test_limit_clamps_target() {
        let mut sim = scroller();
        sim.set_limit(500.0);
        sim.scroll_by(900.0, InputSource::Wheel);
        assert_eq!(sim.target(), 500.0);
        sim.scroll_by(-2000.0, InputSource::Wheel);
        assert_eq!(sim.target(), 0.0);
    }

    #[test]
    fn test_multipliers_apply_per_source() {
        let mut sim = InertialScroller::new(ScrollConfig {
            wheel_multiplier: 2.0,
            touch_multiplier: 0.5,
            ..Default::default()
        });
        sim.scroll_by(10.0, InputSource::Wheel);
        sim.scroll_by(10.0, InputSource::Touch);
        sim.scroll_by(10.0, InputSource::Direct);
        assert_eq!(sim.target(), 35.0);
    }

    #[test]
    fn test_lerp_decay_converges() {
        let mut sim = InertialScroller::new(ScrollConfig {
            decay: DecayCurve::Lerp { factor: 0.1 },
            ..Default::default()
        });
        sim.set_target(100.0);
        let frame = sim.tick(DT).unwrap();
        assert!((frame.offset - 10.0).abs() < 1e-9);
        for _ in 0..500 {
            sim.tick(DT);
        }
        assert_eq!(sim.smoothed(), 100.0);
    }
}
