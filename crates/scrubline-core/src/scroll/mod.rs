//! Inertial scrolling for the virtual scroll position
//!
//! Raw wheel/touch deltas move a target; the simulator turns that target into
//! a smoothed, frame-rate independent position that drives every trigger.
//!
//! # Usage
//!
//! ```
//! use scrubline_core::scroll::{InertialScroller, InputSource};
//!
//! let mut scroller = InertialScroller::default();
//! scroller.scroll_by(120.0, InputSource::Wheel);
//!
//! // once per display frame
//! if let Some(frame) = scroller.tick(1.0 / 60.0) {
//!     assert!(frame.offset > 0.0);
//! }
//! ```

mod simulator;

pub use simulator::{
    InertialScroller, InputSource, JumpOptions, ScrollDirection, ScrollFrame, VirtualScrollState,
};
