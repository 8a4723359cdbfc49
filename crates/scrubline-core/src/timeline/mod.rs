//! Keyframe timelines driven by progress instead of wall-clock time
//!
//! Authoring produces a list of [`SegmentSpec`]s with relative positions and
//! optional stagger. [`compose`] resolves them once into an absolute
//! [`Timeline`], which can then be scrubbed to any progress in [0, 1].
//!
//! ```
//! use scrubline_core::timeline::{Position, SegmentSpec, TimelineBuilder};
//!
//! let timeline = TimelineBuilder::new()
//!     .segment(SegmentSpec::tween(["title"], 0.2).from_to("opacity", 0.0, 1.0))
//!     .segment(
//!         SegmentSpec::tween(["line"], 0.3)
//!             .from_to("scale_x", 0.0, 1.0)
//!             .at(Position::RelativeToPreviousStart(0.0)),
//!     )
//!     .compose()
//!     .unwrap();
//!
//! let values = timeline.evaluate(1.0);
//! assert!(values.iter().all(|v| v.value == 1.0));
//! ```

mod compose;
mod position;
mod scrub;
mod segment;

pub use compose::{compose, ComposeOptions, InitialValues, TimelineBuilder};
pub use position::Position;
pub use scrub::{PropertyValue, Timeline};
pub use segment::{PropertyTween, Segment, SegmentSpec, Tween};
