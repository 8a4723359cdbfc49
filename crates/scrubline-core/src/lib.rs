pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod layout;
pub mod scene;
pub mod scroll;
pub mod timeline;
pub mod timing;
pub mod trigger;

pub use config::{DecayCurve, EngineConfig, ScrollConfig, TriggerConfig};
pub use easing::{Ease, Easing};
pub use engine::{FrameOutput, JumpTarget, PropertyUpdate, ScrollEngine};
pub use error::{CompositionError, Error, Result};
pub use layout::{ElementBox, ElementRef, LayoutProvider, StaticLayout, Viewport};
pub use scene::Scene;
pub use scroll::{InertialScroller, InputSource, JumpOptions};
pub use timeline::{SegmentSpec, Timeline, TimelineBuilder};
pub use trigger::{BoundsSpec, TriggerEvent, TriggerHandle, TriggerSpec};
