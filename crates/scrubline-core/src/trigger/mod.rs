//! Scroll triggers: map regions of content to a normalized progress
//!
//! Each trigger resolves its [`BoundsSpec`] against the current layout into
//! an absolute scroll range, then tracks where the smoothed scroll offset
//! sits within it. Pinned triggers additionally hold their element in place
//! while active.

mod bounds;
mod pin;
mod registry;

pub use bounds::{
    Anchor, BoundsSpec, Edge, EndRule, EndRuleRepr, Length, ResolveInput, ResolvedBounds,
};
pub use pin::{Pin, PinState, PinTransition};
pub use registry::{
    Boundary, CrossDirection, Trigger, TriggerEvent, TriggerHandle, TriggerRegistry,
    TriggerSpec, TriggerUpdate,
};
