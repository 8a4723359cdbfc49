//! Authored segment specs and their composed, absolute form

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::position::Position;
use crate::easing::Easing;
use crate::layout::ElementRef;

/// Start and end value of one animated property
///
/// A missing `from` is taken from whatever value the property holds when
/// the segment starts. Deserializes from a bare number as a `to` value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TweenRepr")]
pub struct PropertyTween {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    pub to: f64,
}

impl PropertyTween {
    pub fn to(to: f64) -> Self {
        Self { from: None, to }
    }

    pub fn from_to(from: f64, to: f64) -> Self {
        Self {
            from: Some(from),
            to,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TweenRepr {
    To(f64),
    Full {
        #[serde(default)]
        from: Option<f64>,
        to: f64,
    },
}

impl From<TweenRepr> for PropertyTween {
    fn from(repr: TweenRepr) -> Self {
        match repr {
            TweenRepr::To(to) => PropertyTween::to(to),
            TweenRepr::Full { from, to } => PropertyTween { from, to },
        }
    }
}

/// One authored step of a timeline
///
/// With `stagger` set this is a template: it expands into one segment per
/// target, the i-th shifted by `i * stagger`. A spec without properties is a
/// hold that only paces what follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    #[serde(default)]
    pub targets: Vec<ElementRef>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyTween>,
    pub duration: f64,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub ease: Easing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagger: Option<f64>,
}

impl SegmentSpec {
    /// A segment animating `targets` over `duration`
    pub fn tween<I, T>(targets: I, duration: f64) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ElementRef>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            properties: BTreeMap::new(),
            duration,
            position: Position::default(),
            ease: Easing::default(),
            stagger: None,
        }
    }

    /// Pure duration, no property changes
    pub fn hold(duration: f64) -> Self {
        Self::tween(Vec::<ElementRef>::new(), duration)
    }

    pub fn to(mut self, property: impl Into<String>, to: f64) -> Self {
        self.properties.insert(property.into(), PropertyTween::to(to));
        self
    }

    pub fn from_to(mut self, property: impl Into<String>, from: f64, to: f64) -> Self {
        self.properties
            .insert(property.into(), PropertyTween::from_to(from, to));
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn ease(mut self, ease: Easing) -> Self {
        self.ease = ease;
        self
    }

    pub fn stagger(mut self, delta: f64) -> Self {
        self.stagger = Some(delta);
        self
    }

    #[inline]
    pub fn is_hold(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A property change with both ends resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub element: ElementRef,
    pub property: String,
    pub from: f64,
    pub to: f64,
}

/// A composed segment in absolute timeline time
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Index of the authored `SegmentSpec` this segment came from
    pub source: usize,
    pub targets: Vec<ElementRef>,
    pub tweens: Vec<Tween>,
    pub start: f64,
    pub end: f64,
    pub ease: Easing,
}

impl Segment {
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_hold(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Local progress at timeline time `tau`, `None` before the segment starts
    pub fn local_progress(&self, tau: f64) -> Option<f64> {
        if tau < self.start {
            return None;
        }
        if self.end <= self.start || tau >= self.end {
            return Some(1.0);
        }
        Some(((tau - self.start) / (self.end - self.start)).clamp(0.0, 1.0))
    }
}
