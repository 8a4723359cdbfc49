//! Trigger bounds rules and their resolution to scroll coordinates
//!
//! Rules follow the `"<element anchor> <viewport anchor>"` notation: the
//! trigger starts when the element anchor meets the viewport anchor, e.g.
//! `"top 80%"` or `"center center"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::layout::{ElementBox, ElementRef, Viewport};
use crate::Error;

/// A point along an element or the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Fraction of the extent, `top` = 0, `center` = 0.5, `bottom` = 1
    Fraction(f64),
    Pixels(f64),
}

impl Anchor {
    #[inline]
    pub fn resolve(&self, extent: f64) -> f64 {
        match *self {
            Anchor::Fraction(f) => f * extent,
            Anchor::Pixels(px) => px,
        }
    }
}

impl FromStr for Anchor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidRule(format!("invalid anchor '{}'", s));
        let parse_number = |n: &str| n.trim().parse::<f64>().ok().filter(|v| v.is_finite());

        match s.trim() {
            "top" => Ok(Anchor::Fraction(0.0)),
            "center" => Ok(Anchor::Fraction(0.5)),
            "bottom" => Ok(Anchor::Fraction(1.0)),
            other => {
                if let Some(pct) = other.strip_suffix('%') {
                    parse_number(pct)
                        .map(|v| Anchor::Fraction(v / 100.0))
                        .ok_or_else(invalid)
                } else {
                    let px = other.strip_suffix("px").unwrap_or(other);
                    parse_number(px).map(Anchor::Pixels).ok_or_else(invalid)
                }
            }
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Anchor::Fraction(v) if v == 0.0 => f.write_str("top"),
            Anchor::Fraction(v) if v == 0.5 => f.write_str("center"),
            Anchor::Fraction(v) if v == 1.0 => f.write_str("bottom"),
            Anchor::Fraction(v) => write!(f, "{}%", v * 100.0),
            Anchor::Pixels(px) => write!(f, "{}px", px),
        }
    }
}

/// The scroll position at which an element anchor meets a viewport anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Edge {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl Edge {
    pub fn new(element: Anchor, viewport: Anchor) -> Self {
        Self { element, viewport }
    }

    /// Scroll offset at which the two anchors line up
    pub fn resolve(&self, element: &ElementBox, viewport: &Viewport) -> f64 {
        element.top + self.element.resolve(element.height) - self.viewport.resolve(viewport.height)
    }
}

impl FromStr for Edge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(element), Some(viewport), None) => Ok(Edge {
                element: element.parse()?,
                viewport: viewport.parse()?,
            }),
            _ => Err(Error::InvalidRule(format!(
                "expected '<element> <viewport>', got '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Edge {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Edge> for String {
    fn from(edge: Edge) -> Self {
        edge.to_string()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

/// A scroll distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Pixels(f64),
    /// Percentage of the viewport height
    ViewportPercent(f64),
}

impl Length {
    pub fn resolve(&self, viewport: &Viewport) -> f64 {
        match *self {
            Length::Pixels(px) => px,
            Length::ViewportPercent(pct) => pct / 100.0 * viewport.height,
        }
    }
}

/// Where a trigger ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EndRuleRepr", into = "EndRuleRepr")]
pub enum EndRule {
    Edge(Edge),
    /// Fixed distance past the start, `"+=100%"` or `"+=500"`
    Distance(Length),
    /// Scroll distance needed to pan a horizontal track across the viewport:
    /// `track scroll width - viewport width + margin`
    HorizontalTrack {
        track: ElementRef,
        /// Overrides the configured horizontal margin
        margin: Option<f64>,
    },
}

impl FromStr for EndRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(distance) = trimmed.strip_prefix("+=") {
            let invalid = || Error::InvalidRule(format!("invalid distance '{}'", s));
            let parse = |n: &str| n.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0);
            let length = if let Some(pct) = distance.strip_suffix('%') {
                Length::ViewportPercent(parse(pct).ok_or_else(invalid)?)
            } else {
                let px = distance.strip_suffix("px").unwrap_or(distance);
                Length::Pixels(parse(px).ok_or_else(invalid)?)
            };
            return Ok(EndRule::Distance(length));
        }
        trimmed.parse().map(EndRule::Edge)
    }
}

impl fmt::Display for EndRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndRule::Edge(edge) => edge.fmt(f),
            EndRule::Distance(Length::Pixels(px)) => write!(f, "+={}", px),
            EndRule::Distance(Length::ViewportPercent(pct)) => write!(f, "+={}%", pct),
            EndRule::HorizontalTrack { track, margin } => match margin {
                Some(m) => write!(f, "track({}, {})", track, m),
                None => write!(f, "track({})", track),
            },
        }
    }
}

#[doc(hidden)]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndRuleRepr {
    Rule(String),
    Track {
        track: ElementRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        margin: Option<f64>,
    },
}

impl TryFrom<EndRuleRepr> for EndRule {
    type Error = Error;

    fn try_from(value: EndRuleRepr) -> Result<Self, Self::Error> {
        match value {
            EndRuleRepr::Rule(rule) => rule.parse(),
            EndRuleRepr::Track { track, margin } => Ok(EndRule::HorizontalTrack { track, margin }),
        }
    }
}

impl From<EndRule> for EndRuleRepr {
    fn from(rule: EndRule) -> Self {
        match rule {
            EndRule::HorizontalTrack { track, margin } => EndRuleRepr::Track { track, margin },
            other => EndRuleRepr::Rule(other.to_string()),
        }
    }
}

/// The scroll range a trigger maps to [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsSpec {
    /// Element whose geometry the rules are measured against
    pub element: ElementRef,
    pub start: Edge,
    pub end: EndRule,
}

impl BoundsSpec {
    pub fn new(element: impl Into<ElementRef>, start: Edge, end: EndRule) -> Self {
        Self {
            element: element.into(),
            start,
            end,
        }
    }

    /// Build from rule strings, e.g. `("top 80%", "center center")`
    pub fn parse(element: impl Into<ElementRef>, start: &str, end: &str) -> crate::Result<Self> {
        Ok(Self::new(element, start.parse()?, end.parse()?))
    }

    /// Element whose scroll width drives the end, if any
    pub fn track(&self) -> Option<&ElementRef> {
        match &self.end {
            EndRule::HorizontalTrack { track, .. } => Some(track),
            _ => None,
        }
    }
}

/// Absolute scroll range of a trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBounds {
    pub start: f64,
    pub end: f64,
}

impl ResolvedBounds {
    #[inline]
    pub fn distance(&self) -> f64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }

    /// Normalized position of `offset` within the range, clamped to [0, 1]
    ///
    /// A degenerate range is complete as soon as `offset` reaches `start`.
    pub fn progress(&self, offset: f64) -> f64 {
        if self.is_degenerate() {
            return if offset >= self.start { 1.0 } else { 0.0 };
        }
        ((offset - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }
}

/// Geometry a bounds spec is resolved against
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub viewport: Viewport,
    pub element: ElementBox,
    /// Track box for horizontal rules
    pub track: Option<&'a ElementBox>,
    pub horizontal_margin: f64,
}

impl BoundsSpec {
    /// Resolve the rules to absolute scroll coordinates
    ///
    /// Returns `None` when a horizontal rule's track is unavailable.
    /// Content that does not overflow the viewport collapses the range so
    /// the trigger completes immediately.
    pub fn resolve(&self, input: &ResolveInput<'_>) -> Option<ResolvedBounds> {
        let start = self.start.resolve(&input.element, &input.viewport);
        let end = match &self.end {
            EndRule::Edge(edge) => edge.resolve(&input.element, &input.viewport),
            EndRule::Distance(length) => start + length.resolve(&input.viewport),
            EndRule::HorizontalTrack { margin, .. } => {
                let track = input.track?;
                let content = track.scroll_width.unwrap_or(track.width);
                if content <= input.viewport.width {
                    start
                } else {
                    let margin = margin.unwrap_or(input.horizontal_margin);
                    start + (content - input.viewport.width + margin).max(0.0)
                }
            }
        };
        Some(ResolvedBounds { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 800.0,
    };

    fn input(element: ElementBox) -> ResolveInput<'static> {
        ResolveInput {
            viewport: VIEWPORT,
            element,
            track: None,
            horizontal_margin: 200.0,
        }
    }

    #[test]
    fn test_progress_mapping() {
        let bounds = ResolvedBounds {
            start: 100.0,
            end: 300.0,
        };
        assert_eq!(bounds.progress(100.0), 0.0);
        assert_eq!(bounds.progress(200.0), 0.5);
        assert_eq!(bounds.progress(300.0), 1.0);
        assert_eq!(bounds.progress(50.0), 0.0);
        assert_eq!(bounds.progress(400.0), 1.0);
    }

    #[test]
    fn test_degenerate_progress() {
        let bounds = ResolvedBounds {
            start: 100.0,
            end: 100.0,
        };
        assert_eq!(bounds.progress(99.0), 0.0);
        assert_eq!(bounds.progress(100.0), 1.0);
        assert_eq!(bounds.progress(1000.0), 1.0);
    }

    #[test]
    fn test_parse_edges() {
        let edge: Edge = "top 80%".parse().unwrap();
        assert_eq!(edge, Edge::new(Anchor::Fraction(0.0), Anchor::Fraction(0.8)));

        let edge: Edge = "center center".parse().unwrap();
        assert_eq!(edge, Edge::new(Anchor::Fraction(0.5), Anchor::Fraction(0.5)));

        let edge: Edge = "bottom 120px".parse().unwrap();
        assert_eq!(edge, Edge::new(Anchor::Fraction(1.0), Anchor::Pixels(120.0)));

        assert!("top".parse::<Edge>().is_err());
        assert!("top middle".parse::<Edge>().is_err());
        assert!("top 80% extra".parse::<Edge>().is_err());
    }

    #[test]
    fn test_parse_end_rules() {
        assert_eq!(
            "+=100%".parse::<EndRule>().unwrap(),
            EndRule::Distance(Length::ViewportPercent(100.0))
        );
        assert_eq!(
            "+=500".parse::<EndRule>().unwrap(),
            EndRule::Distance(Length::Pixels(500.0))
        );
        assert!(matches!(
            "bottom bottom".parse::<EndRule>().unwrap(),
            EndRule::Edge(_)
        ));
        assert!("+=-5".parse::<EndRule>().is_err());
        assert!("+=abc".parse::<EndRule>().is_err());
    }

    #[test]
    fn test_resolve_section_rules() {
        // section 1000px tall starting at 2000
        let spec = BoundsSpec::parse("section", "top 80%", "center center").unwrap();
        let bounds = spec.resolve(&input(ElementBox::new(2000.0, 1000.0))).unwrap();
        assert_eq!(bounds.start, 2000.0 - 640.0);
        assert_eq!(bounds.end, 2500.0 - 400.0);
    }

    #[test]
    fn test_resolve_pin_distance_rule() {
        let spec = BoundsSpec::parse("hero", "top top", "+=100%").unwrap();
        let bounds = spec.resolve(&input(ElementBox::new(0.0, 800.0))).unwrap();
        assert_eq!(bounds.start, 0.0);
        assert_eq!(bounds.end, 800.0);
    }

    #[test]
    fn test_resolve_horizontal_track() {
        let spec = BoundsSpec::new(
            "portfolio",
            "top top".parse().unwrap(),
            EndRule::HorizontalTrack {
                track: ElementRef::from("track"),
                margin: None,
            },
        );
        let track = ElementBox::new(3000.0, 800.0).with_scroll_width(4000.0);
        let bounds = spec
            .resolve(&ResolveInput {
                track: Some(&track),
                ..input(ElementBox::new(3000.0, 800.0))
            })
            .unwrap();
        assert_eq!(bounds.start, 3000.0);
        assert_eq!(bounds.end, 3000.0 + 4000.0 - 1280.0 + 200.0);
    }

    #[test]
    fn test_narrow_track_completes_immediately() {
        let spec = BoundsSpec::new(
            "portfolio",
            "top top".parse().unwrap(),
            EndRule::HorizontalTrack {
                track: ElementRef::from("track"),
                margin: Some(50.0),
            },
        );
        let track = ElementBox::new(0.0, 800.0).with_scroll_width(1000.0);
        let bounds = spec
            .resolve(&ResolveInput {
                track: Some(&track),
                ..input(ElementBox::new(500.0, 800.0))
            })
            .unwrap();
        assert!(bounds.is_degenerate());
        assert_eq!(bounds.progress(500.0), 1.0);
    }

    #[test]
    fn test_missing_track_is_unresolved() {
        let spec = BoundsSpec::new(
            "portfolio",
            "top top".parse().unwrap(),
            EndRule::HorizontalTrack {
                track: ElementRef::from("track"),
                margin: None,
            },
        );
        assert!(spec.resolve(&input(ElementBox::new(0.0, 800.0))).is_none());
    }

    #[test]
    fn test_bounds_spec_from_toml() {
        let spec: BoundsSpec = toml::from_str(
            r#"
            element = "portfolio"
            start = "top top"
            end = { track = "track", margin = 100.0 }
            "#,
        )
        .unwrap();
        assert_eq!(spec.track(), Some(&ElementRef::from("track")));

        let spec: BoundsSpec = toml::from_str(
            r#"
            element = "about"
            start = "top 80%"
            end = "center center"
            "#,
        )
        .unwrap();
        assert_eq!(spec.end, "center center".parse().unwrap());
    }
}
