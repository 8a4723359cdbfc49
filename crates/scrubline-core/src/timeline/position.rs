//! Where a segment starts, relative to what was authored before it

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// Offset reference of an authored segment
///
/// Written the way timelines are usually authored: `">"` after the previous
/// segment, `"<"` with it, `"+=0.1"` past the current end of the timeline,
/// or a plain number for an absolute time. Resolved once when the timeline is
/// composed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    /// Start where the previous segment ends
    #[default]
    Sequential,
    Absolute(f64),
    /// `"<"`, `"<+=k"`, `"<-=k"`
    RelativeToPreviousStart(f64),
    /// `">+=k"`, `">-=k"`
    RelativeToPreviousEnd(f64),
    /// `"+=k"`, `"-=k"`: relative to the latest end so far
    RelativeToTimelineEnd(f64),
}

impl Position {
    /// The numeric part, for validation
    pub fn value(&self) -> f64 {
        match *self {
            Position::Sequential => 0.0,
            Position::Absolute(v)
            | Position::RelativeToPreviousStart(v)
            | Position::RelativeToPreviousEnd(v)
            | Position::RelativeToTimelineEnd(v) => v,
        }
    }
}

fn parse_delta(s: &str, original: &str) -> Result<f64, Error> {
    let invalid = || Error::InvalidRule(format!("invalid position '{}'", original));
    let s = s.trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    let (sign, rest) = if let Some(rest) = s.strip_prefix("+=") {
        (1.0, rest)
    } else if let Some(rest) = s.strip_prefix("-=") {
        (-1.0, rest)
    } else {
        (1.0, s)
    };
    rest.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| sign * v)
        .ok_or_else(invalid)
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix('<') {
            return parse_delta(rest, s).map(Position::RelativeToPreviousStart);
        }
        if let Some(rest) = trimmed.strip_prefix('>') {
            return match parse_delta(rest, s)? {
                d if d == 0.0 => Ok(Position::Sequential),
                d => Ok(Position::RelativeToPreviousEnd(d)),
            };
        }
        if trimmed.starts_with("+=") || trimmed.starts_with("-=") {
            return parse_delta(trimmed, s).map(Position::RelativeToTimelineEnd);
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Position::Absolute)
            .ok_or_else(|| Error::InvalidRule(format!("invalid position '{}'", s)))
    }
}

fn write_delta(f: &mut fmt::Formatter<'_>, prefix: &str, delta: f64) -> fmt::Result {
    if delta == 0.0 {
        f.write_str(prefix)
    } else if delta > 0.0 {
        write!(f, "{}+={}", prefix, delta)
    } else {
        write!(f, "{}-={}", prefix, -delta)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Position::Sequential => f.write_str(">"),
            Position::Absolute(t) => write!(f, "{}", t),
            Position::RelativeToPreviousStart(d) => write_delta(f, "<", d),
            Position::RelativeToPreviousEnd(d) => write_delta(f, ">", d),
            Position::RelativeToTimelineEnd(d) if d < 0.0 => write!(f, "-={}", -d),
            Position::RelativeToTimelineEnd(d) => write!(f, "+={}", d),
        }
    }
}

impl Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Position::Absolute(t) => serializer.serialize_f64(t),
            _ => serializer.collect_str(self),
        }
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PositionVisitor;

        impl<'de> Visitor<'de> for PositionVisitor {
            type Value = Position;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number or a position like \"<\", \">+=0.1\" or \"-=0.2\"")
            }

            fn visit_str<E>(self, value: &str) -> Result<Position, E>
            where
                E: de::Error,
            {
                value.parse().map_err(E::custom)
            }

            fn visit_f64<E>(self, value: f64) -> Result<Position, E>
            where
                E: de::Error,
            {
                if value.is_finite() {
                    Ok(Position::Absolute(value))
                } else {
                    Err(E::custom("position must be finite"))
                }
            }

            fn visit_i64<E>(self, value: i64) -> Result<Position, E>
            where
                E: de::Error,
            {
                Ok(Position::Absolute(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Position, E>
            where
                E: de::Error,
            {
                Ok(Position::Absolute(value as f64))
            }
        }

        deserializer.deserialize_any(PositionVisitor)
    }
}
