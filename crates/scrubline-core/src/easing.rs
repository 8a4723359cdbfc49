//! Pure easing functions for scrubbed timelines
//!
//! Easings are authored by name (`"power2.out"`, `"back.out(1.2)"`,
//! `"elastic.out(1, 0.5)"`) and map local segment time `t` to an eased
//! fraction. Overshoot families deliberately leave [0, 1] before settling.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Default overshoot for `back` easings when none is given.
pub const DEFAULT_BACK_OVERSHOOT: f64 = 1.70158;
/// Default amplitude for `elastic` easings.
pub const DEFAULT_ELASTIC_AMPLITUDE: f64 = 1.0;
/// Default period for `elastic.out` / `elastic.in`.
pub const DEFAULT_ELASTIC_PERIOD: f64 = 0.3;
/// Default period for `elastic.inOut`.
pub const DEFAULT_ELASTIC_IN_OUT_PERIOD: f64 = 0.45;

/// Which end of the curve the easing acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ease {
    In,
    Out,
    InOut,
}

impl Ease {
    fn suffix(self) -> &'static str {
        match self {
            Ease::In => "in",
            Ease::Out => "out",
            Ease::InOut => "inOut",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "in" => Some(Ease::In),
            "out" => Some(Ease::Out),
            "inout" => Some(Ease::InOut),
            _ => None,
        }
    }

    /// Build the variant from an ease-out curve.
    #[inline]
    fn shape(self, out: impl Fn(f64) -> f64, t: f64) -> f64 {
        match self {
            Ease::Out => out(t),
            Ease::In => 1.0 - out(1.0 - t),
            Ease::InOut => {
                if t < 0.5 {
                    (1.0 - out(1.0 - t * 2.0)) / 2.0
                } else {
                    0.5 + out((t - 0.5) * 2.0) / 2.0
                }
            }
        }
    }
}

/// An easing curve
///
/// `apply` is defined for every finite `t`; callers clamp `t` into [0, 1]
/// before evaluating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// Polynomial easing, `t^exponent` (quad = 2, cubic = 3, quint = 5)
    Power { exponent: i32, ease: Ease },
    Sine(Ease),
    Expo(Ease),
    /// Overshoots past the target by `overshoot` before settling
    Back { ease: Ease, overshoot: f64 },
    /// Oscillates around the target with the given amplitude and period
    Elastic { ease: Ease, amplitude: f64, period: f64 },
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Power {
            exponent: 2,
            ease: Ease::Out,
        }
    }
}

impl Easing {
    pub const CUBIC_OUT: Easing = Easing::Power {
        exponent: 3,
        ease: Ease::Out,
    };
    pub const CUBIC_IN_OUT: Easing = Easing::Power {
        exponent: 3,
        ease: Ease::InOut,
    };
    pub const QUINTIC_OUT: Easing = Easing::Power {
        exponent: 5,
        ease: Ease::Out,
    };
    pub const QUINTIC_IN_OUT: Easing = Easing::Power {
        exponent: 5,
        ease: Ease::InOut,
    };

    pub fn back(ease: Ease, overshoot: f64) -> Self {
        Easing::Back { ease, overshoot }
    }

    pub fn elastic(ease: Ease, amplitude: f64, period: f64) -> Self {
        Easing::Elastic {
            ease,
            amplitude,
            period,
        }
    }

    /// Apply the easing to local time `t`
    #[inline]
    pub fn apply(&self, t: f64) -> f64 {
        match *self {
            Easing::Linear => t,
            Easing::Power { exponent, ease } => ease.shape(|p| power_out(p, exponent), t),
            Easing::Sine(ease) => ease.shape(sine_out, t),
            Easing::Expo(ease) => ease.shape(expo_out, t),
            Easing::Back { ease, overshoot } => ease.shape(|p| back_out(p, overshoot), t),
            Easing::Elastic {
                ease,
                amplitude,
                period,
            } => ease.shape(|p| elastic_out(p, amplitude, period), t),
        }
    }
}

/// Polynomial ease-out: f(t) = 1 - (1-t)^n
#[inline]
fn power_out(t: f64, exponent: i32) -> f64 {
    1.0 - (1.0 - t).powi(exponent)
}

#[inline]
fn sine_out(t: f64) -> f64 {
    (t * FRAC_PI_2).sin()
}

/// Exponential ease-out: f(t) = 1 - 2^(-10t)
#[inline]
fn expo_out(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2.0_f64.powf(-10.0 * t)
    }
}

#[inline]
fn back_out(t: f64, overshoot: f64) -> f64 {
    if t == 0.0 {
        return 0.0;
    }
    let p = t - 1.0;
    p * p * ((overshoot + 1.0) * p + overshoot) + 1.0
}

#[inline]
fn elastic_out(t: f64, amplitude: f64, period: f64) -> f64 {
    if t >= 1.0 {
        return 1.0;
    }
    // amplitudes below 1 shorten the period instead of damping the swing
    let a = amplitude.max(1.0);
    let period = period / amplitude.min(1.0).max(f64::EPSILON);
    let shift = period / TAU * (1.0 / a).asin();
    a * 2.0_f64.powf(-10.0 * t) * ((t - shift) * TAU / period).sin() + 1.0
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Easing::Linear => f.write_str("linear"),
            Easing::Power { exponent, ease } => {
                write!(f, "power{}.{}", exponent - 1, ease.suffix())
            }
            Easing::Sine(ease) => write!(f, "sine.{}", ease.suffix()),
            Easing::Expo(ease) => write!(f, "expo.{}", ease.suffix()),
            Easing::Back { ease, overshoot } => write!(f, "back.{}({})", ease.suffix(), overshoot),
            Easing::Elastic {
                ease,
                amplitude,
                period,
            } => write!(f, "elastic.{}({}, {})", ease.suffix(), amplitude, period),
        }
    }
}

impl FromStr for Easing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidEasing(s.to_string());
        let trimmed = s.trim();

        // Split "family.ease(args)" into its parts
        let (head, args) = match trimmed.find('(') {
            Some(open) => {
                let close = trimmed.rfind(')').filter(|c| *c > open).ok_or_else(invalid)?;
                if close != trimmed.len() - 1 {
                    return Err(invalid());
                }
                let args = trimmed[open + 1..close]
                    .split(',')
                    .map(|a| a.trim())
                    .filter(|a| !a.is_empty())
                    .map(|a| a.parse::<f64>().map_err(|_| invalid()))
                    .collect::<Result<Vec<_>, _>>()?;
                (&trimmed[..open], args)
            }
            None => (trimmed, Vec::new()),
        };

        let (family, ease) = match head.split_once('.') {
            Some((family, ease)) => (family, Ease::parse(ease).ok_or_else(invalid)?),
            None => (head, Ease::Out),
        };
        let family = family.to_ascii_lowercase();

        if !args.is_empty() && family != "back" && family != "elastic" {
            return Err(invalid());
        }

        let exponent = match family.as_str() {
            "none" | "linear" => return Ok(Easing::Linear),
            "quad" => Some(2),
            "cubic" => Some(3),
            "quart" => Some(4),
            "quint" => Some(5),
            other => other
                .strip_prefix("power")
                .and_then(|n| n.parse::<i32>().ok())
                .filter(|n| (0..=4).contains(n))
                .map(|n| n + 1),
        };
        if let Some(exponent) = exponent {
            if exponent == 1 {
                return Ok(Easing::Linear);
            }
            return Ok(Easing::Power { exponent, ease });
        }

        match family.as_str() {
            "sine" => Ok(Easing::Sine(ease)),
            "expo" => Ok(Easing::Expo(ease)),
            "back" => {
                let overshoot = match args.as_slice() {
                    [] => DEFAULT_BACK_OVERSHOOT,
                    [o] => *o,
                    _ => return Err(invalid()),
                };
                Ok(Easing::Back { ease, overshoot })
            }
            "elastic" => {
                let default_period = if ease == Ease::InOut {
                    DEFAULT_ELASTIC_IN_OUT_PERIOD
                } else {
                    DEFAULT_ELASTIC_PERIOD
                };
                let (amplitude, period) = match args.as_slice() {
                    [] => (DEFAULT_ELASTIC_AMPLITUDE, default_period),
                    [a] => (*a, default_period),
                    [a, p] => (*a, *p),
                    _ => return Err(invalid()),
                };
                if amplitude <= 0.0 || period <= 0.0 {
                    return Err(invalid());
                }
                Ok(Easing::Elastic {
                    ease,
                    amplitude,
                    period,
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for Easing {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

// Accept easing names as plain strings, e.g. `ease = "power3.inOut"`
impl<'de> Deserialize<'de> for Easing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct EasingVisitor;

        impl<'de> Visitor<'de> for EasingVisitor {
            type Value = Easing;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an easing name such as \"power2.out\" or \"back.out(1.7)\"")
            }

            fn visit_str<E>(self, value: &str) -> Result<Easing, E>
            where
                E: de::Error,
            {
                value.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(EasingVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monotone_families() -> Vec<Easing> {
        let mut all = vec![Easing::Linear];
        for ease in [Ease::In, Ease::Out, Ease::InOut] {
            for exponent in 2..=5 {
                all.push(Easing::Power { exponent, ease });
            }
            all.push(Easing::Sine(ease));
            all.push(Easing::Expo(ease));
        }
        all
    }

    #[test]
    fn test_easing_boundaries() {
        for easing in monotone_families() {
            assert!(easing.apply(0.0).abs() < 1e-3, "{} at t=0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-3, "{} at t=1", easing);
        }
        for easing in [
            Easing::back(Ease::Out, 1.2),
            Easing::back(Ease::InOut, 1.7),
            Easing::elastic(Ease::Out, 1.0, 0.5),
            Easing::elastic(Ease::In, 1.0, 0.3),
        ] {
            assert!(easing.apply(0.0).abs() < 1e-9, "{} at t=0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{} at t=1", easing);
        }
    }

    #[test]
    fn test_easing_monotonic() {
        for easing in monotone_families() {
            let mut prev = easing.apply(0.0);
            for i in 1..=100 {
                let t = i as f64 / 100.0;
                let v = easing.apply(t);
                assert!(v >= prev - 1e-12, "{} not monotonic at t={}", easing, t);
                prev = v;
            }
        }
    }

    #[test]
    fn test_cubic_and_quintic_shapes() {
        assert!((Easing::CUBIC_OUT.apply(0.5) - 0.875).abs() < 1e-12);
        assert!((Easing::QUINTIC_OUT.apply(0.5) - 0.96875).abs() < 1e-12);
        assert!((Easing::CUBIC_IN_OUT.apply(0.5) - 0.5).abs() < 1e-12);
        assert!((Easing::QUINTIC_IN_OUT.apply(0.25) - 0.5 * 0.5_f64.powi(5)).abs() < 1e-12);
    }

    #[test]
    fn test_overshoot_families_exceed_one() {
        let back = Easing::back(Ease::Out, 1.7);
        let peak = (1..100).map(|i| back.apply(i as f64 / 100.0)).fold(f64::MIN, f64::max);
        assert!(peak > 1.0, "back peak {}", peak);

        let elastic = Easing::elastic(Ease::Out, 1.0, 0.5);
        let peak = (1..100)
            .map(|i| elastic.apply(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0, "elastic peak {}", peak);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("none".parse::<Easing>().unwrap(), Easing::Linear);
        assert_eq!(
            "power2.out".parse::<Easing>().unwrap(),
            Easing::Power {
                exponent: 3,
                ease: Ease::Out
            }
        );
        assert_eq!(
            "power3.inOut".parse::<Easing>().unwrap(),
            Easing::Power {
                exponent: 4,
                ease: Ease::InOut
            }
        );
        assert_eq!("quint.out".parse::<Easing>().unwrap(), Easing::QUINTIC_OUT);
        assert_eq!(
            "back.out(1.2)".parse::<Easing>().unwrap(),
            Easing::back(Ease::Out, 1.2)
        );
        assert_eq!(
            "elastic.out(1, 0.5)".parse::<Easing>().unwrap(),
            Easing::elastic(Ease::Out, 1.0, 0.5)
        );
        assert_eq!(
            "back".parse::<Easing>().unwrap(),
            Easing::back(Ease::Out, DEFAULT_BACK_OVERSHOOT)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "bounce.out", "power9.out", "power2.sideways", "back.out(1", "cubic.out(2)"] {
            assert!(bad.parse::<Easing>().is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_display_parses_back() {
        for easing in [
            Easing::Linear,
            Easing::CUBIC_IN_OUT,
            Easing::Expo(Ease::In),
            Easing::back(Ease::Out, 1.2),
            Easing::elastic(Ease::InOut, 1.5, 0.45),
        ] {
            assert_eq!(easing.to_string().parse::<Easing>().unwrap(), easing);
        }
    }
}
