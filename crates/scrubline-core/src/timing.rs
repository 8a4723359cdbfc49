//! Time and interpolation helpers shared by the simulator and the evaluator
//!
//! All functions are pure and work on seconds as `f64`.

/// Reference frame rate used to express per-frame lerp factors.
pub const REFERENCE_FPS: f64 = 60.0;

/// Fraction of the frame step covered by the exponential decay curve
///
/// Follows `1 - 2^(-10 * dt / duration)`: after `duration` seconds
/// roughly 99.9% of the remaining distance has been covered, independent of
/// how that time was split into frames.
#[inline]
pub fn exponential_decay_factor(dt: f64, duration: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    if duration <= 0.0 {
        return 1.0;
    }
    1.0 - 2.0_f64.powf(-10.0 * dt / duration)
}

/// Frame-rate independent version of a per-frame lerp factor
///
/// `factor` is the share of the remaining distance covered by one frame at
/// [`REFERENCE_FPS`].
#[inline]
pub fn lerp_decay_factor(dt: f64, factor: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    let factor = factor.clamp(0.0, 1.0);
    1.0 - (1.0 - factor).powf(dt * REFERENCE_FPS)
}

/// Linear interpolation between two values
#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    if t == 0.0 {
        from
    } else if t == 1.0 {
        to
    } else {
        from + (to - from) * t
    }
}

/// Clamp into [0, 1], mapping NaN to 0
#[inline]
pub fn clamp_unit(t: f64) -> f64 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Whether two positions are within `epsilon` of each other
#[inline]
pub fn is_settled(current: f64, target: f64, epsilon: f64) -> bool {
    (target - current).abs() < epsilon
}
