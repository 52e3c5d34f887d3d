//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the u64 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    to_u64(value.floor())
}

/// Ceil a f64 and clamp it to the u64 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn ceil_f64_to_u64(value: f64) -> u64 {
    to_u64(value.ceil())
}

/// Round a f64 and clamp it to the u64 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn round_f64_to_u64(value: f64) -> u64 {
    to_u64(value.round())
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert u32 to f64 (lossless).
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Floor a value to one decimal place, the precision used for displayed rates.
#[must_use]
pub fn floor_to_tenth(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    // Absorb representation error so that 1.5 × 1.2 floors to 1.8, not 1.7.
    (value * 10.0 + 1e-9).floor() / 10.0
}

fn to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.min(max)).unwrap_or(u64::MAX)
}
