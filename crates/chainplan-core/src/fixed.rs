use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Every rate, machine count and power figure the engine produces is a
/// `Fixed64`, so NaN and infinity cannot appear in any output.
pub type Fixed64 = I32F32;

/// Game ticks per second. Machine energies are given per tick.
pub const TICKS_PER_SECOND: u32 = 60;

/// Convert an f64 to Fixed64. Use only for initialization and tests.
///
/// Panics on NaN or out-of-range input; use [`checked_from_f64`] for
/// untrusted values.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Convert an untrusted f64, returning `None` for NaN, infinities, and
/// values outside the Q32.32 range.
#[inline]
pub fn checked_from_f64(v: f64) -> Option<Fixed64> {
    Fixed64::checked_from_num(v)
}

/// Largest whole count the engine reports. Every count stays representable
/// as a `Fixed64`.
pub const MAX_COUNT: u32 = i32::MAX as u32;

/// Divide, returning zero when the divisor is zero. An overflowing quotient
/// saturates to `Fixed64::MAX` (or `MIN`).
#[inline]
pub fn div_saturating(a: Fixed64, b: Fixed64) -> Fixed64 {
    if b == Fixed64::ZERO {
        return Fixed64::ZERO;
    }
    a.saturating_div(b)
}

/// `part / whole * 100`, or zero when `whole` is zero.
#[inline]
pub fn percent_of(part: Fixed64, whole: Fixed64) -> Fixed64 {
    div_saturating(part, whole).saturating_mul_int(100)
}

/// Round a non-negative quantity up to a whole count. Negative input
/// yields 0, values beyond [`MAX_COUNT`] saturate.
#[inline]
pub fn ceil_count(v: Fixed64) -> u32 {
    if v <= Fixed64::ZERO {
        return 0;
    }
    v.checked_ceil()
        .and_then(|c| c.checked_to_num::<u32>())
        .map_or(MAX_COUNT, |c| c.min(MAX_COUNT))
}

/// Convert energy per tick (joules) to kW.
#[inline]
pub fn energy_per_tick_to_kw(energy: Fixed64) -> Fixed64 {
    energy.saturating_mul_int(TICKS_PER_SECOND as i64) / 1000
}
