//! Unit conversion utilities.
//!
//! Drawing anchors are sized in EMUs while table cell widths are stored in
//! twentieths of a point (dxa, also called twips).

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_TWIP: i64 = 635;

#[inline]
pub fn twip_to_emu_i64(twips: i64) -> i64 {
    twips.saturating_mul(EMUS_PER_TWIP)
}

/// Scale `value` by `num / den` without overflowing, rounding to nearest.
///
/// Returns `value` unchanged when `den` is zero.
#[inline]
pub fn scale_i64(value: i64, num: i64, den: i64) -> i64 {
    if den == 0 {
        return value;
    }
    ((value as i128 * num as i128 + den as i128 / 2) / den as i128) as i64
}
