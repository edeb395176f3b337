//! Stack growth for recursive tree walks.
//!
//! Templates nest parentheses and blocks arbitrarily deep, and every walk
//! over them recurses. Wrapping the recursive step in
//! [`ensure_sufficient_stack`] moves execution onto a fresh stack segment
//! once the current one runs low.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 64 * 1024;

/// Size of each newly allocated segment.
const SEGMENT: usize = 1024 * 1024;

/// Run `f`, first switching to a larger stack if the current one is nearly
/// exhausted.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}
