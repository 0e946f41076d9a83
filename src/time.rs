//! Millisecond tick arithmetic.
//!
//! The system tick is a free-running `u32` that wraps after ~49.7 days.
//! Every window comparison goes through [`elapsed`], which relies on
//! wrapping subtraction and therefore stays correct across the wrap.

/// Monotonic millisecond timestamp.
pub type Millis = u32;

/// Milliseconds from `since` to `now`, tolerant of counter wraparound.
#[inline]
pub const fn elapsed(now: Millis, since: Millis) -> Millis {
    now.wrapping_sub(since)
}

/// Source of the shared monotonic tick counter.
pub trait TickSource {
    fn now_ms(&self) -> Millis;
}

impl<F: Fn() -> Millis> TickSource for F {
    fn now_ms(&self) -> Millis {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_plain() {
        assert_eq!(elapsed(1_000, 400), 600);
        assert_eq!(elapsed(5, 5), 0);
    }

    #[test]
    fn elapsed_across_wrap() {
        let since = u32::MAX - 9;
        assert_eq!(elapsed(10, since), 20);
    }

    #[test]
    fn closure_tick_source() {
        let clock = || 42u32;
        assert_eq!(clock.now_ms(), 42);
    }
}
