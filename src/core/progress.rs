//! Progress reporting and cooperative cancellation.
//!
//! Wraps the caller-supplied callback and enforces its contract: fractions
//! are clamped to [0, 1] and never decrease within one invocation, and the
//! final report of a successful run is exactly 1.0. A `false` return from
//! the callback latches a cancellation request which the warp loop honors at
//! the next block boundary.

/// Caller-supplied progress callback. Returns `false` to request
/// cancellation.
pub type ProgressFn<'a> = dyn FnMut(f64, &str) -> bool + 'a;

pub struct ProgressReporter<'a, 'b> {
    callback: Option<&'a mut ProgressFn<'b>>,
    last: f64,
    cancelled: bool,
}

impl<'a, 'b> ProgressReporter<'a, 'b> {
    pub fn new(callback: Option<&'a mut ProgressFn<'b>>) -> Self {
        Self {
            callback,
            last: 0.0,
            cancelled: false,
        }
    }

    /// Forwards a completion fraction. Returns `false` once cancellation has
    /// been requested; callers should stop at the next safe boundary.
    pub fn report(&mut self, fraction: f64, message: &str) -> bool {
        if self.cancelled {
            return false;
        }
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            self.last
        };
        // Monotonicity: never hand a smaller fraction to the callback.
        let fraction = fraction.max(self.last);
        self.last = fraction;
        if let Some(cb) = self.callback.as_mut() {
            if !cb(fraction, message) {
                self.cancelled = true;
                return false;
            }
        }
        true
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Last fraction handed to the callback.
    pub fn fraction(&self) -> f64 {
        self.last
    }
}
