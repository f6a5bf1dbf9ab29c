//! Generation-stamped timer handles for debounce and cooldown windows
//!
//! A component owns its `Timer`. Arming hands out a `TimerToken`; the
//! shell sleeps and then reports the token back. Only the token of the
//! latest arm is honored, so re-arming replaces the previous timer and
//! cancelling invalidates it.

use std::time::Duration;

/// Identifies one armed period of a `Timer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    generation: u64,
    delay: Duration,
}

impl TimerToken {
    /// How long the shell should wait before reporting this token
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// A single cancellable timer
#[derive(Debug)]
pub struct Timer {
    delay: Duration,
    generation: u64,
    armed: bool,
}

impl Timer {
    pub fn new(delay: Duration) -> Self {
        Timer {
            delay,
            generation: 0,
            armed: false,
        }
    }

    /// Start (or restart) the timer, invalidating any earlier token
    pub fn arm(&mut self) -> TimerToken {
        self.generation += 1;
        self.armed = true;
        TimerToken {
            generation: self.generation,
            delay: self.delay,
        }
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Consume an expiry. Returns true only for the latest armed token.
    pub fn expire(&mut self, token: TimerToken) -> bool {
        if self.armed && token.generation == self.generation {
            self.armed = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_token_wins() {
        let mut timer = Timer::new(Duration::from_millis(500));
        let first = timer.arm();
        let second = timer.arm();

        assert_eq!(second.delay(), Duration::from_millis(500));
        assert!(!timer.expire(first));
        assert!(timer.is_armed());
        assert!(timer.expire(second));
        assert!(!timer.is_armed());
        // A token only fires once
        assert!(!timer.expire(second));
    }

    #[test]
    fn test_cancel_invalidates() {
        let mut timer = Timer::new(Duration::from_millis(100));
        let token = timer.arm();
        timer.cancel();
        assert!(!timer.expire(token));
    }
}
