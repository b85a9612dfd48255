/// Fixed-delay repeating timer advanced by the host loop.
///
/// Fires once `interval` seconds have accumulated, then starts waiting again
/// from zero. A single tick fires at most once, however long it was. After
/// [`cancel`](RepeatingTimer::cancel) it never fires again.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatingTimer {
    interval: f32,
    elapsed: f32,
    cancelled: bool,
    fired: u64,
}

impl RepeatingTimer {
    /// Non-positive or NaN intervals fall back to `fallback`
    pub fn new(interval: f32, fallback: f32) -> Self {
        RepeatingTimer {
            interval: if interval > 0.0 { interval } else { fallback },
            elapsed: 0.0,
            cancelled: false,
            fired: 0,
        }
    }

    /// Advance by `delta_time` seconds. Returns true when the timer fires.
    pub fn tick(&mut self, delta_time: f32) -> bool {
        if self.cancelled {
            return false;
        }
        if delta_time > 0.0 {
            self.elapsed += delta_time;
        }
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            self.fired += 1;
            true
        } else {
            false
        }
    }

    /// Stop the timer for good
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.elapsed = 0.0;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Change the delay; the current wait keeps its progress
    pub fn set_interval(&mut self, interval: f32) {
        if interval > 0.0 {
            self.interval = interval;
        }
    }

    /// How many times the timer has fired
    pub fn fired(&self) -> u64 {
        self.fired
    }
}
