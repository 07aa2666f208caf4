use rand::Rng;
use std::time::Duration;

/// Delay before the first reconnect attempt
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

/// Upper bound on the reconnect delay
pub const MAX_BACKOFF: Duration = Duration::from_millis(10_000);

pub const BACKOFF_MULTIPLIER: u32 = 2;

/// Exponential reconnect delay. After `k` consecutive failures the next
/// delay is `min(floor * multiplier^k, ceiling)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    floor: Duration,
    ceiling: Duration,
    multiplier: u32,
    current: Duration,
    failures: u32,
    jitter: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(INITIAL_BACKOFF, MAX_BACKOFF, BACKOFF_MULTIPLIER)
    }
}

impl Backoff {
    pub fn new(floor: Duration, ceiling: Duration, multiplier: u32) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            floor,
            ceiling,
            multiplier: multiplier.max(1),
            current: floor,
            failures: 0,
            jitter: 0.0,
        }
    }

    /// Spreads each delay by up to `fraction` of itself in either direction,
    /// so many viewers dropped at once do not reconnect in lockstep.
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Records a failure and returns how long to wait before retrying.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.failures = self.failures.saturating_add(1);
        self.current = self
            .current
            .saturating_mul(self.multiplier)
            .min(self.ceiling);
        self.jittered(delay)
    }

    /// Back to the floor, called once a connection opens.
    pub fn reset(&mut self) {
        self.current = self.floor;
        self.failures = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay the next failure will schedule, before jitter.
    pub fn peek(&self) -> Duration {
        self.current
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return delay;
        }
        let spread = delay.as_secs_f64() * self.jitter;
        let offset = rand::thread_rng().gen_range(-spread..=spread);
        Duration::from_secs_f64((delay.as_secs_f64() + offset).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_until_ceiling() {
        let mut backoff = Backoff::default();
        let delays: Vec<u64> = (0..7).map(|_| backoff.next_delay().as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000, 10_000, 10_000]);
        assert_eq!(backoff.failures(), 7);
    }

    #[test]
    fn test_reset_returns_to_floor() {
        let mut backoff = Backoff::default();
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.peek(), Duration::from_secs(4));

        backoff.reset();
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.next_delay(), INITIAL_BACKOFF);
    }

    #[test]
    fn test_jitter_stays_within_spread() {
        let mut backoff = Backoff::default().with_jitter(0.25);
        for expected in [1.0, 2.0, 4.0, 8.0, 10.0] {
            let delay = backoff.next_delay().as_secs_f64();
            assert!(delay >= expected * 0.75 - 1e-9 && delay <= expected * 1.25 + 1e-9);
        }
    }

    #[test]
    fn test_ceiling_below_floor_is_raised() {
        let mut backoff = Backoff::new(Duration::from_secs(5), Duration::from_secs(1), 3);
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }
}
