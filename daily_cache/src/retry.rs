//! Bounded retry with capped exponential backoff
//!
//! Intended for the fetch inside a `compute` closure; the cache itself
//! never retries.

use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first; 0 behaves like 1
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Wait before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let max = self.max_delay.as_secs_f64();
        let scale = self.multiplier.powf(f64::from(retry));
        let seconds = self.initial_delay.as_secs_f64() * scale;
        let capped = if seconds.is_finite() {
            seconds.clamp(0.0, max)
        } else {
            max
        };
        Duration::from_secs_f64(capped)
    }

    /// Run `op` until it succeeds or the attempts are used up, sleeping the
    /// current thread between attempts. The last error is returned.
    pub fn run<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.run_with(op, thread::sleep)
    }

    /// [`RetryPolicy::run`] with a custom way of waiting
    pub fn run_with<T, E, F, S>(&self, mut op: F, mut sleep: S) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        S: FnMut(Duration),
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= attempts => return Err(err),
                Err(_) => {
                    let delay = self.delay_for(attempt - 1);
                    tracing::debug!(attempt, ?delay, "attempt failed, retrying");
                    sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        };

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(5));
        assert_eq!(policy.delay_for(60), Duration::from_secs(5));
    }

    #[test]
    fn test_retries_until_success() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 3.0,
        };
        let mut calls = 0;
        let mut waits = Vec::new();

        let result: Result<&str, String> = policy.run_with(
            || {
                calls += 1;
                if calls < 3 {
                    Err(format!("transient {}", calls))
                } else {
                    Ok("data")
                }
            },
            |d| waits.push(d),
        );

        assert_eq!(result, Ok("data"));
        assert_eq!(calls, 3);
        assert_eq!(waits, vec![Duration::from_secs(1), Duration::from_secs(3)]);
    }

    #[test]
    fn test_gives_up_with_last_error() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::none()
        };
        let mut calls = 0;

        let result: Result<(), u32> = policy.run_with(
            || {
                calls += 1;
                Err(calls)
            },
            |_| {},
        );

        assert_eq!(result, Err(3));
    }

    #[test]
    fn test_run_sleeps_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(20),
            multiplier: 1.0,
        };
        let mut calls = 0;
        let started = std::time::Instant::now();

        let result: Result<u32, &str> = policy.run(|| {
            calls += 1;
            if calls == 1 {
                Err("busy")
            } else {
                Ok(calls)
            }
        });

        assert_eq!(result, Ok(2));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        let mut calls = 0;
        let result: Result<(), ()> = policy.run_with(
            || {
                calls += 1;
                Err(())
            },
            |_| panic!("must not wait"),
        );

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
