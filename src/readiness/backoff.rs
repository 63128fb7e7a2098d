//! Backoff between status polls

use std::time::Duration;

use rand::Rng;

/// Delay schedule between readiness attempts
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffPolicy {
    /// Same delay every time
    Fixed(Duration),
    /// Delay grows by `increment` per attempt, capped at `max_delay`
    Linear {
        initial_delay: Duration,
        increment: Duration,
        max_delay: Duration,
    },
    /// Delay is multiplied per attempt, capped at `max_delay`
    Exponential {
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
}

impl BackoffPolicy {
    /// Exponential doubling from `initial_delay` up to `max_delay`
    pub fn exponential(initial_delay: Duration, max_delay: Duration) -> Self {
        BackoffPolicy::Exponential {
            initial_delay,
            max_delay,
            multiplier: 2.0,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let step = attempt.saturating_sub(1);
        match self {
            BackoffPolicy::Fixed(delay) => *delay,
            BackoffPolicy::Linear {
                initial_delay,
                increment,
                max_delay,
            } => initial_delay
                .saturating_add(increment.saturating_mul(step))
                .min(*max_delay),
            BackoffPolicy::Exponential {
                initial_delay,
                max_delay,
                multiplier,
            } => {
                let millis = initial_delay.as_millis() as f64 * multiplier.powi(step.min(64) as i32);
                if !millis.is_finite() || millis >= max_delay.as_millis() as f64 {
                    *max_delay
                } else {
                    Duration::from_millis(millis as u64)
                }
            }
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::exponential(Duration::from_millis(100), Duration::from_secs(5))
    }
}

/// Add up to 25% random jitter so many clients don't poll in lockstep
pub fn with_jitter(duration: Duration) -> Duration {
    let spread = duration.as_millis() / 4;
    if spread == 0 {
        return duration;
    }
    let jitter = rand::thread_rng().gen_range(0..spread);
    duration + Duration::from_millis(jitter as u64)
}
