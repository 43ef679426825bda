use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Bounded exponential backoff used while waiting on SageMaker to settle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: u32,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn teardown() -> Self {
        PollPolicy {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(20),
            multiplier: 2,
            max_attempts: 40,
        }
    }

    pub fn provisioning() -> Self {
        PollPolicy {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(10),
            multiplier: 2,
            max_attempts: 30,
        }
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        PollPolicy {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            multiplier: 1,
            max_attempts,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(attempt);
        self.initial_interval
            .saturating_mul(factor)
            .min(self.max_interval)
    }
}

pub enum PollOutcome<T> {
    Ready(T),
    Pending,
}

#[derive(Debug, PartialEq)]
pub enum PollError<E> {
    Failed(E),
    Exhausted { attempts: u32 },
}

/// Calls `probe` until it reports `Ready`, sleeping between attempts
/// according to `policy`. Probe errors abort the wait immediately. Gives up
/// early when the next sleep would run past `deadline`, and never sleeps
/// after the last attempt.
pub async fn poll_until<T, E, F, Fut>(
    policy: &PollPolicy,
    deadline: Option<Instant>,
    mut probe: F,
) -> Result<T, PollError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollOutcome<T>, E>>,
{
    let mut attempts = 0;
    while attempts < policy.max_attempts {
        let outcome = probe(attempts).await.map_err(PollError::Failed)?;
        attempts += 1;

        if let PollOutcome::Ready(value) = outcome {
            return Ok(value);
        }
        if attempts == policy.max_attempts {
            break;
        }

        let delay = policy.delay_for_attempt(attempts - 1);
        if deadline.is_some_and(|deadline| Instant::now() + delay >= deadline) {
            debug!("Deadline reached after {} attempts", attempts);
            break;
        }
        debug!("Attempt {} pending, retrying in {:?}", attempts, delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Err(PollError::Exhausted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_and_is_capped() {
        let policy = PollPolicy::teardown();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(20));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(20));
        assert_eq!(policy.delay_for_attempt(200), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_poll_until_ready() {
        let result: Result<u32, PollError<()>> =
            poll_until(&PollPolicy::immediate(5), None, |attempt| async move {
                if attempt == 2 {
                    Ok(PollOutcome::Ready(attempt))
                } else {
                    Ok(PollOutcome::Pending)
                }
            })
            .await;

        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_poll_until_exhausted() {
        let result: Result<(), PollError<()>> =
            poll_until(&PollPolicy::immediate(3), None, |_| async { Ok(PollOutcome::Pending) }).await;

        assert_eq!(result, Err(PollError::Exhausted { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_poll_until_stops_on_error() {
        let mut calls = 0;
        let result: Result<(), PollError<&str>> = poll_until(&PollPolicy::immediate(5), None, |_| {
            calls += 1;
            async { Err("boom") }
        })
        .await;

        assert_eq!(result, Err(PollError::Failed("boom")));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sleep_after_last_attempt() {
        let start = Instant::now();
        let result: Result<(), PollError<()>> = poll_until(
            &PollPolicy::teardown(),
            None,
            |_| async { Ok(PollOutcome::Pending) },
        )
        .await;

        assert_eq!(result, Err(PollError::Exhausted { attempts: 40 }));
        // 39 sleeps between 40 attempts: 5 + 10 + 37 * 20 seconds
        assert!(start.elapsed() >= Duration::from_secs(755));
        assert!(start.elapsed() < Duration::from_secs(756));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cuts_waiting_short() {
        let start = Instant::now();
        let deadline = start + Duration::from_secs(60);

        let result: Result<(), PollError<()>> = poll_until(
            &PollPolicy::teardown(),
            Some(deadline),
            |_| async { Ok(PollOutcome::Pending) },
        )
        .await;

        // sleeps of 5, 10, 20 and 20 s fit, the next one would end at 75 s
        assert_eq!(result, Err(PollError::Exhausted { attempts: 5 }));
        assert!(Instant::now() <= deadline);
        assert!(start.elapsed() >= Duration::from_secs(55));
    }
}
