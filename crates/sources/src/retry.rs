//! Connection retry policy
//!
//! Executed once, before an adapter is handed to a logger. Exhausting the attempts is a hard
//! construction failure; there is no half-initialised adapter.

use std::collections::HashMap;
use std::time::Duration;

use contracts::params::param_or;
use contracts::{Connector, ContractError};
use tracing::{info, warn};

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    /// Maximum number of attempts (at least 1 attempt is always made)
    pub max_attempts: u32,
    /// Delay between consecutive attempts
    pub retry_delay: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl ConnectPolicy {
    /// Create a new policy
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }

    /// Read `connect_attempts` and `retry_delay_ms` from an adapter's params, defaulting each
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let defaults = Self::default();
        let delay_ms = param_or(
            params,
            "retry_delay_ms",
            defaults.retry_delay.as_millis() as u64,
        )?;
        Ok(Self::new(
            param_or(params, "connect_attempts", defaults.max_attempts)?,
            Duration::from_millis(delay_ms),
        ))
    }

    /// Single attempt, no retry
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `connector` until it succeeds or the attempts are exhausted
    ///
    /// # Errors
    /// Returns [`ContractError::Connection`] carrying the last failure.
    pub async fn establish<C: Connector>(
        &self,
        connector: &C,
    ) -> Result<C::Connection, ContractError> {
        let max_attempts = self.max_attempts.max(1);
        let target = connector.target();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            info!(endpoint = %target, attempt, max_attempts, "Connecting");
            match connector.connect().await {
                Ok(connection) => {
                    info!(endpoint = %target, attempt, "Connected");
                    return Ok(connection);
                }
                Err(e) => {
                    warn!(
                        endpoint = %target,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Connection attempt failed"
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(ContractError::Connection {
            target,
            attempts: max_attempts,
            message: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Connector that fails a fixed number of times before succeeding
    struct FlakyConnector {
        failures: u32,
        attempts: AtomicU32,
    }

    impl Connector for FlakyConnector {
        type Connection = u32;

        fn target(&self) -> String {
            "flaky:1".to_string()
        }

        async fn connect(&self) -> Result<u32, ContractError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                Err(ContractError::Other(format!("refused #{n}")))
            } else {
                Ok(n)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_after_retries() {
        let connector = FlakyConnector {
            failures: 2,
            attempts: AtomicU32::new(0),
        };
        let policy = ConnectPolicy::new(5, Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        let attempt = policy.establish(&connector).await.unwrap();

        assert_eq!(attempt, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_is_hard_error() {
        let connector = FlakyConnector {
            failures: u32::MAX,
            attempts: AtomicU32::new(0),
        };
        let policy = ConnectPolicy::new(3, Duration::from_millis(100));

        let err = policy.establish(&connector).await.unwrap_err();
        match err {
            ContractError::Connection {
                target,
                attempts,
                message,
            } => {
                assert_eq!(target, "flaky:1");
                assert_eq!(attempts, 3);
                assert!(message.contains("refused #3"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_policy_from_params() {
        let params = HashMap::from([("connect_attempts".to_string(), "2".to_string())]);
        let policy = ConnectPolicy::from_params(&params).unwrap();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.retry_delay, Duration::from_secs(2));

        let params = HashMap::from([("retry_delay_ms".to_string(), "soon".to_string())]);
        assert!(ConnectPolicy::from_params(&params).is_err());
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let connector = FlakyConnector {
            failures: 0,
            attempts: AtomicU32::new(0),
        };
        let policy = ConnectPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.establish(&connector).await.unwrap(), 1);
    }
}
