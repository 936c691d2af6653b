//! Timeout configuration for outbound requests.

use std::time::Duration;

/// Timeouts applied to every request a client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Time allowed to establish the connection.
    pub connect: Duration,
    /// Time allowed for the whole exchange, body included.
    pub total: Duration,
}

impl TimeoutConfig {
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self {
            connect: connect.min(total),
            total,
        }
    }

    /// Derive the connect timeout from a total budget (a quarter of it).
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: total / 4,
            total,
        }
    }

    pub fn from_millis(total_ms: u64) -> Self {
        Self::from_total(Duration::from_millis(total_ms))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_millis(3000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_total() {
        let config = TimeoutConfig::from_millis(2000);
        assert_eq!(config.connect, Duration::from_millis(500));
        assert_eq!(config.total, Duration::from_secs(2));
    }

    #[test]
    fn test_connect_never_exceeds_total() {
        let config = TimeoutConfig::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(config.connect, Duration::from_secs(1));
    }
}
