//! Scan cadence configuration.

use std::time::Duration;

/// Timing and limits for the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Delay between the end of one cycle and the next scan
    pub scan_interval: Duration,
    /// Extra delay after an item settles, to space out notifications
    pub settle_cooldown: Duration,
    /// Stop after this many cycles (None = run until killed)
    pub max_cycles: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(1),
            settle_cooldown: Duration::from_secs(5),
            max_cycles: None,
        }
    }
}

impl SchedulerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan interval.
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// Set the post-settle cooldown.
    pub fn with_settle_cooldown(mut self, cooldown: Duration) -> Self {
        self.settle_cooldown = cooldown;
        self
    }

    /// Limit the number of cycles.
    pub fn with_max_cycles(mut self, max: usize) -> Self {
        self.max_cycles = Some(max);
        self
    }

    /// No delays at all; for one-shot runs and tests.
    pub fn immediate() -> Self {
        Self {
            scan_interval: Duration::ZERO,
            settle_cooldown: Duration::ZERO,
            max_cycles: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.scan_interval, Duration::from_secs(1));
        assert_eq!(config.settle_cooldown, Duration::from_secs(5));
        assert_eq!(config.max_cycles, None);
    }

    #[test]
    fn test_builders() {
        let config = SchedulerConfig::new()
            .with_scan_interval(Duration::from_secs(30))
            .with_settle_cooldown(Duration::from_millis(100))
            .with_max_cycles(3);
        assert_eq!(config.scan_interval, Duration::from_secs(30));
        assert_eq!(config.settle_cooldown, Duration::from_millis(100));
        assert_eq!(config.max_cycles, Some(3));
    }
}
