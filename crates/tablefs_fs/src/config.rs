//! Per-call write options

use crate::Visibility;

/// Options bag passed to write, copy, move and create-directory calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Unix seconds to record; defaults to the current time
    pub timestamp: Option<i64>,

    /// Visibility of created entries; defaults to public
    pub visibility: Option<Visibility>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Configured timestamp, or now
    pub fn timestamp_or_now(&self) -> i64 {
        self.timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
    }

    /// Configured visibility, or public
    pub fn visibility_or_default(&self) -> Visibility {
        self.visibility.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.visibility_or_default(), Visibility::Public);
        assert!(config.timestamp_or_now() > 1_600_000_000);
    }

    #[test]
    fn test_overrides() {
        let config = Config::new()
            .with_timestamp(42)
            .with_visibility(Visibility::Private);
        assert_eq!(config.timestamp_or_now(), 42);
        assert_eq!(config.visibility_or_default(), Visibility::Private);
    }
}
