// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::time::Duration;
use tokio::time::Instant;

/// Instant of the last user interaction.
///
/// Uses tokio's clock so the monitor can be driven by a paused runtime in tests.
#[derive(Debug, Clone, Copy)]
pub struct ActivityTracker {
    last_activity: Instant,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityTracker {
    /// A tracker whose last activity is now.
    pub fn new() -> Self {
        Self { last_activity: Instant::now() }
    }

    pub fn record_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Time since the last recorded activity.
    pub fn inactive_duration(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_activity)
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_inactive_duration_grows_until_next_activity() {
        let mut tracker = ActivityTracker::new();
        assert_eq!(tracker.inactive_duration(), Duration::ZERO);

        tokio::time::advance(Duration::from_secs(90)).await;
        let first = tracker.inactive_duration();
        tokio::time::advance(Duration::from_secs(30)).await;
        let second = tracker.inactive_duration();
        assert_eq!(first, Duration::from_secs(90));
        assert!(second > first);

        tracker.record_activity();
        assert_eq!(tracker.inactive_duration(), Duration::ZERO);
    }
}
