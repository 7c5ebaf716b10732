//! Timing and randomization policy.
//!
//! Every wait in the scraper goes through a [`Pacing`] implementation so the
//! randomized, human-looking delays can be swapped for zero delays in tests
//! or when `MAPSCOUT_PACING=none`.

use std::time::Duration;

use mapscout_core::PacingMode;
use rand::Rng;

/// Inclusive `[min, max]` bounds for one randomized wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    pub min: Duration,
    pub max: Duration,
}

impl DelayWindow {
    #[must_use]
    pub const fn millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }
}

/// After the search URL loads, before touching the page.
pub const AFTER_LOAD: DelayWindow = DelayWindow::millis(3_000, 6_000);
/// Around the consent-dialog click.
pub const CONSENT: DelayWindow = DelayWindow::millis(1_000, 2_000);
/// Before looking for the result list.
pub const LIST_SETTLE: DelayWindow = DelayWindow::millis(2_000, 4_000);
/// Between two feed scrolls.
pub const SCROLL: DelayWindow = DelayWindow::millis(1_000, 2_500);
/// Between list items.
pub const BETWEEN_ITEMS: DelayWindow = DelayWindow::millis(1_000, 3_000);
/// After clicking an item, for the detail view to render.
pub const DETAIL_RENDER: DelayWindow = DelayWindow::millis(3_000, 4_000);
/// After returning to the list.
pub const RESTORE: DelayWindow = DelayWindow::millis(1_000, 2_000);
/// Before fetching a business website.
pub const WEBSITE: DelayWindow = DelayWindow::millis(1_000, 2_000);
/// Between two locations.
pub const BETWEEN_LOCATIONS: DelayWindow = DelayWindow::millis(2_000, 3_000);

pub trait Pacing: Send + Sync {
    /// A delay within `window`.
    fn delay(&self, window: DelayWindow) -> Duration;

    /// `true` with probability `p` (clamped to `0.0..=1.0`).
    fn chance(&self, p: f64) -> bool;

    /// An index in `0..len`; `len` must be non-zero.
    fn pick_index(&self, len: usize) -> usize;
}

/// Uniformly random delays and decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanPacing;

impl Pacing for HumanPacing {
    fn delay(&self, window: DelayWindow) -> Duration {
        if window.max <= window.min {
            return window.min;
        }
        rand::rng().random_range(window.min..=window.max)
    }

    fn chance(&self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        rand::rng().random_bool(p.clamp(0.0, 1.0))
    }

    fn pick_index(&self, len: usize) -> usize {
        rand::rng().random_range(0..len.max(1))
    }
}

/// No delays and deterministic decisions: any non-zero probability fires and
/// the first candidate is always picked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacing for NoDelay {
    fn delay(&self, _window: DelayWindow) -> Duration {
        Duration::ZERO
    }

    fn chance(&self, p: f64) -> bool {
        p > 0.0
    }

    fn pick_index(&self, _len: usize) -> usize {
        0
    }
}

#[must_use]
pub fn for_mode(mode: PacingMode) -> std::sync::Arc<dyn Pacing> {
    match mode {
        PacingMode::Human => std::sync::Arc::new(HumanPacing),
        PacingMode::None => std::sync::Arc::new(NoDelay),
    }
}

/// Sleeps for a delay drawn from `window`.
pub async fn pause(pacing: &dyn Pacing, window: DelayWindow) {
    let delay = pacing.delay(window);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_delay_stays_in_window() {
        let window = DelayWindow::millis(100, 250);
        for _ in 0..200 {
            let d = HumanPacing.delay(window);
            assert!(d >= window.min && d <= window.max, "{d:?} outside window");
        }
    }

    #[test]
    fn human_delay_with_degenerate_window_returns_min() {
        let window = DelayWindow::millis(500, 500);
        assert_eq!(HumanPacing.delay(window), Duration::from_millis(500));
    }

    #[test]
    fn human_chance_respects_extremes() {
        assert!(!HumanPacing.chance(0.0));
        assert!(HumanPacing.chance(1.0));
        assert!(HumanPacing.chance(7.0));
        assert!(!HumanPacing.chance(-1.0));
        assert!(!HumanPacing.chance(f64::NAN));
    }

    #[test]
    fn human_pick_index_is_in_range() {
        for _ in 0..100 {
            assert!(HumanPacing.pick_index(3) < 3);
        }
    }

    #[test]
    fn no_delay_is_deterministic() {
        assert_eq!(NoDelay.delay(AFTER_LOAD), Duration::ZERO);
        assert!(NoDelay.chance(0.5));
        assert!(!NoDelay.chance(0.0));
        assert_eq!(NoDelay.pick_index(10), 0);
    }

    #[tokio::test]
    async fn pause_with_no_delay_returns_immediately() {
        let started = std::time::Instant::now();
        pause(&NoDelay, AFTER_LOAD).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
