use mise_core::Settings;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum spacing between requests to one origin.
///
/// The first `wait` returns immediately; each later call sleeps until
/// `min_interval` has passed since the previous one was let through.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let ready = previous + self.min_interval;
            if Instant::now() < ready {
                tracing::debug!(delay_ms = (ready - Instant::now()).as_millis() as u64, "Politeness delay");
                sleep_until(ready).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Fixed delays and bounded waits applied against the target site.
#[derive(Debug, Clone)]
pub struct Politeness {
    /// Between consecutive listing pages
    pub page_delay: Duration,
    /// Between consecutive API page fetches
    pub api_delay: Duration,
    /// After navigating, before looking for content
    pub page_settle: Duration,
    /// Bound on waiting for item containers to appear
    pub element_timeout: Duration,
}

impl Politeness {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            page_delay: settings.page_delay(),
            api_delay: settings.api_delay(),
            page_settle: settings.page_settle(),
            element_timeout: settings.element_timeout(),
        }
    }

    /// No delays at all. Only for local fixtures.
    pub fn immediate() -> Self {
        Self {
            page_delay: Duration::ZERO,
            api_delay: Duration::ZERO,
            page_settle: Duration::ZERO,
            element_timeout: Duration::from_secs(1),
        }
    }
}

impl Default for Politeness {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
