//! Polling primitives
//!
//! Every wait in the driver is a cooperative poll: evaluate a probe, sleep
//! for the interval, try again until the deadline. The caller decides what a
//! timeout means.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::DriverResult;

/// Timeouts and pauses used by the pipeline
#[derive(Debug, Clone)]
pub struct Timings {
    /// Delay between two probe evaluations
    pub poll_interval: Duration,

    /// Default bound for UI readiness waits
    pub ui_timeout: Duration,

    /// Wait for the portal to accept a persisted session
    pub resume_timeout: Duration,

    /// Wait for the redirect after submitting credentials
    pub sign_in_timeout: Duration,

    /// Wait for the portal tool launcher on the console home page
    pub tool_timeout: Duration,

    /// How long an optional confirmation dialog gets to show up
    pub dialog_timeout: Duration,

    /// Loading bound for saves other than the interaction model
    pub save_timeout: Duration,

    /// Pause after dialogs close while the page rebinds
    pub settle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            ui_timeout: Duration::from_secs(5),
            resume_timeout: Duration::from_secs(5),
            sign_in_timeout: Duration::from_secs(15),
            tool_timeout: Duration::from_secs(10),
            dialog_timeout: Duration::from_secs(3),
            save_timeout: Duration::from_secs(30),
            settle: Duration::from_millis(1000),
        }
    }
}

impl Timings {
    /// Same timeout for every wait, no settle pauses
    pub fn uniform(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            ui_timeout: timeout,
            resume_timeout: timeout,
            sign_in_timeout: timeout,
            tool_timeout: timeout,
            dialog_timeout: timeout,
            save_timeout: timeout,
            settle: Duration::ZERO,
        }
    }
}

/// Poll `probe` until it yields `true` or `timeout` elapses
///
/// The probe runs at least once. Probe errors count as "not yet": pages in
/// the middle of a rebind routinely throw from selectors that are about to
/// exist.
pub async fn poll_until<F, Fut>(interval: Duration, timeout: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DriverResult<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match probe().await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => debug!("Probe failed, retrying: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(interval.min(deadline - now)).await;
    }
}
