//! Step execution context: the portal plus the waits and captures around it

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::artifacts::{CaptureKind, ScreenshotStore};
use crate::error::{DriverError, DriverResult};
use crate::portal::Portal;
use crate::wait::{poll_until, Timings};

pub struct PageDriver<'a, P: Portal + ?Sized> {
    portal: &'a P,
    screenshots: &'a ScreenshotStore,
    timings: Timings,
}

impl<'a, P: Portal + ?Sized> PageDriver<'a, P> {
    pub fn new(portal: &'a P, screenshots: &'a ScreenshotStore, timings: Timings) -> Self {
        Self {
            portal,
            screenshots,
            timings,
        }
    }

    pub fn portal(&self) -> &'a P {
        self.portal
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Wait for a condition; a timeout leaves a screenshot and returns false
    pub async fn wait_until<F, Fut>(&self, what: &str, timeout: Duration, probe: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<bool>>,
    {
        if poll_until(self.timings.poll_interval, timeout, probe).await {
            return true;
        }
        warn!("Timed out after {}ms waiting for {}", timeout.as_millis(), what);
        self.screenshots
            .capture(self.portal, CaptureKind::Timeout)
            .await;
        false
    }

    /// Like [`wait_until`](Self::wait_until) but a timeout fails the step
    pub async fn require<F, Fut>(&self, what: &str, timeout: Duration, probe: F) -> DriverResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<bool>>,
    {
        if self.wait_until(what, timeout, probe).await {
            Ok(())
        } else {
            Err(DriverError::PortalInteraction(format!(
                "Wait timeout of {}ms expired while waiting for {}",
                timeout.as_millis(),
                what
            )))
        }
    }

    /// Give the page time to rebind after a dialog or selection change
    pub async fn settle(&self) {
        if !self.timings.settle.is_zero() {
            tokio::time::sleep(self.timings.settle).await;
        }
    }

    /// Screenshot for a failed step
    pub async fn capture_error(&self) {
        self.screenshots.capture(self.portal, CaptureKind::Error).await;
    }

    /// Screenshot at the end of a run
    pub async fn capture_final(&self) {
        self.screenshots.capture(self.portal, CaptureKind::Final).await;
    }
}
