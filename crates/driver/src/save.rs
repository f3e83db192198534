//! Save-and-wait protocol
//!
//! Every mutating action in the portal goes through the same save control:
//!
//! 1. wait for the control to become enabled (UI timeout)
//! 2. click it
//! 3. accept the confirmation dialog if one shows up within a short wait
//! 4. wait for the loading indicator to disappear (per-request bound)
//! 5. read the status object and fail unless it reports success

use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DriverError, DriverResult};
use crate::page::PageDriver;
use crate::portal::Portal;

/// Messages and bounds for one save
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub loading_message: String,
    pub success_message: Option<String>,
    pub failure_message: String,

    /// Bound for the loading indicator (step 4)
    pub settle_timeout: Duration,
}

impl SaveRequest {
    pub fn new(failure_message: impl Into<String>, settle_timeout: Duration) -> Self {
        Self {
            loading_message: String::new(),
            success_message: None,
            failure_message: failure_message.into(),
            settle_timeout,
        }
    }

    pub fn loading(mut self, message: impl Into<String>) -> Self {
        self.loading_message = message.into();
        self
    }

    pub fn success(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }
}

pub async fn save_and_wait<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    request: &SaveRequest,
) -> DriverResult<()> {
    let portal = page.portal();

    let enabled = page
        .wait_until("save control to enable", page.timings().ui_timeout, || {
            portal.save_control_enabled()
        })
        .await;
    if !enabled {
        return Err(DriverError::portal(
            &request.failure_message,
            "Internal Server Error",
        ));
    }

    portal.click_save().await?;

    // Some tabs ask to confirm global changes; most do not
    let dialog = page
        .wait_until(
            "optional confirmation dialog",
            page.timings().dialog_timeout,
            || portal.confirmation_dialog_visible(),
        )
        .await;
    if dialog {
        debug!("Accepting confirmation dialog");
        portal.confirm_dialog().await?;
        page.settle().await;
    }

    if !request.loading_message.is_empty() {
        info!("{}", request.loading_message);
    }

    let loaded = page
        .wait_until("save to complete", request.settle_timeout, move || async move {
            Ok(!portal.loading_visible().await?)
        })
        .await;
    if !loaded {
        return Err(DriverError::portal(&request.failure_message, "Timed out!"));
    }

    let status = portal.read_status().await?;
    if status.is_failure() {
        return Err(DriverError::portal(
            &request.failure_message,
            status.message.as_deref().unwrap_or("Unknown"),
        ));
    }

    if let Some(message) = &request.success_message {
        info!("{}", message);
    }
    Ok(())
}
