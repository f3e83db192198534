//! Authentication against the developer portal
//!
//! A persisted session is tried first without touching the credentials. When
//! it is missing or rejected, the credentials are submitted; a rejected
//! persisted session gets discarded and the credentials are tried once more
//! on a fresh sign-in form.

use tracing::{debug, info, warn};

use crate::error::{DriverError, DriverResult};
use crate::page::PageDriver;
use crate::portal::Portal;
use crate::session::Session;

pub const SIGN_IN_ERROR: &str = "SignIn Error. Exiting process...";

/// Silent attempt with the persisted cookies
///
/// Returns whether the session is authenticated afterwards. Without persisted
/// cookies there is nothing to try and the result is `false`.
pub async fn resume_session<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<bool> {
    if session.authenticated {
        return Ok(true);
    }
    if !session.has_persisted_session() {
        debug!("No persisted session to resume");
        return Ok(false);
    }

    let portal = page.portal();
    let resumed = page
        .wait_until(
            "persisted session to resume",
            page.timings().resume_timeout,
            || portal.is_authenticated(),
        )
        .await;
    if resumed {
        info!("Resumed persisted session for {}", session.username);
        session.authenticated = true;
    }
    Ok(resumed)
}

/// Interactive sign-in with the configured credentials
pub async fn sign_in<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<()> {
    if session.authenticated {
        return Ok(());
    }

    info!("Signing in as {}", session.username);
    if submit_and_wait(page, session).await? {
        session.authenticated = true;
        return Ok(());
    }

    if session.has_persisted_session() {
        warn!("Persisted session was rejected, discarding it and signing in again");
        let portal = page.portal();
        portal.clear_cookies().await?;
        session.discard_persisted_session()?;
        portal.open_entry_page().await?;
        portal.open_sign_in().await?;

        if submit_and_wait(page, session).await? {
            session.authenticated = true;
            return Ok(());
        }
    }

    Err(DriverError::Authentication(SIGN_IN_ERROR.to_string()))
}

async fn submit_and_wait<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &Session,
) -> DriverResult<bool> {
    let portal = page.portal();
    portal
        .submit_credentials(&session.username, session.password())
        .await?;
    Ok(page
        .wait_until(
            "sign-in to complete",
            page.timings().sign_in_timeout,
            || portal.is_authenticated(),
        )
        .await)
}
