//! Mutable state shared by the pipeline steps

use sutr_common::{DriverPayload, PublishProfile};

use crate::cookies::{CookieJar, StoredCookie};

/// Context of one publish run
///
/// Steps receive it by reference. The profile and credentials are fixed for
/// the run; the remaining fields are written by specific steps:
///
/// | field | written by | read by |
/// |---|---|---|
/// | `persisted_cookies` | start, `sign-in` (discard) | `open-entry-page`, auth steps |
/// | `authenticated` | `resume-session`, `sign-in` | `sign-in` |
/// | `application_id` | `create-skill` | `record-application-id`, `summarize` |
pub struct Session {
    pub profile: PublishProfile,
    pub username: String,
    password: String,
    pub cookie_jar: CookieJar,
    pub persisted_cookies: Option<Vec<StoredCookie>>,
    pub authenticated: bool,
    application_id: Option<String>,
}

impl Session {
    /// Build a session and load any persisted cookies for the account
    pub fn new(profile: PublishProfile, username: String, password: String) -> Self {
        let cookie_jar = CookieJar::for_account(&profile.skill_output_directory, &username);
        let persisted_cookies = cookie_jar.load();
        Self {
            profile,
            username,
            password,
            cookie_jar,
            persisted_cookies,
            authenticated: false,
            application_id: None,
        }
    }

    pub fn from_payload(payload: DriverPayload) -> Self {
        Self::new(payload.profile, payload.username, payload.password)
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn has_persisted_session(&self) -> bool {
        self.persisted_cookies.is_some()
    }

    /// Forget the persisted session, on disk and in memory
    pub fn discard_persisted_session(&mut self) -> crate::error::DriverResult<()> {
        self.persisted_cookies = None;
        self.cookie_jar.discard()
    }

    pub fn application_id(&self) -> Option<&str> {
        self.application_id.as_deref()
    }

    /// Record the id assigned to a newly created skill
    pub fn set_application_id(&mut self, application_id: String) {
        self.application_id = Some(application_id);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("skill_name", &self.profile.skill_name)
            .field("username", &self.username)
            .field("persisted_session", &self.has_persisted_session())
            .field("authenticated", &self.authenticated)
            .field("application_id", &self.application_id)
            .finish()
    }
}
