//! Persisted portal session
//!
//! Cookies are stored per account so a later run can skip the interactive
//! sign-in. Only the driver reads or writes these files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::DriverResult;

/// Browser cookie in a serializable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

/// Cookie file for one account
#[derive(Debug, Clone)]
pub struct CookieJar {
    path: PathBuf,
}

impl CookieJar {
    /// Jar at `<output_dir>/session/cookies/<account>.json`
    pub fn for_account(output_dir: &Path, account: &str) -> Self {
        let file_name = format!("{}.json", sanitize_account(account));
        Self {
            path: output_dir.join("session").join("cookies").join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted cookies; an absent or unreadable file means no session
    pub fn load(&self) -> Option<Vec<StoredCookie>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No persisted session at {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<Vec<StoredCookie>>(&content) {
            Ok(cookies) if !cookies.is_empty() => Some(cookies),
            Ok(_) => None,
            Err(e) => {
                warn!(
                    "Ignoring corrupted session file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    pub fn save(&self, cookies: &[StoredCookie]) -> DriverResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(cookies)?)?;
        debug!("Saved {} cookies to {}", cookies.len(), self.path.display());
        Ok(())
    }

    /// Remove the persisted session
    pub fn discard(&self) -> DriverResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn sanitize_account(account: &str) -> String {
    account
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
