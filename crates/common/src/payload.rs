//! The document handed from the orchestrator to the automation driver

use serde::{Deserialize, Serialize};

use crate::profile::PublishProfile;
use crate::{Error, Result};

/// Default WebDriver endpoint
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Browser session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserOptions {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
}

fn default_webdriver_url() -> String {
    DEFAULT_WEBDRIVER_URL.to_string()
}

fn default_headless() -> bool {
    true
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    900
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

/// Everything the driver needs for one run, sent once over stdin
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverPayload {
    /// File stem of the publish profile
    #[serde(default)]
    pub profile_name: Option<String>,

    pub profile: PublishProfile,

    /// Developer portal account
    pub username: String,

    /// Developer portal password, in clear text
    pub password: String,

    #[serde(default)]
    pub skills: bool,

    #[serde(default)]
    pub lambda: bool,

    #[serde(default)]
    pub browser: BrowserOptions,
}

impl std::fmt::Debug for DriverPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverPayload")
            .field("profile_name", &self.profile_name)
            .field("profile", &self.profile)
            .field("username", &self.username)
            .field("password", &"*****")
            .field("skills", &self.skills)
            .field("lambda", &self.lambda)
            .field("browser", &self.browser)
            .finish()
    }
}

impl DriverPayload {
    /// Decode the payload read from stdin
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let payload: Self = serde_json::from_slice(bytes).map_err(|e| {
            Error::InvalidConfig(format!("Error loading configuration: Unexpected format: {}", e))
        })?;
        if payload.username.is_empty() || payload.password.is_empty() {
            return Err(Error::InvalidConfig(
                "Error loading configuration: developer portal credentials are missing".into(),
            ));
        }
        Ok(payload)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "profileName": "weather",
            "profile": {
                "skillName": "Weather Helper",
                "skillInvocationName": "weather helper",
                "skillOutputDirectory": "/tmp/ask",
                "skillConfigFilePath": "/tmp/lambda/config.json"
            },
            "username": "dev@example.com",
            "password": "hunter2",
            "skills": true
        })
    }

    #[test]
    fn test_decode_with_browser_defaults() {
        let bytes = serde_json::to_vec(&sample()).unwrap();
        let payload = DriverPayload::from_slice(&bytes).unwrap();
        assert_eq!(payload.browser.webdriver_url, DEFAULT_WEBDRIVER_URL);
        assert!(payload.browser.headless);
        assert!(payload.skills);
        assert!(!payload.lambda);
    }

    #[test]
    fn test_debug_hides_password() {
        let bytes = serde_json::to_vec(&sample()).unwrap();
        let payload = DriverPayload::from_slice(&bytes).unwrap();
        assert!(!format!("{:?}", payload).contains("hunter2"));
    }

    #[test]
    fn test_garbage_is_a_configuration_error() {
        let err = DriverPayload::from_slice(b"not json").unwrap_err();
        assert_eq!(err.exit_code(), 400);
        assert!(err.to_string().contains("Unexpected format"));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut value = sample();
        value["password"] = json!("");
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(DriverPayload::from_slice(&bytes).is_err());
    }
}
