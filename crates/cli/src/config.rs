//! Credentials store (`~/.sutr/config.toml`)
//!
//! One table per environment:
//!
//! ```toml
//! [default]
//! skills_access_key_id = "dev@example.com"
//! skills_secret_access_key = "5f1c..."   # obscured
//! aws_access_key_id = "AKIA..."
//! aws_secret_access_key = "..."
//! region = "us-east-1"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::CliError;
use crate::secret;

/// Lambda for skills is only offered in this region
pub const DEFAULT_REGION: &str = "us-east-1";

pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Credentials of one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Developer portal sign-in email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_access_key_id: Option<String>,

    /// Developer portal password, obscured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_secret_access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_secret_access_key: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_lambda_execution_role: Option<String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            skills_access_key_id: None,
            skills_secret_access_key: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            region: default_region(),
            aws_lambda_execution_role: None,
        }
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

impl Credentials {
    pub fn has_skills(&self) -> bool {
        present(&self.skills_access_key_id) && present(&self.skills_secret_access_key)
    }

    pub fn has_aws(&self) -> bool {
        present(&self.aws_access_key_id) && present(&self.aws_secret_access_key)
    }

    /// Fail unless the credentials needed by the requested phases exist
    pub fn require(&self, skills: bool, lambda: bool) -> Result<(), CliError> {
        if (skills && !self.has_skills()) || (lambda && !self.has_aws()) {
            return Err(missing_configuration());
        }
        Ok(())
    }

    /// Developer portal sign-in pair with the password revealed
    pub fn portal_login(&self) -> anyhow::Result<(String, String)> {
        match (&self.skills_access_key_id, &self.skills_secret_access_key) {
            (Some(user), Some(secret)) => {
                let password = secret::reveal(secret)?;
                Ok((user.clone(), password))
            }
            _ => Err(missing_configuration().into()),
        }
    }
}

fn missing_configuration() -> CliError {
    CliError::Usage(
        "Configuration missing. Please call sutr configure to enable publishing".to_string(),
    )
}

/// All environments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialsStore {
    environments: BTreeMap<String, Credentials>,
}

impl CredentialsStore {
    /// Default location (`~/.sutr/config.toml`)
    pub fn default_path() -> PathBuf {
        sutr_common::default_config_dir().join("config.toml")
    }

    /// Load the store from file; a missing file is an empty store
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let store: Self = toml::from_str(&content)?;
            Ok(store)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the store to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        restrict_permissions(path)?;
        Ok(())
    }

    pub fn environment(&self, name: &str) -> Option<&Credentials> {
        self.environments.get(name)
    }

    /// Credentials of `name`, created with defaults when absent
    pub fn environment_mut(&mut self, name: &str) -> &mut Credentials {
        self.environments.entry(name.to_string()).or_default()
    }

    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CredentialsStore::load(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(store.environments().count(), 0);
    }

    #[test]
    fn test_save_and_load_environments() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".sutr/config.toml");

        let mut store = CredentialsStore::default();
        let prod = store.environment_mut("prod");
        prod.skills_access_key_id = Some("dev@example.com".into());
        prod.skills_secret_access_key = Some(secret::obscure("pw").unwrap());
        store.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[prod]"));
        assert!(content.contains("region = \"us-east-1\""));
        assert!(!content.contains("aws_access_key_id"));

        let loaded = CredentialsStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        let (user, password) = loaded.environment("prod").unwrap().portal_login().unwrap();
        assert_eq!(user, "dev@example.com");
        assert_eq!(password, "pw");
    }

    #[test]
    fn test_region_defaults_when_absent() {
        let store: CredentialsStore =
            toml::from_str("[default]\naws_access_key_id = \"AKIA\"\n").unwrap();
        assert_eq!(store.environment("default").unwrap().region, "us-east-1");
    }

    #[test]
    fn test_require_by_phase() {
        let mut creds = Credentials {
            skills_access_key_id: Some("dev@example.com".into()),
            skills_secret_access_key: Some("abc".into()),
            ..Default::default()
        };
        assert!(creds.require(true, false).is_ok());
        let err = creds.require(true, true).unwrap_err();
        assert_eq!(err.exit_code(), 400);

        creds.aws_access_key_id = Some("AKIA".into());
        creds.aws_secret_access_key = Some(" ".into());
        assert!(creds.require(false, true).is_err());
        creds.aws_secret_access_key = Some("secret".into());
        assert!(creds.require(true, true).is_ok());
    }
}
