//! Publish profiles
//!
//! A publish profile is the declarative description of one deployment
//! target: which skill to create, where its input files live and which
//! backend endpoint the portal should call.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Default label of the portal tool that hosts skills
pub const DEFAULT_TOOL_NAME: &str = "Alexa Skills Kit";

/// Default build timeout for the interaction model (ms)
pub const DEFAULT_BUILD_MODEL_TIMEOUT_MS: u64 = 60_000;

/// Kind of skill created on the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkillType {
    #[default]
    Custom,
    SmartHome,
    FlashBriefing,
    Video,
}

impl SkillType {
    /// Value of the portal's skill type radio control
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillType::Custom => "Custom",
            SkillType::SmartHome => "SmartHome",
            SkillType::FlashBriefing => "FlashBriefing",
            SkillType::Video => "Video",
        }
    }
}

impl std::fmt::Display for SkillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    Lambda,
    Https,
}

impl<'de> Deserialize<'de> for EndpointType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.to_ascii_lowercase().as_str() {
            "lambda" => Ok(EndpointType::Lambda),
            "https" => Ok(EndpointType::Https),
            other => Err(serde::de::Error::unknown_variant(other, &["lambda", "https"])),
        }
    }
}

impl EndpointType {
    /// Label used in progress messages
    pub fn label(&self) -> &'static str {
        match self {
            EndpointType::Lambda => "Lambda",
            EndpointType::Https => "HTTPS",
        }
    }
}

/// Backend invocation target of the skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    #[serde(rename = "type")]
    pub kind: EndpointType,
    pub location: String,
}

/// One deployment target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishProfile {
    /// Credential section used when no `--env` is given
    #[serde(default)]
    pub environment: Option<String>,

    #[serde(default = "default_tool_name")]
    pub tool_name: String,

    pub skill_name: String,

    pub skill_invocation_name: String,

    #[serde(default)]
    pub skill_type: SkillType,

    #[serde(default)]
    pub uses_audio_player: bool,

    /// Disambiguates accounts that belong to several companies
    #[serde(default)]
    pub company_name: Option<String>,

    pub skill_output_directory: PathBuf,

    pub skill_config_file_path: PathBuf,

    #[serde(default = "default_source_directory")]
    pub source_directory: PathBuf,

    /// Interaction model build timeout in milliseconds
    #[serde(default = "default_build_model_timeout")]
    pub build_model_timeout: u64,

    #[serde(default)]
    pub endpoint: Option<EndpointDescriptor>,
}

fn default_tool_name() -> String {
    DEFAULT_TOOL_NAME.to_string()
}

fn default_source_directory() -> PathBuf {
    PathBuf::from("./lambda")
}

fn default_build_model_timeout() -> u64 {
    DEFAULT_BUILD_MODEL_TIMEOUT_MS
}

impl PublishProfile {
    /// Parse a profile from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from disk and resolve its paths against `base`
    pub fn load(path: &Path, base: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
        let mut profile = Self::from_json(&content).map_err(|e| match e {
            Error::Serialization(err) => Error::InvalidFile {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
            other => other,
        })?;
        profile.resolve_paths(base);
        Ok(profile)
    }

    /// Make every relative path absolute
    pub fn resolve_paths(&mut self, base: &Path) {
        self.skill_output_directory = resolve(base, &self.skill_output_directory);
        self.skill_config_file_path = resolve(base, &self.skill_config_file_path);
        self.source_directory = resolve(base, &self.source_directory);
    }

    fn validate(&self) -> Result<()> {
        if self.skill_name.trim().is_empty() {
            return Err(Error::InvalidConfig("skillName must not be empty".into()));
        }
        if self.skill_invocation_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "skillInvocationName must not be empty".into(),
            ));
        }
        if self.build_model_timeout == 0 {
            return Err(Error::InvalidConfig(
                "buildModelTimeout must be greater than zero".into(),
            ));
        }
        if let Some(endpoint) = &self.endpoint {
            if endpoint.location.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "endpoint.location must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Interaction model build timeout
    pub fn build_timeout(&self) -> Duration {
        Duration::from_millis(self.build_model_timeout)
    }

    /// Path of the intents document
    pub fn intents_path(&self) -> PathBuf {
        self.skill_output_directory.join("intents.json")
    }

    /// Path of the custom slot type definitions
    pub fn slot_types_path(&self) -> PathBuf {
        self.skill_output_directory.join("custom.types")
    }

    /// Path of the sample utterances
    pub fn utterances_path(&self) -> PathBuf {
        self.skill_output_directory.join("skill.utr")
    }

    /// True when the profile deploys to a lambda function
    pub fn uses_lambda(&self) -> bool {
        matches!(
            self.endpoint,
            Some(EndpointDescriptor {
                kind: EndpointType::Lambda,
                ..
            })
        )
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let mut out = base.to_path_buf();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "environment": "default",
        "skillName": "Weather Helper",
        "skillInvocationName": "weather helper",
        "skillOutputDirectory": "./deployment/ask",
        "skillConfigFilePath": "./lambda/config.json",
        "endpoint": { "type": "HTTPS", "location": "https://api.example.com/skill" }
    }"#;

    #[test]
    fn test_defaults_applied() {
        let profile = PublishProfile::from_json(PROFILE).unwrap();
        assert_eq!(profile.tool_name, DEFAULT_TOOL_NAME);
        assert_eq!(profile.skill_type, SkillType::Custom);
        assert!(!profile.uses_audio_player);
        assert_eq!(profile.build_timeout(), Duration::from_secs(60));
        assert!(profile.company_name.is_none());
    }

    #[test]
    fn test_endpoint_type_is_case_insensitive() {
        let profile = PublishProfile::from_json(PROFILE).unwrap();
        let endpoint = profile.endpoint.unwrap();
        assert_eq!(endpoint.kind, EndpointType::Https);
        assert_eq!(endpoint.location, "https://api.example.com/skill");
    }

    #[test]
    fn test_resolve_paths() {
        let mut profile = PublishProfile::from_json(PROFILE).unwrap();
        profile.resolve_paths(Path::new("/work/project"));
        assert_eq!(
            profile.skill_output_directory,
            PathBuf::from("/work/project/deployment/ask")
        );
        assert_eq!(
            profile.intents_path(),
            PathBuf::from("/work/project/deployment/ask/intents.json")
        );
        assert_eq!(profile.source_directory, PathBuf::from("/work/project/lambda"));
    }

    #[test]
    fn test_empty_skill_name_rejected() {
        let json = PROFILE.replace("\"Weather Helper\"", "\"  \"");
        let err = PublishProfile::from_json(&json).unwrap_err();
        assert_eq!(err.exit_code(), 400);
    }

    #[test]
    fn test_missing_profile_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = PublishProfile::load(&tmp.path().join("nope.json"), tmp.path()).unwrap_err();
        assert_eq!(err.exit_code(), 404);
    }

    #[test]
    fn test_malformed_profile_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = PublishProfile::load(&path, tmp.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidFile { .. }));
    }
}
