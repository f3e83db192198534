//! Skill config record
//!
//! The backend reads its application id from a small JSON file. Publishing
//! merges into that file instead of replacing it so fields owned by other
//! tools survive.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, warn};

use crate::{Error, Result};

/// Key holding the portal-assigned application id
pub const APPLICATION_ID_KEY: &str = "applicationId";

/// JSON object persisted next to the backend source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillConfigRecord {
    fields: Map<String, Value>,
}

impl SkillConfigRecord {
    /// Record produced by a publish run
    pub fn with_application_id(application_id: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(
            APPLICATION_ID_KEY.to_string(),
            Value::String(application_id.to_string()),
        );
        Self { fields }
    }

    /// Wrap an existing JSON object
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn application_id(&self) -> Option<&str> {
        self.fields.get(APPLICATION_ID_KEY).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Merge `fresh` into `self`; keys already present in `self` win
    pub fn merge(mut self, fresh: SkillConfigRecord) -> Self {
        for (key, value) in fresh.fields {
            match self.fields.get(&key) {
                Some(existing) if existing != &value => {
                    warn!(
                        "Keeping existing \"{}\" = {} (publish produced {})",
                        key, existing, value
                    );
                }
                Some(_) => {}
                None => {
                    self.fields.insert(key, value);
                }
            }
        }
        self
    }

    /// Read a record from disk; a missing file yields `None`
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::from_io(path, e)),
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(fields)) => Ok(Some(Self { fields })),
            Ok(_) => Err(Error::InvalidFile {
                path: path.to_path_buf(),
                reason: "expected a JSON object".into(),
            }),
            Err(e) => Err(Error::InvalidFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Write the record as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.fields)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read-modify-write `fresh` into the record stored at `path`
    pub fn merge_into_file(path: &Path, fresh: SkillConfigRecord) -> Result<Self> {
        let merged = match Self::load(path)? {
            Some(existing) => {
                info!("Updating skill config file at: {}", path.display());
                existing.merge(fresh)
            }
            None => {
                info!("Creating skill config file at: {}", path.display());
                fresh
            }
        };
        merged.save(path)?;
        Ok(merged)
    }
}
