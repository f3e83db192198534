//! Interaction model intents

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::{Error, Result};

/// Soft limit for the utterances file, above which the portal struggles
pub const MAX_UTTERANCE_FILE_SIZE: u64 = 200_000;

#[derive(Debug, Deserialize)]
struct IntentSchema {
    intents: Vec<IntentEntry>,
}

#[derive(Debug, Deserialize)]
struct IntentEntry {
    intent: String,
    #[serde(default)]
    slots: Vec<SlotEntry>,
}

#[derive(Debug, Deserialize)]
struct SlotEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

/// A slot referenced by an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentSlot {
    pub name: String,
    pub kind: String,
}

/// The intents document uploaded to the interaction model editor
///
/// The raw document is kept so fields this tool does not know about are
/// uploaded unchanged.
#[derive(Debug, Clone)]
pub struct IntentModel {
    raw: Value,
    intents: Vec<(String, Vec<IntentSlot>)>,
}

impl IntentModel {
    /// Parse and validate an intents document
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let raw: Value = serde_json::from_str(json)?;
        let schema = IntentSchema::deserialize(&raw)?;
        let intents = schema
            .intents
            .into_iter()
            .map(|entry| {
                let slots = entry
                    .slots
                    .into_iter()
                    .map(|s| IntentSlot {
                        name: s.name,
                        kind: s.kind,
                    })
                    .collect();
                (entry.intent, slots)
            })
            .collect();
        Ok(Self { raw, intents })
    }

    /// Load the intents document; missing → 404, malformed → 400
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
        Self::from_json(&content).map_err(|e| Error::InvalidFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Intent names in document order
    pub fn intent_names(&self) -> impl Iterator<Item = &str> {
        self.intents.iter().map(|(name, _)| name.as_str())
    }

    /// Slots of one intent
    pub fn slots(&self, intent: &str) -> Option<&[IntentSlot]> {
        self.intents
            .iter()
            .find(|(name, _)| name == intent)
            .map(|(_, slots)| slots.as_slice())
    }

    /// Pretty printed document pasted into the editor
    pub fn to_payload(&self) -> String {
        serde_json::to_string_pretty(&self.raw).unwrap_or_else(|_| self.raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTENTS: &str = r#"{"intents":[
        {"intent":"GetWeather","slots":[{"name":"City","type":"CityName"}],"x-note":"kept"},
        {"intent":"AMAZON.HelpIntent"}
    ]}"#;

    #[test]
    fn test_intents_in_order() {
        let model = IntentModel::from_json(INTENTS).unwrap();
        let names: Vec<_> = model.intent_names().collect();
        assert_eq!(names, ["GetWeather", "AMAZON.HelpIntent"]);
        let slots = model.slots("GetWeather").unwrap();
        assert_eq!(slots[0].name, "City");
        assert_eq!(slots[0].kind, "CityName");
        assert!(model.slots("AMAZON.HelpIntent").unwrap().is_empty());
    }

    #[test]
    fn test_payload_preserves_unknown_fields() {
        let model = IntentModel::from_json(INTENTS).unwrap();
        let payload = model.to_payload();
        assert!(payload.contains("\"x-note\": \"kept\""));
        assert!(payload.starts_with("{\n  \"intents\""));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        assert!(IntentModel::from_json(r#"{"intent":"Nope"}"#).is_err());
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("intents.json");
        assert_eq!(IntentModel::load(&path).unwrap_err().exit_code(), 404);
        std::fs::write(&path, "{").unwrap();
        assert_eq!(IntentModel::load(&path).unwrap_err().exit_code(), 400);
    }
}
