//! Sutr Common Library
//!
//! Shared types for the Sutr skill publisher: publish profiles, the payload
//! exchanged between the orchestrator and the automation driver, and the
//! input/output files of a publish run.

pub mod error;
pub mod intents;
pub mod payload;
pub mod profile;
pub mod skill_config;
pub mod slots;

// Re-export commonly used types
pub use error::{Error, Result};
pub use intents::{IntentModel, IntentSlot, MAX_UTTERANCE_FILE_SIZE};
pub use payload::{BrowserOptions, DriverPayload};
pub use profile::{EndpointDescriptor, EndpointType, PublishProfile, SkillType};
pub use skill_config::SkillConfigRecord;
pub use slots::{load_slot_types, parse_slot_types, SlotTypeDefinition, SLOT_TYPE_TERMINATOR};

/// Sutr version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration directory (`~/.sutr`)
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".sutr")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
