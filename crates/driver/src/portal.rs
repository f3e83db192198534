//! Capability interface over the developer portal UI
//!
//! The publish pipeline only talks to the portal through [`Portal`]. Every
//! selector, page script and UI quirk lives in an implementation of this
//! trait, so a portal redesign is absorbed there and the step sequence stays
//! untouched.
//!
//! Methods come in two flavours: actions (`click_save`, `fill_skill_info`)
//! and probes (`save_control_enabled`, `loading_visible`). Probes must be
//! cheap and side-effect free; the pipeline polls them until they report the
//! state it is waiting for.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sutr_common::{EndpointType, SkillType, SlotTypeDefinition};

use crate::cookies::StoredCookie;
use crate::error::DriverResult;

/// Status reported by the portal after a save completes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalStatus {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PortalStatus {
    pub const SUCCESS: &'static str = "success";

    pub fn success() -> Self {
        Self {
            kind: Some(Self::SUCCESS.to_string()),
            message: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            kind: Some("error".to_string()),
            message: Some(message.to_string()),
        }
    }

    /// A status without a type is not a failure
    pub fn is_failure(&self) -> bool {
        matches!(&self.kind, Some(kind) if kind != Self::SUCCESS)
    }
}

/// Values entered on the skill information tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillInfo {
    pub skill_type: SkillType,
    pub name: String,
    pub invocation_name: String,
    pub uses_audio_player: bool,
}

#[async_trait]
pub trait Portal: Send + Sync {
    // Navigation and browser session

    /// Load the portal landing page
    async fn open_entry_page(&self) -> DriverResult<()>;

    /// Bring up the sign-in form from the landing page
    async fn open_sign_in(&self) -> DriverResult<()>;

    /// True once the browser sits on the authenticated home page
    async fn is_authenticated(&self) -> DriverResult<bool>;

    async fn submit_credentials(&self, username: &str, password: &str) -> DriverResult<()>;

    async fn current_url(&self) -> DriverResult<String>;

    async fn cookies(&self) -> DriverResult<Vec<StoredCookie>>;

    async fn install_cookies(&self, cookies: &[StoredCookie]) -> DriverResult<()>;

    async fn clear_cookies(&self) -> DriverResult<()>;

    /// PNG of the current viewport
    async fn screenshot(&self) -> DriverResult<Vec<u8>>;

    // Account selection

    /// Companies the signed-in identity can act for; empty for single accounts
    async fn list_companies(&self) -> DriverResult<Vec<String>>;

    async fn select_company(&self, name: &str) -> DriverResult<()>;

    async fn selected_company(&self) -> DriverResult<Option<String>>;

    // Skill list

    async fn open_developer_console(&self) -> DriverResult<()>;

    async fn tool_available(&self, tool_name: &str) -> DriverResult<bool>;

    async fn open_tool(&self, tool_name: &str) -> DriverResult<()>;

    async fn skill_list_visible(&self) -> DriverResult<bool>;

    async fn skill_listed(&self, skill_name: &str) -> DriverResult<bool>;

    async fn click_delete_skill(&self, skill_name: &str) -> DriverResult<()>;

    async fn delete_confirmation_visible(&self) -> DriverResult<bool>;

    async fn confirm_delete(&self) -> DriverResult<()>;

    // Skill editor

    async fn start_new_skill(&self) -> DriverResult<()>;

    async fn skill_editor_ready(&self, skill_type: SkillType) -> DriverResult<bool>;

    async fn fill_skill_info(&self, info: &SkillInfo) -> DriverResult<()>;

    async fn application_id_visible(&self) -> DriverResult<bool>;

    async fn read_application_id(&self) -> DriverResult<String>;

    /// Advance the skill editor to its next tab
    async fn next_tab(&self) -> DriverResult<()>;

    // Save control shared by every editor tab

    async fn save_control_enabled(&self) -> DriverResult<bool>;

    async fn click_save(&self) -> DriverResult<()>;

    async fn confirmation_dialog_visible(&self) -> DriverResult<bool>;

    async fn confirm_dialog(&self) -> DriverResult<()>;

    async fn loading_visible(&self) -> DriverResult<bool>;

    async fn read_status(&self) -> DriverResult<PortalStatus>;

    // Interaction model

    async fn interaction_model_ready(&self) -> DriverResult<bool>;

    async fn set_intent_model(&self, json: &str) -> DriverResult<()>;

    async fn open_slot_editor(&self) -> DriverResult<()>;

    async fn slot_editor_visible(&self) -> DriverResult<bool>;

    async fn fill_slot_type(&self, slot: &SlotTypeDefinition) -> DriverResult<()>;

    async fn slot_save_enabled(&self) -> DriverResult<bool>;

    async fn save_slot_type(&self) -> DriverResult<()>;

    async fn slot_add_enabled(&self) -> DriverResult<bool>;

    async fn set_utterances(&self, utterances: &str) -> DriverResult<()>;

    // Endpoint configuration

    async fn endpoint_form_ready(&self) -> DriverResult<bool>;

    async fn select_endpoint_type(&self, kind: EndpointType) -> DriverResult<()>;

    async fn select_default_region(&self) -> DriverResult<()>;

    async fn set_endpoint_location(&self, location: &str) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_failure_rules() {
        assert!(!PortalStatus::default().is_failure());
        assert!(!PortalStatus::success().is_failure());
        assert!(PortalStatus::error("boom").is_failure());
    }

    #[test]
    fn test_status_from_page_json() {
        let status: PortalStatus =
            serde_json::from_str(r#"{"type":"error","message":"Invalid intent schema"}"#).unwrap();
        assert!(status.is_failure());
        assert_eq!(status.message.as_deref(), Some("Invalid intent schema"));

        let empty: PortalStatus = serde_json::from_str("{}").unwrap();
        assert!(!empty.is_failure());
    }
}
