//! Scripted in-memory portal for pipeline tests
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::time::Duration;

use sutr_common::{EndpointType, PublishProfile, SkillType, SlotTypeDefinition};
use sutr_driver::{
    CookieJar, DriverError, DriverResult, Portal, PortalStatus, ScreenshotStore, Session,
    SkillInfo, StoredCookie, Timings,
};

pub const USERNAME: &str = "dev@example.com";
pub const PASSWORD: &str = "hunter2";

/// Knobs and observations of the fake portal
#[derive(Debug)]
pub struct FakeState {
    // Behaviour
    pub accept_cookies: bool,
    pub accept_credentials: bool,
    pub companies: Vec<String>,
    pub existing_skills: Vec<String>,
    pub save_enabled: bool,
    pub confirmation_dialog: bool,
    pub loading_polls: usize,
    pub loading_forever: bool,
    pub status: PortalStatus,
    pub assigned_application_id: String,
    pub slot_save_enabled: bool,

    // Page state
    pub authenticated: bool,
    pub cookies_installed: bool,
    pub selected_company: Option<String>,
    pub editor_open: bool,
    pub tabs_advanced: usize,
    pub slot_editor_open: bool,
    pub pending_slot: Option<SlotTypeDefinition>,
    pub dialog_open: bool,

    // Observations
    pub calls: Vec<String>,
    pub credential_submissions: usize,
    pub save_clicks: usize,
    pub dialogs_confirmed: usize,
    pub deleted_skills: Vec<String>,
    pub skill_info: Option<SkillInfo>,
    pub intent_model: Option<String>,
    pub slot_types: Vec<SlotTypeDefinition>,
    pub utterances: Option<String>,
    pub endpoint_type: Option<EndpointType>,
    pub endpoint_location: Option<String>,
    pub region_selected: bool,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            accept_cookies: true,
            accept_credentials: true,
            companies: Vec::new(),
            existing_skills: Vec::new(),
            save_enabled: true,
            confirmation_dialog: false,
            loading_polls: 1,
            loading_forever: false,
            status: PortalStatus::success(),
            assigned_application_id: "amzn1.ask.skill.NEW".to_string(),
            slot_save_enabled: true,
            authenticated: false,
            cookies_installed: false,
            selected_company: None,
            editor_open: false,
            tabs_advanced: 0,
            slot_editor_open: false,
            pending_slot: None,
            dialog_open: false,
            calls: Vec::new(),
            credential_submissions: 0,
            save_clicks: 0,
            dialogs_confirmed: 0,
            deleted_skills: Vec::new(),
            skill_info: None,
            intent_model: None,
            slot_types: Vec::new(),
            utterances: None,
            endpoint_type: None,
            endpoint_location: None,
            region_selected: false,
        }
    }
}

#[derive(Default)]
pub struct FakePortal {
    pub state: Mutex<FakeState>,
}

impl FakePortal {
    pub fn new(state: FakeState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn record(&self, call: &str) -> parking_lot::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock();
        state.calls.push(call.to_string());
        state
    }

    pub fn called(&self, call: &str) -> bool {
        self.state.lock().calls.iter().any(|c| c == call)
    }
}

#[async_trait]
impl Portal for FakePortal {
    async fn open_entry_page(&self) -> DriverResult<()> {
        self.record("open_entry_page");
        Ok(())
    }

    async fn open_sign_in(&self) -> DriverResult<()> {
        let mut state = self.record("open_sign_in");
        if state.cookies_installed && state.accept_cookies {
            state.authenticated = true;
        }
        Ok(())
    }

    async fn is_authenticated(&self) -> DriverResult<bool> {
        Ok(self.state.lock().authenticated)
    }

    async fn submit_credentials(&self, username: &str, password: &str) -> DriverResult<()> {
        let mut state = self.record("submit_credentials");
        state.credential_submissions += 1;
        // Rejected cookies poison the sign-in form until they are cleared
        let stale = state.cookies_installed && !state.accept_cookies;
        if !stale && state.accept_credentials && username == USERNAME && password == PASSWORD {
            state.authenticated = true;
        }
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok("https://portal.test/edit/endpoint".to_string())
    }

    async fn cookies(&self) -> DriverResult<Vec<StoredCookie>> {
        Ok(vec![cookie("session-token")])
    }

    async fn install_cookies(&self, _cookies: &[StoredCookie]) -> DriverResult<()> {
        self.record("install_cookies").cookies_installed = true;
        Ok(())
    }

    async fn clear_cookies(&self) -> DriverResult<()> {
        self.record("clear_cookies").cookies_installed = false;
        Ok(())
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        Ok(b"\x89PNG fake".to_vec())
    }

    async fn list_companies(&self) -> DriverResult<Vec<String>> {
        Ok(self.state.lock().companies.clone())
    }

    async fn select_company(&self, name: &str) -> DriverResult<()> {
        self.record("select_company").selected_company = Some(name.to_string());
        Ok(())
    }

    async fn selected_company(&self) -> DriverResult<Option<String>> {
        Ok(self.state.lock().selected_company.clone())
    }

    async fn open_developer_console(&self) -> DriverResult<()> {
        self.record("open_developer_console");
        Ok(())
    }

    async fn tool_available(&self, tool_name: &str) -> DriverResult<bool> {
        Ok(tool_name == "Alexa Skills Kit")
    }

    async fn open_tool(&self, _tool_name: &str) -> DriverResult<()> {
        self.record("open_tool");
        Ok(())
    }

    async fn skill_list_visible(&self) -> DriverResult<bool> {
        Ok(true)
    }

    async fn skill_listed(&self, skill_name: &str) -> DriverResult<bool> {
        Ok(self.state.lock().existing_skills.iter().any(|s| s == skill_name))
    }

    async fn click_delete_skill(&self, skill_name: &str) -> DriverResult<()> {
        let mut state = self.record("click_delete_skill");
        state.dialog_open = true;
        state.deleted_skills.push(skill_name.to_string());
        Ok(())
    }

    async fn delete_confirmation_visible(&self) -> DriverResult<bool> {
        Ok(self.state.lock().dialog_open)
    }

    async fn confirm_delete(&self) -> DriverResult<()> {
        let mut state = self.record("confirm_delete");
        state.dialog_open = false;
        let deleted = state.deleted_skills.clone();
        state.existing_skills.retain(|s| !deleted.contains(s));
        Ok(())
    }

    async fn start_new_skill(&self) -> DriverResult<()> {
        self.record("start_new_skill").editor_open = true;
        Ok(())
    }

    async fn skill_editor_ready(&self, _skill_type: SkillType) -> DriverResult<bool> {
        Ok(self.state.lock().editor_open)
    }

    async fn fill_skill_info(&self, info: &SkillInfo) -> DriverResult<()> {
        self.record("fill_skill_info").skill_info = Some(info.clone());
        Ok(())
    }

    async fn application_id_visible(&self) -> DriverResult<bool> {
        Ok(self.state.lock().save_clicks > 0)
    }

    async fn read_application_id(&self) -> DriverResult<String> {
        Ok(self.state.lock().assigned_application_id.clone())
    }

    async fn next_tab(&self) -> DriverResult<()> {
        self.record("next_tab").tabs_advanced += 1;
        Ok(())
    }

    async fn save_control_enabled(&self) -> DriverResult<bool> {
        Ok(self.state.lock().save_enabled)
    }

    async fn click_save(&self) -> DriverResult<()> {
        let mut state = self.record("click_save");
        state.save_clicks += 1;
        if state.confirmation_dialog {
            state.dialog_open = true;
        }
        Ok(())
    }

    async fn confirmation_dialog_visible(&self) -> DriverResult<bool> {
        Ok(self.state.lock().dialog_open)
    }

    async fn confirm_dialog(&self) -> DriverResult<()> {
        let mut state = self.record("confirm_dialog");
        state.dialog_open = false;
        state.dialogs_confirmed += 1;
        Ok(())
    }

    async fn loading_visible(&self) -> DriverResult<bool> {
        let mut state = self.state.lock();
        if state.loading_forever {
            return Ok(true);
        }
        if state.loading_polls > 0 {
            state.loading_polls -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    async fn read_status(&self) -> DriverResult<PortalStatus> {
        Ok(self.record("read_status").status.clone())
    }

    async fn interaction_model_ready(&self) -> DriverResult<bool> {
        Ok(self.state.lock().tabs_advanced >= 1)
    }

    async fn set_intent_model(&self, json: &str) -> DriverResult<()> {
        self.record("set_intent_model").intent_model = Some(json.to_string());
        Ok(())
    }

    async fn open_slot_editor(&self) -> DriverResult<()> {
        self.record("open_slot_editor").slot_editor_open = true;
        Ok(())
    }

    async fn slot_editor_visible(&self) -> DriverResult<bool> {
        Ok(self.state.lock().slot_editor_open)
    }

    async fn fill_slot_type(&self, slot: &SlotTypeDefinition) -> DriverResult<()> {
        self.record("fill_slot_type").pending_slot = Some(slot.clone());
        Ok(())
    }

    async fn slot_save_enabled(&self) -> DriverResult<bool> {
        let state = self.state.lock();
        Ok(state.slot_save_enabled && state.pending_slot.is_some())
    }

    async fn save_slot_type(&self) -> DriverResult<()> {
        let mut state = self.record("save_slot_type");
        let slot = state
            .pending_slot
            .take()
            .ok_or_else(|| DriverError::PortalInteraction("no slot type in editor".into()))?;
        state.slot_types.push(slot);
        state.slot_editor_open = false;
        Ok(())
    }

    async fn slot_add_enabled(&self) -> DriverResult<bool> {
        Ok(!self.state.lock().slot_editor_open)
    }

    async fn set_utterances(&self, utterances: &str) -> DriverResult<()> {
        self.record("set_utterances").utterances = Some(utterances.to_string());
        Ok(())
    }

    async fn endpoint_form_ready(&self) -> DriverResult<bool> {
        Ok(self.state.lock().tabs_advanced >= 2)
    }

    async fn select_endpoint_type(&self, kind: EndpointType) -> DriverResult<()> {
        self.record("select_endpoint_type").endpoint_type = Some(kind);
        Ok(())
    }

    async fn select_default_region(&self) -> DriverResult<()> {
        self.record("select_default_region").region_selected = true;
        Ok(())
    }

    async fn set_endpoint_location(&self, location: &str) -> DriverResult<()> {
        self.record("set_endpoint_location").endpoint_location = Some(location.to_string());
        Ok(())
    }
}

pub fn cookie(name: &str) -> StoredCookie {
    StoredCookie {
        name: name.to_string(),
        value: "persisted".to_string(),
        domain: Some(".amazon.com".to_string()),
        path: Some("/".to_string()),
        secure: true,
        http_only: true,
    }
}

/// Fast waits so timeouts resolve in milliseconds
pub fn fast_timings() -> Timings {
    Timings::uniform(Duration::from_millis(1), Duration::from_millis(25))
}

/// Profile whose files live under `out`
pub fn profile(out: &Path, endpoint: Option<(&str, &str)>) -> PublishProfile {
    let mut json = serde_json::json!({
        "skillName": "Weather Helper",
        "skillInvocationName": "weather helper",
        "skillOutputDirectory": out,
        "skillConfigFilePath": out.join("skill-config.json"),
        "buildModelTimeout": 50,
    });
    if let Some((kind, location)) = endpoint {
        json["endpoint"] = serde_json::json!({ "type": kind, "location": location });
    }
    PublishProfile::from_json(&json.to_string()).unwrap()
}

/// Persist a cookie file for the test account
pub fn seed_cookies(out: &Path) {
    CookieJar::for_account(out, USERNAME)
        .save(&[cookie("session-token")])
        .unwrap();
}

pub fn session(profile: PublishProfile) -> Session {
    Session::new(profile, USERNAME.to_string(), PASSWORD.to_string())
}

/// Input files of the "Weather Helper" skill
pub fn write_skill_inputs(out: &Path) {
    std::fs::create_dir_all(out).unwrap();
    std::fs::write(
        out.join("intents.json"),
        r#"{"intents":[{"intent":"GetWeather","slots":[{"name":"City","type":"CityName"}]}]}"#,
    )
    .unwrap();
    std::fs::write(out.join("custom.types"), "CityName\nSeattle\nPortland\n<<<<<\n").unwrap();
    std::fs::write(out.join("skill.utr"), "GetWeather what is the weather in {City}\n").unwrap();
}

pub fn screenshots(out: &Path) -> ScreenshotStore {
    ScreenshotStore::for_output_dir(out)
}
