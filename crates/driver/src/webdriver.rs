//! [`Portal`] implementation over a WebDriver session
//!
//! All selectors and page scripts of the developer portal live here. The
//! portal is an AngularJS application with jQuery on the page; values set from
//! scripts must be announced to Angular with `triggerHandler('input')` or the
//! bound model never sees them. Scripts receive their inputs as WebDriver
//! arguments (`arguments[0]`, ...), never by string interpolation.

use async_trait::async_trait;
use fantoccini::cookies::Cookie;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use sutr_common::{BrowserOptions, EndpointType, SkillType, SlotTypeDefinition};
use tracing::{debug, info};

use crate::cookies::StoredCookie;
use crate::error::{DriverError, DriverResult};
use crate::portal::{Portal, PortalStatus, SkillInfo};

/// The sign-in page rejects submissions from unrecognised browsers
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/44.0.2403.157 Safari/537.36";

const ENTRY_URL: &str = "https://developer.amazon.com";
const HOME_URL: &str = "https://developer.amazon.com/home.html";

mod selectors {
    pub const LOGIN_LINK: &str = "header a.dp-navbar-login";
    pub const SIGN_IN_FORM: &str = "form#ap_signin_form";
    pub const DEVELOPER_CONSOLE_LINK: &str = "nav a#top_nav_echodeveloperwebsite";
    pub const SKILL_LIST: &str = ".EDW_AppList";
    pub const CREATE_SKILL: &str = ".CreateApplicationButton";
    pub const NEXT_TAB: &str = "#edw-next-skill-tab-button";
    pub const SAVE_SKILL: &str = "#edw-save-skill-button";
    pub const LOADING_STATUS: &str = "#EDW_Main_Loading_Status";
    pub const APPLICATION_ID: &str = r#"edw-user-input[edw-name="AppEditingConfig.APP_INFO_TAB.ID.TEXT"]"#;
    pub const INTENT_SCHEMA_FORM: &str = r#"form[name="IntentSchemaForm"]"#;
    pub const ADD_SLOT_TYPE: &str = "#interaction-model-tab-add-catalog-button";
    pub const SLOT_EDITOR: &str = ".catalog-editor-container";
    pub const SAVE_SLOT_TYPE: &str = "#interaction-model-tab-save-catalog-button";
    pub const ENDPOINT_SECTION: &str = "section.update-application-endpoint";
    pub const ENDPOINT_LAMBDA: &str = "#service-endpoint-lambda";
    pub const ENDPOINT_HTTPS: &str = "#service-endpoint-https";
    pub const REGION_NA: &str = "#endpoint-region-NA";
}

mod scripts {
    /// jQuery `:visible` semantics
    pub const VISIBLE: &str = r##"
        var el = document.querySelector(arguments[0]);
        return !!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
    "##;

    pub const ENABLED: &str = r##"
        try { return $(arguments[0]).prop("disabled") === false; } catch (e) { return false; }
    "##;

    pub const COMPANIES: &str = r##"
        return $("#headerFirmDropdown").find("ul > li > a").map(function() {
            return $(this).text();
        }).toArray();
    "##;

    pub const SELECT_COMPANY: &str = r##"
        var name = arguments[0];
        var link = $("#headerFirmDropdown").find("ul > li > a").filter(function() {
            return $(this).text() === name;
        })[0];
        if (link) { link.click(); }
        return !!link;
    "##;

    pub const SELECTED_COMPANY: &str = r##"
        try {
            var button = $("#headerFirmDropdown").children(".button");
            return button.length ? button.text() : null;
        } catch (e) { return null; }
    "##;

    pub const TOOL_AVAILABLE: &str = r##"
        var tool = arguments[0];
        try {
            return $('div.EDWHomeToolFrame p').filter(function() {
                return $(this).text().indexOf(tool) !== -1;
            }).siblings('button.EDWHomeToolButton').length > 0;
        } catch (e) { return false; }
    "##;

    pub const OPEN_TOOL: &str = r##"
        var tool = arguments[0];
        var button = $('div.EDWHomeToolFrame p').filter(function() {
            return $(this).text().indexOf(tool) !== -1;
        }).siblings('button.EDWHomeToolButton');
        button.click();
        return button.length > 0;
    "##;

    pub const SKILL_LISTED: &str = r##"
        var name = arguments[0];
        try {
            return $('div.edw-applist span.edw-applist-app-skillname').filter(function() {
                return $(this).text() === name;
            }).length > 0;
        } catch (e) { return false; }
    "##;

    pub const DELETE_SKILL: &str = r##"
        var name = arguments[0];
        var action = $('div.edw-applist span.edw-applist-app-skillname').filter(function() {
            return $(this).text() === name;
        }).parent().find('.edw-applist-app-action:contains("Delete")');
        action.click();
        return action.length > 0;
    "##;

    pub const DELETE_CONFIRMATION_VISIBLE: &str = r##"
        return $('#edw-message-box').find('button:contains("Delete")').length > 0;
    "##;

    pub const CONFIRM_DELETE: &str = r##"
        $('#edw-message-box').find('button:contains("Delete")').click();
    "##;

    pub const FILL_SKILL_INFO: &str = r##"
        var info = arguments[0];
        var field = function(name) {
            return $('edw-user-input[edw-name="AppEditingConfig.' + name + '"]');
        };
        field('APP_INFO_TAB.SKILL_TYPES.TEXT')
            .find('input[type="radio"][value="' + info.skillType + '"]').click();
        var setText = function(name, value) {
            var input = field(name).find('input[type="text"]');
            input.val(value);
            angular.element(input).triggerHandler('input');
        };
        setText('APP_INFO_TAB.NAME.TEXT', info.name);
        setText('APP_INFO_TAB.SPOKEN_NAME.TEXT', info.invocationName);
        field('ALEXA_APPSTORE_INFO_TAB.SUB_SECTIONS.AUDIO_PLAYER')
            .find('input[type="radio"][value="' + info.usesAudioPlayer + '"]').click();
    "##;

    pub const READ_APPLICATION_ID: &str = r##"
        return $('edw-user-input[edw-name="AppEditingConfig.APP_INFO_TAB.ID.TEXT"]')
            .find('.UpdateApplicationFormRowTextBox:visible')
            .find('label')
            .text();
    "##;

    pub const CONFIRMATION_DIALOG_VISIBLE: &str = r##"
        var dialog = $('#edw-message-box').closest(".edw-messagebox");
        return dialog.is(":visible") && dialog.find('button:contains("Yes")').length > 0;
    "##;

    pub const CONFIRM_DIALOG: &str = r##"
        $('#edw-message-box').find('button:contains("Yes")').click();
    "##;

    pub const LOADING_VISIBLE: &str = r##"
        return $(arguments[0]).is(':visible');
    "##;

    pub const READ_STATUS: &str = r##"
        var status = angular.element($("#EDW_Status")).scope().getStatus() || {};
        return { type: status.type || null, message: status.message || null };
    "##;

    /// Paste into the CodeMirror editor that follows the named textarea
    pub const SET_CODE_EDITOR: &str = r##"
        var editor = $('textarea[name="' + arguments[0] + '"]').next(".CodeMirror")[0].CodeMirror;
        editor.getDoc().setValue(arguments[1]);
        angular.element(editor).triggerHandler('input');
    "##;

    pub const FILL_SLOT_TYPE: &str = r##"
        var slot = arguments[0];
        // The slot editor throws on raw-text slot checks unless this flag is set
        window.EDW_CONFIG.isRawTextSlotEnabled = true;
        var nameBox = $("#interaction-model-tab-catalog-name-textbox");
        nameBox.val(slot.name);
        angular.element(nameBox).triggerHandler('input');
        var editor = $('textarea[name="catalog-values"]').next(".CodeMirror")[0].CodeMirror;
        editor.getDoc().setValue(slot.values);
        angular.element(editor).triggerHandler('input');
    "##;

    pub const SET_ENDPOINT_LOCATION: &str = r##"
        var box = $("#regional-endpoint-option-input-NA");
        box.val(arguments[0]);
        angular.element(box).triggerHandler('input');
    "##;
}

/// Chrome capabilities for a session with `options`
fn capabilities(options: &BrowserOptions) -> serde_json::Map<String, Value> {
    let mut args = vec![
        format!("--user-agent={}", USER_AGENT),
        format!(
            "--window-size={},{}",
            options.viewport_width, options.viewport_height
        ),
    ];
    if options.headless {
        args.extend(["--headless".into(), "--disable-gpu".into(), "--no-sandbox".into()]);
    }
    let mut caps = serde_json::Map::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

/// Developer portal driven through a WebDriver session
pub struct WebDriverPortal {
    client: Client,
}

impl WebDriverPortal {
    /// Open a browser session on the WebDriver server
    pub async fn connect(options: &BrowserOptions) -> DriverResult<Self> {
        let caps = capabilities(options);
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&options.webdriver_url)
            .await?;
        client
            .set_window_size(options.viewport_width, options.viewport_height)
            .await?;

        info!(webdriver_url = %options.webdriver_url, "Browser session started");
        Ok(Self { client })
    }

    /// End the browser session
    pub async fn close(self) -> DriverResult<()> {
        self.client.close().await?;
        debug!("Browser session closed");
        Ok(())
    }

    async fn run(&self, script: &str, args: Vec<Value>) -> DriverResult<Value> {
        Ok(self.client.execute(script, args).await?)
    }

    async fn run_bool(&self, script: &str, args: Vec<Value>) -> DriverResult<bool> {
        Ok(self.run(script, args).await?.as_bool().unwrap_or(false))
    }

    async fn visible(&self, selector: &str) -> DriverResult<bool> {
        self.run_bool(scripts::VISIBLE, vec![json!(selector)]).await
    }

    async fn enabled(&self, selector: &str) -> DriverResult<bool> {
        self.run_bool(scripts::ENABLED, vec![json!(selector)]).await
    }

    async fn click(&self, selector: &str) -> DriverResult<()> {
        self.client.find(Locator::Css(selector)).await?.click().await?;
        Ok(())
    }

    /// Run an action script that reports whether its target existed
    async fn act(&self, script: &str, args: Vec<Value>, missing: &str) -> DriverResult<()> {
        if self.run_bool(script, args).await? {
            Ok(())
        } else {
            Err(DriverError::PortalInteraction(missing.to_string()))
        }
    }
}

#[async_trait]
impl Portal for WebDriverPortal {
    async fn open_entry_page(&self) -> DriverResult<()> {
        info!("Initializing Alexa Skills deployment...");
        self.client.goto(ENTRY_URL).await?;
        Ok(())
    }

    async fn open_sign_in(&self) -> DriverResult<()> {
        self.click(selectors::LOGIN_LINK).await
    }

    async fn is_authenticated(&self) -> DriverResult<bool> {
        let url = self.client.current_url().await?;
        Ok(url.as_str().trim_end_matches('/') == HOME_URL)
    }

    async fn submit_credentials(&self, username: &str, password: &str) -> DriverResult<()> {
        let form = self.client.form(Locator::Css(selectors::SIGN_IN_FORM)).await?;
        form.set_by_name("email", username).await?;
        form.set_by_name("password", password).await?;
        form.submit().await?;
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn cookies(&self) -> DriverResult<Vec<StoredCookie>> {
        let cookies = self.client.get_all_cookies().await?;
        Ok(cookies
            .iter()
            .map(|c| StoredCookie {
                name: c.name().to_string(),
                value: c.value().to_string(),
                domain: c.domain().map(str::to_string),
                path: c.path().map(str::to_string),
                secure: c.secure().unwrap_or(false),
                http_only: c.http_only().unwrap_or(false),
            })
            .collect())
    }

    async fn install_cookies(&self, cookies: &[StoredCookie]) -> DriverResult<()> {
        for stored in cookies {
            let mut cookie = Cookie::new(stored.name.clone(), stored.value.clone());
            if let Some(domain) = &stored.domain {
                cookie.set_domain(domain.clone());
            }
            if let Some(path) = &stored.path {
                cookie.set_path(path.clone());
            }
            cookie.set_secure(stored.secure);
            cookie.set_http_only(stored.http_only);
            // Cookies for other domains are refused by the browser; skip them
            if let Err(e) = self.client.add_cookie(cookie).await {
                debug!("Skipping cookie {}: {}", stored.name, e);
            }
        }
        Ok(())
    }

    async fn clear_cookies(&self) -> DriverResult<()> {
        self.client.delete_all_cookies().await?;
        Ok(())
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        Ok(self.client.screenshot().await?)
    }

    async fn list_companies(&self) -> DriverResult<Vec<String>> {
        let value = self.run(scripts::COMPANIES, vec![]).await?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    async fn select_company(&self, name: &str) -> DriverResult<()> {
        self.act(
            scripts::SELECT_COMPANY,
            vec![json!(name)],
            &format!("Company \"{}\" is not listed", name),
        )
        .await
    }

    async fn selected_company(&self) -> DriverResult<Option<String>> {
        let value = self.run(scripts::SELECTED_COMPANY, vec![]).await?;
        Ok(value.as_str().map(|s| s.trim().to_string()))
    }

    async fn open_developer_console(&self) -> DriverResult<()> {
        self.click(selectors::DEVELOPER_CONSOLE_LINK).await
    }

    async fn tool_available(&self, tool_name: &str) -> DriverResult<bool> {
        self.run_bool(scripts::TOOL_AVAILABLE, vec![json!(tool_name)])
            .await
    }

    async fn open_tool(&self, tool_name: &str) -> DriverResult<()> {
        info!("Retrieving existing skills...");
        self.act(
            scripts::OPEN_TOOL,
            vec![json!(tool_name)],
            &format!("Tool \"{}\" is not available", tool_name),
        )
        .await
    }

    async fn skill_list_visible(&self) -> DriverResult<bool> {
        self.visible(selectors::SKILL_LIST).await
    }

    async fn skill_listed(&self, skill_name: &str) -> DriverResult<bool> {
        self.run_bool(scripts::SKILL_LISTED, vec![json!(skill_name)]).await
    }

    async fn click_delete_skill(&self, skill_name: &str) -> DriverResult<()> {
        self.act(
            scripts::DELETE_SKILL,
            vec![json!(skill_name)],
            &format!("No delete action for skill \"{}\"", skill_name),
        )
        .await
    }

    async fn delete_confirmation_visible(&self) -> DriverResult<bool> {
        self.run_bool(scripts::DELETE_CONFIRMATION_VISIBLE, vec![]).await
    }

    async fn confirm_delete(&self) -> DriverResult<()> {
        self.run(scripts::CONFIRM_DELETE, vec![]).await?;
        Ok(())
    }

    async fn start_new_skill(&self) -> DriverResult<()> {
        self.click(selectors::CREATE_SKILL).await
    }

    async fn skill_editor_ready(&self, skill_type: SkillType) -> DriverResult<bool> {
        let selector = format!(
            r#"edw-user-input[edw-name="AppEditingConfig.APP_INFO_TAB.SKILL_TYPES.TEXT"] input[type="radio"][value="{}"]"#,
            skill_type.as_str()
        );
        self.visible(&selector).await
    }

    async fn fill_skill_info(&self, info: &SkillInfo) -> DriverResult<()> {
        let arg = json!({
            "skillType": info.skill_type.as_str(),
            "name": info.name,
            "invocationName": info.invocation_name,
            "usesAudioPlayer": info.uses_audio_player.to_string(),
        });
        self.run(scripts::FILL_SKILL_INFO, vec![arg]).await?;
        Ok(())
    }

    async fn application_id_visible(&self) -> DriverResult<bool> {
        self.visible(selectors::APPLICATION_ID).await
    }

    async fn read_application_id(&self) -> DriverResult<String> {
        let value = self.run(scripts::READ_APPLICATION_ID, vec![]).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn next_tab(&self) -> DriverResult<()> {
        self.click(selectors::NEXT_TAB).await
    }

    async fn save_control_enabled(&self) -> DriverResult<bool> {
        self.enabled(selectors::SAVE_SKILL).await
    }

    async fn click_save(&self) -> DriverResult<()> {
        self.click(selectors::SAVE_SKILL).await
    }

    async fn confirmation_dialog_visible(&self) -> DriverResult<bool> {
        self.run_bool(scripts::CONFIRMATION_DIALOG_VISIBLE, vec![]).await
    }

    async fn confirm_dialog(&self) -> DriverResult<()> {
        self.run(scripts::CONFIRM_DIALOG, vec![]).await?;
        Ok(())
    }

    async fn loading_visible(&self) -> DriverResult<bool> {
        self.run_bool(scripts::LOADING_VISIBLE, vec![json!(selectors::LOADING_STATUS)])
            .await
    }

    async fn read_status(&self) -> DriverResult<PortalStatus> {
        let value = self.run(scripts::READ_STATUS, vec![]).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn interaction_model_ready(&self) -> DriverResult<bool> {
        self.visible(selectors::INTENT_SCHEMA_FORM).await
    }

    async fn set_intent_model(&self, json: &str) -> DriverResult<()> {
        info!("Uploading intents...");
        self.run(
            scripts::SET_CODE_EDITOR,
            vec![json!("intentModel"), json!(json)],
        )
        .await?;
        Ok(())
    }

    async fn open_slot_editor(&self) -> DriverResult<()> {
        self.click(selectors::ADD_SLOT_TYPE).await
    }

    async fn slot_editor_visible(&self) -> DriverResult<bool> {
        self.visible(selectors::SLOT_EDITOR).await
    }

    async fn fill_slot_type(&self, slot: &SlotTypeDefinition) -> DriverResult<()> {
        info!("Uploading slot definition: {} ...", slot.name);
        self.run(scripts::FILL_SLOT_TYPE, vec![serde_json::to_value(slot)?])
            .await?;
        Ok(())
    }

    async fn slot_save_enabled(&self) -> DriverResult<bool> {
        self.enabled(selectors::SAVE_SLOT_TYPE).await
    }

    async fn save_slot_type(&self) -> DriverResult<()> {
        self.click(selectors::SAVE_SLOT_TYPE).await
    }

    async fn slot_add_enabled(&self) -> DriverResult<bool> {
        self.enabled(selectors::ADD_SLOT_TYPE).await
    }

    async fn set_utterances(&self, utterances: &str) -> DriverResult<()> {
        info!("Uploading utterances...");
        self.run(
            scripts::SET_CODE_EDITOR,
            vec![json!("tests"), json!(utterances)],
        )
        .await?;
        Ok(())
    }

    async fn endpoint_form_ready(&self) -> DriverResult<bool> {
        for selector in [
            selectors::ENDPOINT_SECTION,
            selectors::ENDPOINT_LAMBDA,
            selectors::ENDPOINT_HTTPS,
        ] {
            if !self.visible(selector).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn select_endpoint_type(&self, kind: EndpointType) -> DriverResult<()> {
        info!("Configuring endpoint...");
        match kind {
            EndpointType::Lambda => self.click(selectors::ENDPOINT_LAMBDA).await,
            EndpointType::Https => self.click(selectors::ENDPOINT_HTTPS).await,
        }
    }

    async fn select_default_region(&self) -> DriverResult<()> {
        // TODO: take the region from the publish profile once more than NA is needed
        self.click(selectors::REGION_NA).await
    }

    async fn set_endpoint_location(&self, location: &str) -> DriverResult<()> {
        self.run(scripts::SET_ENDPOINT_LOCATION, vec![json!(location)])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome_args(options: &BrowserOptions) -> Vec<String> {
        let caps = capabilities(options);
        serde_json::from_value(caps["goog:chromeOptions"]["args"].clone()).unwrap()
    }

    #[test]
    fn test_headless_capabilities() {
        let args = chrome_args(&BrowserOptions::default());
        assert!(args.contains(&format!("--user-agent={}", USER_AGENT)));
        assert!(args.contains(&"--window-size=1280,900".to_string()));
        assert!(args.contains(&"--headless".to_string()));
    }

    #[test]
    fn test_headed_capabilities() {
        let options = BrowserOptions {
            headless: false,
            ..Default::default()
        };
        assert!(!chrome_args(&options).iter().any(|a| a == "--headless"));
    }

    #[test]
    fn test_scripts_keep_id_selectors() {
        assert!(scripts::COMPANIES.contains(r##"$("#headerFirmDropdown")"##));
        assert!(scripts::SELECTED_COMPANY.contains(r##".children(".button")"##));
        assert!(scripts::FILL_SLOT_TYPE.contains(r##"$("#interaction-model-tab-catalog-name-textbox")"##));
        assert!(scripts::FILL_SLOT_TYPE.contains(r##".next(".CodeMirror")"##));
        assert!(scripts::SET_ENDPOINT_LOCATION.contains(r##"$("#regional-endpoint-option-input-NA")"##));
        assert!(scripts::READ_STATUS.contains(r##"$("#EDW_Status")"##));
    }

    #[test]
    fn test_scripts_take_arguments() {
        for script in [
            scripts::VISIBLE,
            scripts::ENABLED,
            scripts::SELECT_COMPANY,
            scripts::TOOL_AVAILABLE,
            scripts::OPEN_TOOL,
            scripts::SKILL_LISTED,
            scripts::DELETE_SKILL,
            scripts::FILL_SKILL_INFO,
            scripts::LOADING_VISIBLE,
            scripts::SET_CODE_EDITOR,
            scripts::FILL_SLOT_TYPE,
            scripts::SET_ENDPOINT_LOCATION,
        ] {
            assert!(script.contains("arguments[0]"), "{}", script);
        }
    }
}
