//! Publish steps
//!
//! The catalog is a fixed sequence; each step reads and writes the shared
//! [`Session`] and reaches the portal only through the [`PageDriver`].

use std::fmt;
use tracing::{debug, info, warn};

use sutr_common::{
    load_slot_types, IntentModel, SkillConfigRecord, SlotTypeDefinition,
    MAX_UTTERANCE_FILE_SIZE,
};

use crate::auth;
use crate::error::{DriverError, DriverResult};
use crate::page::PageDriver;
use crate::portal::{Portal, SkillInfo};
use crate::save::{save_and_wait, SaveRequest};
use crate::session::Session;
use crate::summary::PublishSummary;

/// One entry of the publish sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    OpenEntryPage,
    ResumeSession,
    SignIn,
    SelectCompany,
    OpenSkillsKit,
    RemoveExistingSkill,
    CreateSkill,
    UploadIntents,
    UploadSlotTypes,
    UploadUtterances,
    SaveInteractionModel,
    ConfigureEndpoint,
    RecordApplicationId,
    Summarize,
}

impl Step {
    /// Every step, in execution order
    pub const ALL: [Step; 14] = [
        Step::OpenEntryPage,
        Step::ResumeSession,
        Step::SignIn,
        Step::SelectCompany,
        Step::OpenSkillsKit,
        Step::RemoveExistingSkill,
        Step::CreateSkill,
        Step::UploadIntents,
        Step::UploadSlotTypes,
        Step::UploadUtterances,
        Step::SaveInteractionModel,
        Step::ConfigureEndpoint,
        Step::RecordApplicationId,
        Step::Summarize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::OpenEntryPage => "open-entry-page",
            Step::ResumeSession => "resume-session",
            Step::SignIn => "sign-in",
            Step::SelectCompany => "select-company",
            Step::OpenSkillsKit => "open-skills-kit",
            Step::RemoveExistingSkill => "remove-existing-skill",
            Step::CreateSkill => "create-skill",
            Step::UploadIntents => "upload-intents",
            Step::UploadSlotTypes => "upload-slot-types",
            Step::UploadUtterances => "upload-utterances",
            Step::SaveInteractionModel => "save-interaction-model",
            Step::ConfigureEndpoint => "configure-endpoint",
            Step::RecordApplicationId => "record-application-id",
            Step::Summarize => "summarize",
        }
    }

    pub async fn run<P: Portal + ?Sized>(
        self,
        page: &PageDriver<'_, P>,
        session: &mut Session,
    ) -> DriverResult<StepOutcome> {
        match self {
            Step::OpenEntryPage => open_entry_page(page, session).await,
            Step::ResumeSession => resume_session(page, session).await,
            Step::SignIn => sign_in(page, session).await,
            Step::SelectCompany => select_company(page, session).await,
            Step::OpenSkillsKit => open_skills_kit(page, session).await,
            Step::RemoveExistingSkill => remove_existing_skill(page, session).await,
            Step::CreateSkill => create_skill(page, session).await,
            Step::UploadIntents => upload_intents(page, session).await,
            Step::UploadSlotTypes => upload_slot_types(page, session).await,
            Step::UploadUtterances => upload_utterances(page, session).await,
            Step::SaveInteractionModel => save_interaction_model(page, session).await,
            Step::ConfigureEndpoint => configure_endpoint(page, session).await,
            Step::RecordApplicationId => record_application_id(session).await,
            Step::Summarize => summarize(session).await,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped(String),
}

impl StepOutcome {
    fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::Skipped(reason.into())
    }
}

// ============================================================================
// Session
// ============================================================================

async fn open_entry_page<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let portal = page.portal();
    portal.open_entry_page().await?;
    if let Some(cookies) = &session.persisted_cookies {
        debug!("Installing {} persisted cookies", cookies.len());
        portal.install_cookies(cookies).await?;
    }
    portal.open_sign_in().await?;
    Ok(StepOutcome::Done)
}

async fn resume_session<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    if !session.has_persisted_session() {
        return Ok(StepOutcome::skipped("no persisted session"));
    }
    auth::resume_session(page, session).await?;
    Ok(StepOutcome::Done)
}

async fn sign_in<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    if session.authenticated {
        return Ok(StepOutcome::skipped("already authenticated"));
    }
    auth::sign_in(page, session).await?;
    Ok(StepOutcome::Done)
}

async fn select_company<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let portal = page.portal();
    let companies = portal.list_companies().await?;
    if companies.is_empty() {
        return Ok(StepOutcome::skipped("account has no company list"));
    }

    let wanted = match &session.profile.company_name {
        Some(name) if companies.iter().any(|c| c == name) => name.as_str(),
        _ => return Err(DriverError::AmbiguousAccount { companies }),
    };

    if portal.selected_company().await?.as_deref() != Some(wanted) {
        info!("Switching to company {}", wanted);
        portal.select_company(wanted).await?;
        page.settle().await;
    }
    page.require(
        "company selection",
        page.timings().ui_timeout,
        move || async move { Ok(portal.selected_company().await?.as_deref() == Some(wanted)) },
    )
    .await?;
    Ok(StepOutcome::Done)
}

// ============================================================================
// Skill list
// ============================================================================

async fn open_skills_kit<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let portal = page.portal();

    match portal.cookies().await {
        Ok(cookies) => {
            if let Err(e) = session.cookie_jar.save(&cookies) {
                warn!("Could not persist session cookies: {}", e);
            }
        }
        Err(e) => warn!("Could not read session cookies: {}", e),
    }

    let tool = session.profile.tool_name.as_str();
    portal.open_developer_console().await?;
    page.require(
        &format!("\"{}\" on the console home page", tool),
        page.timings().tool_timeout,
        move || portal.tool_available(tool),
    )
    .await?;
    portal.open_tool(tool).await?;
    page.require("skill list", page.timings().ui_timeout, move || {
        portal.skill_list_visible()
    })
    .await?;
    Ok(StepOutcome::Done)
}

async fn remove_existing_skill<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let portal = page.portal();
    let name = session.profile.skill_name.as_str();

    let listed = page
        .wait_until("existing skill in the list", page.timings().ui_timeout, move || {
            portal.skill_listed(name)
        })
        .await;
    if !listed {
        return Ok(StepOutcome::skipped(format!("no skill named \"{}\"", name)));
    }

    info!("Removing existing skill \"{}\"", name);
    portal.click_delete_skill(name).await?;
    page.require(
        "delete confirmation",
        page.timings().ui_timeout,
        move || portal.delete_confirmation_visible(),
    )
    .await?;
    portal.confirm_delete().await?;
    page.settle().await;
    page.require("skill list", page.timings().ui_timeout, move || {
        portal.skill_list_visible()
    })
    .await?;
    Ok(StepOutcome::Done)
}

// ============================================================================
// Skill editor
// ============================================================================

const CREATE_FAILED: &str = "Failed to create new skill";

async fn create_skill<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let portal = page.portal();
    let profile = &session.profile;
    let skill_type = profile.skill_type;

    info!("Creating new skill...");
    portal.start_new_skill().await?;
    page.require("skill editor", page.timings().ui_timeout, move || {
        portal.skill_editor_ready(skill_type)
    })
    .await?;

    portal
        .fill_skill_info(&SkillInfo {
            skill_type,
            name: profile.skill_name.clone(),
            invocation_name: profile.skill_invocation_name.clone(),
            uses_audio_player: profile.uses_audio_player,
        })
        .await?;

    save_and_wait(
        page,
        &SaveRequest::new(CREATE_FAILED, page.timings().save_timeout),
    )
    .await?;

    page.require("application id", page.timings().ui_timeout, move || {
        portal.application_id_visible()
    })
    .await?;
    let application_id = portal.read_application_id().await?.trim().to_string();
    if application_id.is_empty() {
        return Err(DriverError::portal(CREATE_FAILED, "No application id assigned"));
    }
    info!("Created skill with application id {}", application_id);
    session.set_application_id(application_id);

    portal.next_tab().await?;
    page.require(
        "interaction model editor",
        page.timings().ui_timeout,
        move || portal.interaction_model_ready(),
    )
    .await?;
    Ok(StepOutcome::Done)
}

// ============================================================================
// Interaction model
// ============================================================================

async fn upload_intents<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let model = IntentModel::load(&session.profile.intents_path())?;
    debug!(
        "Uploading intents: {}",
        model.intent_names().collect::<Vec<_>>().join(", ")
    );
    page.portal().set_intent_model(&model.to_payload()).await?;
    Ok(StepOutcome::Done)
}

async fn upload_slot_types<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let slot_types = load_slot_types(&session.profile.slot_types_path())?;
    if slot_types.is_empty() {
        return Ok(StepOutcome::skipped("no slot types defined"));
    }
    for slot in &slot_types {
        upload_slot_type(page, slot).await?;
    }
    info!("Uploaded {} slot types", slot_types.len());
    Ok(StepOutcome::Done)
}

async fn upload_slot_type<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    slot: &SlotTypeDefinition,
) -> DriverResult<()> {
    let portal = page.portal();
    let ui_timeout = page.timings().ui_timeout;
    let add_failed = format!("Failed to add slot type \"{}\"", slot.name);
    let save_failed = format!("Failed to save slot type \"{}\"", slot.name);

    debug!("Adding slot type {} ({} values)", slot.name, slot.value_count());
    portal.open_slot_editor().await?;
    if !page
        .wait_until("slot editor", ui_timeout, move || portal.slot_editor_visible())
        .await
    {
        return Err(DriverError::portal(&add_failed, "Timed out!"));
    }

    portal.fill_slot_type(slot).await?;
    if !page
        .wait_until("slot save control", ui_timeout, move || {
            portal.slot_save_enabled()
        })
        .await
    {
        return Err(DriverError::portal(&add_failed, "Internal Server Error"));
    }

    portal.save_slot_type().await?;
    if !page
        .wait_until("slot add control", ui_timeout, move || portal.slot_add_enabled())
        .await
    {
        return Err(DriverError::portal(&save_failed, "Internal Server Error"));
    }
    Ok(())
}

async fn upload_utterances<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let path = session.profile.utterances_path();
    let utterances = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DriverError::NotFound(format!(
                "Unable to find utterances at {}",
                path.display()
            )));
        }
        Err(e) => {
            return Err(DriverError::Configuration(format!(
                "Unable to read utterances at {}: {}",
                path.display(),
                e
            )));
        }
    };

    if utterances.len() as u64 > MAX_UTTERANCE_FILE_SIZE {
        warn!(
            "Utterances file {} is {} bytes; the portal may reject more than {} bytes",
            path.display(),
            utterances.len(),
            MAX_UTTERANCE_FILE_SIZE
        );
    }
    page.portal().set_utterances(&utterances).await?;
    Ok(StepOutcome::Done)
}

async fn save_interaction_model<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let request = SaveRequest::new(
        "Failed to save Alexa interaction model",
        session.profile.build_timeout(),
    )
    .loading("Building interaction model, please wait...")
    .success("Successfully saved Alexa interaction model!");
    save_and_wait(page, &request).await?;
    Ok(StepOutcome::Done)
}

// ============================================================================
// Endpoint
// ============================================================================

async fn configure_endpoint<P: Portal + ?Sized>(
    page: &PageDriver<'_, P>,
    session: &mut Session,
) -> DriverResult<StepOutcome> {
    let portal = page.portal();

    portal.next_tab().await?;
    page.require(
        "endpoint configuration",
        page.timings().ui_timeout,
        move || portal.endpoint_form_ready(),
    )
    .await?;

    let Some(endpoint) = &session.profile.endpoint else {
        let url = portal.current_url().await.unwrap_or_default();
        warn!(
            "No endpoint in the publish profile, configure it manually at {}",
            url
        );
        return Ok(StepOutcome::skipped("no endpoint configured"));
    };

    portal.select_endpoint_type(endpoint.kind).await?;
    portal.select_default_region().await?;
    portal.set_endpoint_location(&endpoint.location).await?;

    let request = SaveRequest::new(
        "Failed to save endpoint configuration",
        page.timings().save_timeout,
    )
    .loading("Saving endpoint configuration, please wait...")
    .success(format!(
        "Successfully configured endpoint to {}: {}",
        endpoint.kind.label(),
        endpoint.location
    ));
    save_and_wait(page, &request).await?;
    Ok(StepOutcome::Done)
}

// ============================================================================
// Wrap-up
// ============================================================================

async fn record_application_id(session: &mut Session) -> DriverResult<StepOutcome> {
    let application_id = session.application_id().ok_or_else(|| {
        DriverError::PortalInteraction("No application id was assigned to the skill".into())
    })?;

    let path = &session.profile.skill_config_file_path;
    let record = SkillConfigRecord::merge_into_file(
        path,
        SkillConfigRecord::with_application_id(application_id),
    )?;
    info!(
        "Skill configuration written to {} (applicationId {})",
        path.display(),
        record.application_id().unwrap_or("<none>")
    );
    Ok(StepOutcome::Done)
}

async fn summarize(session: &mut Session) -> DriverResult<StepOutcome> {
    let summary = PublishSummary::from_session(session);
    println!("{}", summary);
    Ok(StepOutcome::Done)
}
