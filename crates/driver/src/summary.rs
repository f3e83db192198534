//! Final report printed after a successful publish

use colored::Colorize;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct PublishSummary {
    pub skill_name: String,
    pub invocation_name: String,
    pub application_id: Option<String>,
    pub endpoint: Option<String>,
    pub skill_config_file: PathBuf,
}

impl PublishSummary {
    pub fn from_session(session: &Session) -> Self {
        let profile = &session.profile;
        Self {
            skill_name: profile.skill_name.clone(),
            invocation_name: profile.skill_invocation_name.clone(),
            application_id: session.application_id().map(str::to_string),
            endpoint: profile
                .endpoint
                .as_ref()
                .map(|e| format!("{} {}", e.kind.label(), e.location)),
            skill_config_file: profile.skill_config_file_path.clone(),
        }
    }
}

impl fmt::Display for PublishSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} Published skill \"{}\"",
            "✓".green().bold(),
            self.skill_name.bold()
        )?;
        writeln!(f, "  Invocation name: {}", self.invocation_name)?;
        writeln!(
            f,
            "  Application id:  {}",
            self.application_id.as_deref().unwrap_or("-")
        )?;
        writeln!(
            f,
            "  Endpoint:        {}",
            self.endpoint
                .as_deref()
                .map(|e| e.normal())
                .unwrap_or_else(|| "not configured".yellow())
        )?;
        write!(f, "  Skill config:    {}", self.skill_config_file.display())
    }
}
