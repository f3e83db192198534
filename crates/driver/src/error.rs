//! Error types for the automation driver

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PortalInteraction(String),

    #[error("{}", ambiguous_account_message(.companies))]
    AmbiguousAccount { companies: Vec<String> },

    #[error("WebDriver not reachable at {url} after {attempts} attempts")]
    WebDriverUnavailable { url: String, attempts: usize },

    #[error("Browser error: {0}")]
    Browser(#[from] fantoccini::error::CmdError),

    #[error("Failed to start browser session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DriverResult<T> = Result<T, DriverError>;

impl DriverError {
    /// Exit code reported to the orchestrator
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::Authentication(_) => 401,
            DriverError::Configuration(_) | DriverError::AmbiguousAccount { .. } => 400,
            DriverError::NotFound(_) => 404,
            DriverError::PortalInteraction(_)
            | DriverError::WebDriverUnavailable { .. }
            | DriverError::Browser(_)
            | DriverError::Session(_)
            | DriverError::Http(_)
            | DriverError::Io(_)
            | DriverError::Json(_) => 500,
        }
    }

    /// Portal failure with the conventional "Reason:" suffix
    pub fn portal(failure: &str, reason: &str) -> Self {
        DriverError::PortalInteraction(format!("{}\nReason: {}", failure, reason))
    }
}

impl From<sutr_common::Error> for DriverError {
    fn from(e: sutr_common::Error) -> Self {
        match e.exit_code() {
            404 => DriverError::NotFound(e.to_string()),
            400 => DriverError::Configuration(e.to_string()),
            _ => match e {
                sutr_common::Error::Io(io) => DriverError::Io(io),
                other => DriverError::PortalInteraction(other.to_string()),
            },
        }
    }
}

fn ambiguous_account_message(companies: &[String]) -> String {
    let choices: Vec<String> = companies.iter().map(|c| format!("  - {}", c)).collect();
    format!(
        "You belong to more than one company!\r\n\
         Please indicate which company you wish to publish your skill to by configuring \
         the \"companyName\" setting of your publish profile to be one of the following: \r\n{}",
        choices.join("\r\n")
    )
}
