//! Failures that decide the orchestrator's exit code

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    /// Bad invocation or missing configuration
    #[error("{0}")]
    Usage(String),

    /// The driver exited unsuccessfully
    #[error("Alexa Skill deployment failed")]
    DeploymentFailed { code: Option<i32> },

    #[error("{0}")]
    Lambda(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 400,
            CliError::DeploymentFailed { .. } | CliError::Lambda(_) => 500,
        }
    }

    /// Code for an error surfaced from a command
    pub fn exit_code_of(err: &anyhow::Error) -> i32 {
        match err.downcast_ref::<CliError>() {
            Some(cli) => cli.exit_code(),
            None => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let usage: anyhow::Error = CliError::Usage("missing".into()).into();
        assert_eq!(CliError::exit_code_of(&usage), 400);

        let failed: anyhow::Error = CliError::DeploymentFailed { code: Some(401) }.into();
        assert_eq!(CliError::exit_code_of(&failed), 500);
        assert_eq!(failed.to_string(), "Alexa Skill deployment failed");

        let other = anyhow::anyhow!("disk full");
        assert_eq!(CliError::exit_code_of(&other), 500);
    }
}
