//! Lambda operations through the `aws` command line tool
//!
//! The deployment API itself is left to the `aws` CLI. Credentials are
//! written to a dedicated named profile so the user's own profiles stay
//! untouched.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::config::Credentials;
use crate::error::CliError;

/// Named `aws` profile owned by sutr
pub const AWS_PROFILE: &str = "sutr";

/// Principal that invokes skill lambdas
pub const SKILLS_PRINCIPAL: &str = "alexa-appkit.amazon.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FunctionConfiguration {
    function_arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetFunctionOutput {
    configuration: FunctionConfiguration,
}

/// Parameters of a new lambda function
#[derive(Debug, Clone)]
pub struct NewFunction<'a> {
    pub name: &'a str,
    pub runtime: &'a str,
    pub role: &'a str,
    pub description: &'a str,
    pub zip_file: &'a Path,
}

/// Lambda operations used by configure and publish
#[async_trait]
pub trait LambdaApi: Send + Sync {
    /// Store the credentials in the sutr profile
    async fn configure(&self, creds: &Credentials) -> anyhow::Result<()>;

    /// ARN of an existing function, `None` when it does not exist
    async fn get_function_arn(&self, name: &str) -> anyhow::Result<Option<String>>;

    /// Create a function and return its ARN
    async fn create_function(&self, function: &NewFunction<'_>) -> anyhow::Result<String>;

    /// Allow the skills service to invoke the function
    async fn allow_skill_invocation(&self, name: &str) -> anyhow::Result<()>;

    async fn update_function_code(&self, name: &str, zip_file: &Path) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
}

impl Default for AwsCli {
    fn default() -> Self {
        Self::new("aws")
    }
}

impl AwsCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn output(&self, args: &[String]) -> anyhow::Result<std::process::Output> {
        debug!("Running {} {}", self.program, redact(args).join(" "));
        Command::new(&self.program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run {}; is the AWS CLI installed?", self.program))
    }

    /// Run and require success, returning stdout
    async fn run(&self, args: &[String]) -> anyhow::Result<String> {
        let output = self.output(args).await?;
        if !output.status.success() {
            let shown = match args.first().map(String::as_str) {
                Some("--profile") => args.get(2..).unwrap_or_default(),
                _ => args,
            };
            return Err(CliError::Lambda(format!(
                "{} {} failed: {}",
                self.program,
                shown.iter().take(2).cloned().collect::<Vec<_>>().join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl LambdaApi for AwsCli {
    async fn configure(&self, creds: &Credentials) -> anyhow::Result<()> {
        for args in configure_args(creds)? {
            self.run(&args).await?;
        }
        Ok(())
    }

    async fn get_function_arn(&self, name: &str) -> anyhow::Result<Option<String>> {
        let output = self
            .output(&profile_args(&["lambda", "get-function", "--function-name", name]))
            .await?;
        if !output.status.success() {
            debug!(
                "get-function {} failed: {}",
                name,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }
        let parsed: GetFunctionOutput = serde_json::from_slice(&output.stdout)
            .context("Unexpected output from aws lambda get-function")?;
        Ok(Some(parsed.configuration.function_arn))
    }

    async fn create_function(&self, function: &NewFunction<'_>) -> anyhow::Result<String> {
        let zip = format!("fileb://{}", function.zip_file.display());
        let stdout = self
            .run(&profile_args(&[
                "lambda",
                "create-function",
                "--function-name",
                function.name,
                "--runtime",
                function.runtime,
                "--handler",
                "index.handler",
                "--role",
                function.role,
                "--zip-file",
                &zip,
                "--description",
                function.description,
            ]))
            .await?;
        let created: FunctionConfiguration = serde_json::from_str(&stdout)
            .context("Unexpected output from aws lambda create-function")?;
        Ok(created.function_arn)
    }

    async fn allow_skill_invocation(&self, name: &str) -> anyhow::Result<()> {
        let statement_id = chrono::Utc::now().timestamp_millis().to_string();
        self.run(&profile_args(&[
            "lambda",
            "add-permission",
            "--function-name",
            name,
            "--statement-id",
            &statement_id,
            "--action",
            "lambda:InvokeFunction",
            "--principal",
            SKILLS_PRINCIPAL,
        ]))
        .await?;
        Ok(())
    }

    async fn update_function_code(&self, name: &str, zip_file: &Path) -> anyhow::Result<()> {
        let zip = format!("fileb://{}", zip_file.display());
        self.run(&profile_args(&[
            "lambda",
            "update-function-code",
            "--function-name",
            name,
            "--zip-file",
            &zip,
        ]))
        .await?;
        Ok(())
    }
}

fn profile_args(args: &[&str]) -> Vec<String> {
    let mut all = vec!["--profile".to_string(), AWS_PROFILE.to_string()];
    all.extend(args.iter().map(|a| a.to_string()));
    all
}

fn configure_args(creds: &Credentials) -> Result<Vec<Vec<String>>, CliError> {
    let (Some(key_id), Some(secret)) = (&creds.aws_access_key_id, &creds.aws_secret_access_key)
    else {
        return Err(CliError::Usage(
            "Configuration missing. Please call sutr configure to enable publishing".into(),
        ));
    };
    let set = |key: &str, value: &str| {
        vec![
            "configure".to_string(),
            "set".to_string(),
            key.to_string(),
            value.to_string(),
            "--profile".to_string(),
            AWS_PROFILE.to_string(),
        ]
    };
    Ok(vec![
        set("aws_access_key_id", key_id),
        set("aws_secret_access_key", secret),
        set("output", "json"),
        set("region", &creds.region),
    ])
}

/// Hide secret values in logged command lines
fn redact(args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut hide_next = false;
    for arg in args {
        if hide_next {
            out.push("*****".to_string());
            hide_next = false;
        } else {
            hide_next = arg == "aws_secret_access_key";
            out.push(arg.clone());
        }
    }
    out
}
