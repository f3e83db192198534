//! `sutr configure`: credentials wizard and publish profile generator

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::debug;

use sutr_common::profile::{DEFAULT_BUILD_MODEL_TIMEOUT_MS, DEFAULT_TOOL_NAME};
use sutr_common::{EndpointDescriptor, EndpointType, PublishProfile, SkillType};

use super::prompt::{input_valid, Prompt, TerminalPrompt};
use crate::aws::{AwsCli, LambdaApi, NewFunction};
use crate::config::{Credentials, CredentialsStore, DEFAULT_ENVIRONMENT};
use crate::error::CliError;
use crate::lambda;
use crate::output;
use crate::secret;

/// Directory of generated publish profiles, relative to the project
pub const PROFILES_DIR: &str = "deployment/profiles";

const HTTPS_PLACEHOLDER: &str = "<your endpoint here>";

#[derive(Args)]
pub struct ConfigureArgs {
    /// Credential environment to configure
    #[arg(long, default_value = DEFAULT_ENVIRONMENT)]
    pub env: String,
}

pub async fn execute(args: ConfigureArgs) -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;
    let wizard = Wizard {
        store_path: CredentialsStore::default_path(),
        project_dir,
        env: args.env,
    };
    wizard.run(&mut TerminalPrompt, &AwsCli::default()).await?;
    Ok(())
}

/// Answers of the profile step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileAnswers {
    pub profile_name: String,
    pub skill_name: String,
    pub invocation_name: String,
    pub lambda_arn: Option<String>,
}

pub struct Wizard {
    pub store_path: PathBuf,
    pub project_dir: PathBuf,
    pub env: String,
}

impl Wizard {
    /// Run all steps; returns the generated profile path, if any
    pub async fn run(
        &self,
        prompt: &mut dyn Prompt,
        aws: &dyn LambdaApi,
    ) -> anyhow::Result<Option<PathBuf>> {
        let mut store = CredentialsStore::load(&self.store_path)
            .with_context(|| format!("Error loading {}", self.store_path.display()))?;
        let creds = store.environment_mut(&self.env);

        output::print_title("Step 1. Skills Deployment Authorization");
        ask_portal_login(prompt, creds)?;

        output::print_title("Step 2. AWS Lambda Authorization");
        ask_aws(prompt, creds)?;

        let creds = creds.clone();
        store.save(&self.store_path)?;
        output::print_success(&format!(
            "Credentials for \"{}\" saved to {}",
            self.env,
            self.store_path.display()
        ));

        output::print_title("Step 3. Create a Publish Profile");
        let profile_name = prompt.input("Profile name (blank to skip)", None)?;
        if profile_name.is_empty() {
            output::print_comment("Skipping publish profile creation.");
            return Ok(None);
        }
        if !is_profile_name(&profile_name) {
            return Err(CliError::Usage(format!(
                "Invalid profile name \"{}\": use letters, digits, '-' and '_'",
                profile_name
            ))
            .into());
        }

        let answers = self
            .ask_profile(prompt, aws, &creds, profile_name)
            .await?;
        let path = self.write_profile(&answers)?;
        output::print_success(&format!(
            "Publish profile successfully created: {}",
            path.display()
        ));
        Ok(Some(path))
    }

    async fn ask_profile(
        &self,
        prompt: &mut dyn Prompt,
        aws: &dyn LambdaApi,
        creds: &Credentials,
        profile_name: String,
    ) -> anyhow::Result<ProfileAnswers> {
        let skill_name = input_valid(
            prompt,
            "Skill name",
            None,
            "Skill names may contain only letters and spaces",
            is_spoken_name,
        )?;
        let invocation_name = input_valid(
            prompt,
            "Skill invocation name",
            Some(&skill_name.to_lowercase()),
            "Invocation names may contain only letters and spaces",
            is_spoken_name,
        )?;
        let function = input_valid(
            prompt,
            "Lambda function name (blank for an HTTPS endpoint)",
            None,
            "Function names may contain only letters, '-' and '_'",
            |s| s.is_empty() || is_function_name(s),
        )?;

        let lambda_arn = if function.is_empty() {
            None
        } else {
            Some(find_or_create_function(prompt, aws, creds, &function).await?)
        };

        Ok(ProfileAnswers {
            profile_name,
            skill_name,
            invocation_name,
            lambda_arn,
        })
    }

    fn write_profile(&self, answers: &ProfileAnswers) -> anyhow::Result<PathBuf> {
        let path = self
            .project_dir
            .join(PROFILES_DIR)
            .join(format!("{}.json", answers.profile_name));
        if path.exists() {
            output::print_warning(&format!("Overwriting {}", path.display()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let profile = generate_profile(&self.env, answers);
        std::fs::write(&path, serde_json::to_string_pretty(&profile)?)?;
        Ok(path)
    }
}

fn ask_portal_login(prompt: &mut dyn Prompt, creds: &mut Credentials) -> anyhow::Result<()> {
    let email = prompt.input("Email", creds.skills_access_key_id.as_deref())?;
    if !email.is_empty() {
        creds.skills_access_key_id = Some(email);
    }

    let label = if creds.skills_secret_access_key.is_some() {
        "Password [*****]"
    } else {
        "Password"
    };
    let password = prompt.secret(label)?;
    if !password.is_empty() {
        creds.skills_secret_access_key = Some(secret::obscure(&password)?);
    }
    Ok(())
}

fn ask_aws(prompt: &mut dyn Prompt, creds: &mut Credentials) -> anyhow::Result<()> {
    let key_id = prompt.input("AWS access key id", creds.aws_access_key_id.as_deref())?;
    if !key_id.is_empty() {
        creds.aws_access_key_id = Some(key_id);
    }

    let label = if creds.aws_secret_access_key.is_some() {
        "AWS secret access key [*****]"
    } else {
        "AWS secret access key"
    };
    let secret_key = prompt.secret(label)?;
    if !secret_key.is_empty() {
        creds.aws_secret_access_key = Some(secret_key);
    }

    creds.region = prompt.input("AWS region", Some(creds.region.as_str()))?;

    let role = prompt.input(
        "AWS lambda execution role",
        creds.aws_lambda_execution_role.as_deref(),
    )?;
    if !role.is_empty() {
        creds.aws_lambda_execution_role = Some(role);
    }
    Ok(())
}

/// Look up `name`, creating a starter function when it does not exist
async fn find_or_create_function(
    prompt: &mut dyn Prompt,
    aws: &dyn LambdaApi,
    creds: &Credentials,
    name: &str,
) -> anyhow::Result<String> {
    if !creds.has_aws() {
        return Err(CliError::Usage(
            "AWS credentials are required to use a lambda function endpoint".into(),
        )
        .into());
    }
    aws.configure(creds).await?;

    if let Some(arn) = aws.get_function_arn(name).await? {
        output::print_info(&format!("Using existing lambda function {}", arn));
        return Ok(arn);
    }

    output::print_info(&format!(
        "Lambda function \"{}\" does not exist and will be created",
        name
    ));
    let description = prompt.input("Function description", Some(name))?;
    let role = input_valid(
        prompt,
        "Execution role ARN",
        creds.aws_lambda_execution_role.as_deref(),
        "An execution role is required",
        |s| !s.is_empty(),
    )?;
    let runtime_hint = format!("Choose one of: {}", lambda::RUNTIMES.join(", "));
    let runtime = input_valid(
        prompt,
        "Runtime",
        Some(lambda::DEFAULT_RUNTIME),
        &runtime_hint,
        |s| lambda::RUNTIMES.contains(&s),
    )?;

    let workdir = tempfile::tempdir()?;
    let zip_path = workdir.path().join("starter.zip");
    lambda::starter_package(&runtime, &zip_path)?;

    let arn = aws
        .create_function(&NewFunction {
            name,
            runtime: &runtime,
            role: &role,
            description: &description,
            zip_file: &zip_path,
        })
        .await?;
    debug!("Created {}", arn);
    aws.allow_skill_invocation(name).await?;
    output::print_success(&format!("Created lambda function {}", arn));
    Ok(arn)
}

/// Profile written by the wizard; paths stay relative to the project
pub fn generate_profile(env: &str, answers: &ProfileAnswers) -> PublishProfile {
    let endpoint = match &answers.lambda_arn {
        Some(arn) => EndpointDescriptor {
            kind: EndpointType::Lambda,
            location: arn.clone(),
        },
        None => EndpointDescriptor {
            kind: EndpointType::Https,
            location: HTTPS_PLACEHOLDER.to_string(),
        },
    };
    PublishProfile {
        environment: Some(env.to_string()),
        tool_name: DEFAULT_TOOL_NAME.to_string(),
        skill_name: answers.skill_name.clone(),
        skill_invocation_name: answers.invocation_name.clone(),
        skill_type: SkillType::Custom,
        uses_audio_player: false,
        company_name: None,
        skill_output_directory: PathBuf::from("./deployment/ask"),
        skill_config_file_path: PathBuf::from("./lambda/config.json"),
        source_directory: PathBuf::from("./lambda"),
        build_model_timeout: DEFAULT_BUILD_MODEL_TIMEOUT_MS,
        endpoint: Some(endpoint),
    }
}

fn is_profile_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_spoken_name(s: &str) -> bool {
    !s.trim().is_empty() && s.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

fn is_function_name(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_')
}

/// Resolve `--profile`: a bare name refers to the profiles directory
pub fn profile_path(project_dir: &Path, profile: &str) -> PathBuf {
    let given = Path::new(profile);
    if given.extension().is_none() && given.components().count() == 1 {
        project_dir.join(PROFILES_DIR).join(format!("{}.json", profile))
    } else if given.is_absolute() {
        given.to_path_buf()
    } else {
        project_dir.join(given)
    }
}
