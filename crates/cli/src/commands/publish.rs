//! `sutr publish`: skills phase then lambda phase

use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

use sutr_common::{BrowserOptions, DriverPayload, PublishProfile};

use super::configure::profile_path;
use crate::aws::{AwsCli, LambdaApi};
use crate::config::{Credentials, CredentialsStore, DEFAULT_ENVIRONMENT};
use crate::driver::{self, DriverProcess};
use crate::error::CliError;
use crate::lambda;
use crate::output;

#[derive(Args)]
pub struct PublishArgs {
    /// Publish profile: a name under deployment/profiles or a path
    #[arg(short, long)]
    pub profile: String,

    /// Publish the skill through the developer portal
    #[arg(long)]
    pub skills: bool,

    /// Upload the lambda code
    #[arg(long)]
    pub lambda: bool,

    /// Credential environment (defaults to the profile's)
    #[arg(long)]
    pub env: Option<String>,

    /// Path of the sutr-driver executable
    #[arg(long, env = "SUTR_DRIVER_BIN")]
    pub driver_bin: Option<PathBuf>,

    /// WebDriver server URL
    #[arg(long, env = "SUTR_WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

pub async fn execute(args: PublishArgs, verbose: bool) -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;
    let store = CredentialsStore::load(&CredentialsStore::default_path())?;
    let driver = DriverProcess::new(driver::locate(args.driver_bin.as_deref()), verbose);
    publish(&args, &project_dir, &store, &driver, &AwsCli::default()).await
}

/// Skills driver seam
#[async_trait::async_trait]
pub trait SkillPublisher: Send + Sync {
    async fn publish(&self, payload: &DriverPayload) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl SkillPublisher for DriverProcess {
    async fn publish(&self, payload: &DriverPayload) -> anyhow::Result<()> {
        DriverProcess::publish(self, payload).await
    }
}

pub async fn publish(
    args: &PublishArgs,
    project_dir: &Path,
    store: &CredentialsStore,
    skills: &dyn SkillPublisher,
    aws: &dyn LambdaApi,
) -> anyhow::Result<()> {
    let path = profile_path(project_dir, &args.profile);
    let profile = PublishProfile::load(&path, project_dir)
        .map_err(|e| CliError::Usage(format!("Error loading profile: {}", e)))?;

    let env = args
        .env
        .clone()
        .or_else(|| profile.environment.clone())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
    let creds = store.environment(&env).ok_or_else(|| {
        CliError::Usage(
            "Configuration missing. Please call sutr configure to enable publishing".into(),
        )
    })?;
    creds.require(args.skills, args.lambda)?;
    info!("Publishing {} with \"{}\" credentials", path.display(), env);

    if args.skills {
        let payload = payload(args, &path, profile.clone(), creds)?;
        skills.publish(&payload).await?;
    } else {
        output::print_comment(
            "Skipping publish of skills.  Include --skills command line argument to publish skills",
        );
    }

    if args.lambda {
        lambda::deploy(aws, &profile, creds, project_dir).await?;
    } else {
        output::print_comment(
            "Skipping publish of lambda.  Include --lambda command line argument to publish lambda code",
        );
    }
    Ok(())
}

fn payload(
    args: &PublishArgs,
    path: &Path,
    profile: PublishProfile,
    creds: &Credentials,
) -> anyhow::Result<DriverPayload> {
    let (username, password) = creds.portal_login()?;
    let mut browser = BrowserOptions {
        headless: !args.headed,
        ..Default::default()
    };
    if let Some(url) = &args.webdriver_url {
        browser.webdriver_url = url.clone();
    }
    Ok(DriverPayload {
        profile_name: path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned()),
        profile,
        username,
        password,
        skills: args.skills,
        lambda: args.lambda,
        browser,
    })
}
