//! Sutr Automation Driver - Main Entry Point
//!
//! Reads a publish payload from stdin, drives the developer portal through a
//! WebDriver server and exits with the code of the first failure.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use sutr_common::DriverPayload;
use sutr_driver::health::wait_for_webdriver;
use sutr_driver::{
    DriverError, DriverResult, Pipeline, ScreenshotStore, Session, Timings, WebDriverPortal,
};

/// Sutr automation driver
#[derive(Parser)]
#[command(name = "sutr-driver")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read the payload from a file instead of stdin
    #[arg(long)]
    payload: Option<PathBuf>,

    /// WebDriver server URL (overrides the payload)
    #[arg(long, env = "SUTR_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Seconds to wait for the WebDriver server to come up
    #[arg(long, default_value_t = 30)]
    webdriver_timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let code = match run(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(args: Args) -> DriverResult<()> {
    let mut payload = read_payload(args.payload.as_deref()).await?;
    if let Some(url) = args.webdriver_url {
        payload.browser.webdriver_url = url;
    }
    let browser = payload.browser.clone();

    let mut session = Session::from_payload(payload);
    let screenshots = ScreenshotStore::for_output_dir(&session.profile.skill_output_directory);
    screenshots.reset()?;

    wait_for_webdriver(
        &browser.webdriver_url,
        Duration::from_secs(args.webdriver_timeout),
    )
    .await?;
    let portal = WebDriverPortal::connect(&browser).await?;

    let pipeline = Pipeline::new(&portal, &screenshots, Timings::default());
    let result = tokio::select! {
        result = pipeline.run(&mut session) => result,
        _ = shutdown_signal() => {
            Err(DriverError::PortalInteraction("Publish interrupted".to_string()))
        }
    };

    if let Err(e) = portal.close().await {
        warn!("Failed to close browser session: {}", e);
    }

    let report = result?;
    info!("Run time: {}ms", report.elapsed.as_millis());
    Ok(())
}

async fn read_payload(path: Option<&Path>) -> DriverResult<DriverPayload> {
    let bytes = match path {
        Some(path) => tokio::fs::read(path).await?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };
    Ok(DriverPayload::from_slice(&bytes)?)
}

/// Resolves on Ctrl-C or SIGTERM (sent by the orchestrator)
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown requested, closing browser session");
}
