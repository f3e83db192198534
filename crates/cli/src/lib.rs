//! Sutr CLI
//!
//! Orchestrator for publishing a skill: stores credentials, generates
//! publish profiles, runs the automation driver and uploads lambda code.

pub mod aws;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod lambda;
pub mod output;
pub mod secret;

pub use error::CliError;
