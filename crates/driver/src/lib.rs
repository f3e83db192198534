//! Sutr Automation Driver
//!
//! Publishes a skill through the developer portal by scripting a browser
//! session. The orchestrator writes one [`DriverPayload`] to the driver's
//! stdin; the driver runs the publish pipeline and exits with a code from
//! the error taxonomy (0 on success).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Pipeline                                                   │
//! │    └── Step::ALL, in order, over one Session               │
//! │          open-entry-page → resume-session → sign-in        │
//! │          → select-company → open-skills-kit                │
//! │          → remove-existing-skill → create-skill            │
//! │          → upload-intents → upload-slot-types              │
//! │          → upload-utterances → save-interaction-model      │
//! │          → configure-endpoint → record-application-id      │
//! │          → summarize                                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PageDriver   waits (poll_until), timeout screenshots      │
//! │  save_and_wait  shared save/confirm/loading/status cycle   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Portal (trait)                                            │
//! │    └── WebDriverPortal: selectors and page scripts         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`DriverPayload`]: sutr_common::DriverPayload

pub mod artifacts;
pub mod auth;
pub mod cookies;
pub mod error;
pub mod health;
pub mod page;
pub mod pipeline;
pub mod portal;
pub mod save;
pub mod session;
pub mod steps;
pub mod summary;
pub mod wait;
pub mod webdriver;

pub use artifacts::{CaptureKind, ScreenshotStore};
pub use cookies::{CookieJar, StoredCookie};
pub use error::{DriverError, DriverResult};
pub use page::PageDriver;
pub use pipeline::{Pipeline, PipelineReport, StepRecord};
pub use portal::{Portal, PortalStatus, SkillInfo};
pub use save::{save_and_wait, SaveRequest};
pub use session::Session;
pub use steps::{Step, StepOutcome};
pub use summary::PublishSummary;
pub use wait::{poll_until, Timings};
pub use webdriver::WebDriverPortal;
