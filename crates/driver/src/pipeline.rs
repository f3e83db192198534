//! Step sequencing
//!
//! Runs the catalog in order against one session. The first failing step
//! stops the run; its screenshot goes to `errors/` and the error is returned
//! to the caller unchanged.

use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::artifacts::ScreenshotStore;
use crate::error::DriverResult;
use crate::page::PageDriver;
use crate::portal::Portal;
use crate::session::Session;
use crate::steps::{Step, StepOutcome};
use crate::wait::Timings;

/// Record of one executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub steps: Vec<StepRecord>,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }
}

pub struct Pipeline<'a, P: Portal + ?Sized> {
    page: PageDriver<'a, P>,
    steps: Vec<Step>,
}

impl<'a, P: Portal + ?Sized> Pipeline<'a, P> {
    /// Pipeline running the full catalog
    pub fn new(portal: &'a P, screenshots: &'a ScreenshotStore, timings: Timings) -> Self {
        Self {
            page: PageDriver::new(portal, screenshots, timings),
            steps: Step::ALL.to_vec(),
        }
    }

    /// Restrict the run to a subset of steps, kept in the given order
    pub fn with_steps(mut self, steps: &[Step]) -> Self {
        self.steps = steps.to_vec();
        self
    }

    pub async fn run(&self, session: &mut Session) -> DriverResult<PipelineReport> {
        let started = Instant::now();
        let mut records = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            debug!("Running step {}", step);
            match step.run(&self.page, session).await {
                Ok(outcome) => {
                    if let StepOutcome::Skipped(reason) = &outcome {
                        debug!("Skipped step {}: {}", step, reason);
                    }
                    records.push(StepRecord {
                        step: *step,
                        outcome,
                    });
                }
                Err(e) => {
                    error!("Step {} failed: {}", step, e);
                    self.page.capture_error().await;
                    return Err(e);
                }
            }
        }

        self.page.capture_final().await;
        let elapsed = started.elapsed();
        info!("Publish completed in {:.1}s", elapsed.as_secs_f64());
        Ok(PipelineReport {
            steps: records,
            elapsed,
        })
    }
}
