//! Service-control boundary.
//!
//! Mode changes are applied by running an ordered sequence of OS
//! service-control commands. The executor is deliberately best-effort: a
//! failing step is logged and the remaining steps still run, and the caller
//! gets the full per-step status list rather than a single aggregate.

use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::{debug, error};

/// One service-control invocation, e.g. `sudo service hostapd start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCommand(pub Vec<String>);

impl ServiceCommand {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn display(&self) -> String {
        self.0.join(" ")
    }
}

/// Result of one step of a service sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failed(String),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success)
    }
}

/// Status of one attempted step, kept in sequence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatus {
    pub command: ServiceCommand,
    pub outcome: StepOutcome,
}

/// Executes a single service-control command. The production impl shells
/// out; tests substitute a scripted fake.
pub trait ServiceRunner {
    fn run_step(&mut self, command: &ServiceCommand) -> StepOutcome;
}

/// Runs `sequence` in order, never stopping early. Failures are logged and
/// recorded; every step is attempted exactly once.
pub fn run_sequence<R: ServiceRunner>(
    runner: &mut R,
    sequence: &[ServiceCommand],
) -> Vec<StepStatus> {
    let mut statuses = Vec::with_capacity(sequence.len());

    for command in sequence {
        let outcome = runner.run_step(command);
        match &outcome {
            StepOutcome::Success => debug!("{} - exit status 0", command.display()),
            StepOutcome::Failed(reason) => error!("{} - {}", command.display(), reason),
        }
        statuses.push(StepStatus {
            command: command.clone(),
            outcome,
        });
    }

    statuses
}

/// Production runner backed by `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ServiceRunner for SystemRunner {
    fn run_step(&mut self, command: &ServiceCommand) -> StepOutcome {
        let Some((program, args)) = command.0.split_first() else {
            return StepOutcome::Failed("empty command".to_string());
        };

        match Command::new(program).args(args).status() {
            Ok(status) if status.success() => StepOutcome::Success,
            Ok(status) => StepOutcome::Failed(match status.code() {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            }),
            Err(e) => StepOutcome::Failed(format!("failed to spawn: {e}")),
        }
    }
}
