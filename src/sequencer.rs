use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::command::{self, Action, Command};
use crate::config::Config;
use crate::log::ActivityLog;
use crate::store::{RemoteStore, StoreError};

/// Upper bound on a single movement wait, in seconds.
/// `Duration::from_secs_f64` requires a finite, in-range argument.
const MAX_MOVE_SECS: f64 = 86_400.0;

/// Errors that abort a command run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("timed out waiting for heading completion after {attempts} polls")]
    HeadingTimeout { attempts: u32 },
}

/// Terminal result of one submission
#[derive(Debug)]
pub enum ExecutionOutcome {
    Completed,
    Failed {
        error: RunError,
        /// Whether the emergency stop write after the failure landed
        emergency_stop_sent: bool,
    },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed)
    }
}

/// Suspension source — allows deterministic testing without real delays
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the tokio timer
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Walks a parsed command list and drives the remote store.
///
/// One sequencer runs one submission at a time: `run` takes `&mut self`,
/// so overlapping runs on the same sequencer cannot compile.
pub struct Sequencer<S: RemoteStore, C: Clock> {
    store: S,
    clock: C,
    config: Config,
    log: ActivityLog,
}

impl<S: RemoteStore, C: Clock> Sequencer<S, C> {
    pub fn new(store: S, clock: C, config: Config) -> Self {
        Self {
            store,
            clock,
            config,
            log: ActivityLog::new(),
        }
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// Parse an operator string and execute it
    pub async fn submit(&mut self, raw: &str) -> ExecutionOutcome {
        let commands = command::parse(raw);
        self.run(&commands).await
    }

    /// Execute a command list in order, ending with an unconditional Stop.
    ///
    /// Any failure aborts the remaining commands, triggers one emergency
    /// Stop write, and yields a Failed outcome carrying the original error.
    pub async fn run(&mut self, commands: &[Command]) -> ExecutionOutcome {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, commands = commands.len(), "starting run");

        // Log the full plan up front so the operator sees it even if
        // execution aborts partway.
        self.log.clear();
        for cmd in commands {
            self.log.append_command(cmd.describe());
        }

        match self.execute_all(commands).await {
            Ok(()) => {
                info!(run_id = %run_id, "run completed");
                ExecutionOutcome::Completed
            }
            Err(run_error) => {
                error!(run_id = %run_id, error = %run_error, "run failed");
                self.log
                    .append_response("Execution error", &json!(run_error.to_string()), true);

                let emergency_stop_sent = match self.send_stop().await {
                    Ok(response) => {
                        self.log.append_response("Emergency STOP sent", &response, false);
                        true
                    }
                    Err(stop_error) => {
                        // Secondary failure: logged, never masks the original
                        warn!(error = %stop_error, "emergency STOP failed");
                        self.log.append_response(
                            "Emergency STOP failed",
                            &json!(stop_error.to_string()),
                            true,
                        );
                        false
                    }
                };

                ExecutionOutcome::Failed {
                    error: run_error,
                    emergency_stop_sent,
                }
            }
        }
    }

    /// Issue the unconditional safety Stop at program start.
    /// Failure is logged but not escalated.
    pub async fn startup_stop(&mut self) {
        match self.send_stop().await {
            Ok(response) => {
                self.log.append_response("Initial STOP sent", &response, false);
            }
            Err(e) => {
                warn!(error = %e, "initial STOP failed");
                self.log
                    .append_response("Initial STOP failed", &json!(e.to_string()), true);
            }
        }
    }

    /// Latest action/target/compass values, for the operator status view.
    /// Read errors are returned per variable, not escalated.
    pub async fn read_status(&self) -> Vec<(String, Result<Option<f64>, StoreError>)> {
        let mut readings = Vec::new();
        for variable in [
            &self.config.action_label,
            &self.config.target_label,
            &self.config.compass_label,
        ] {
            let result = self.store.read_latest(variable).await;
            readings.push((variable.clone(), result));
        }
        readings
    }

    async fn execute_all(&mut self, commands: &[Command]) -> Result<(), RunError> {
        for cmd in commands {
            match cmd.action {
                Action::Heading => self.dispatch_heading(cmd.value).await?,
                action => {
                    let response = self
                        .store
                        .write_latest(&self.config.action_label, action.code())
                        .await?;
                    self.log.append_response(
                        &format!("Command {}{} executed", action.letter(), cmd.value),
                        &response,
                        false,
                    );
                    if action.is_movement() {
                        // The device has no duration parameter; "drive for N
                        // seconds" is a client-side wait before the next write.
                        let secs = if cmd.value.is_finite() {
                            cmd.value.clamp(0.0, MAX_MOVE_SECS)
                        } else {
                            0.0
                        };
                        self.clock.sleep(Duration::from_secs_f64(secs)).await;
                    }
                }
            }
        }

        // Unconditional trailing Stop, even when the last command was Stop
        let response = self.send_stop().await?;
        self.log.append_response("Final STOP sent", &response, false);
        Ok(())
    }

    /// Write the heading target, issue the turn command, then block until
    /// the device resets `target` to -1 or the poll budget runs out.
    async fn dispatch_heading(&mut self, value: f64) -> Result<(), RunError> {
        let angle = if (0.0..=359.0).contains(&value) {
            value
        } else {
            -1.0
        };

        self.store
            .write_latest(&self.config.target_label, angle)
            .await?;
        let response = self
            .store
            .write_latest(&self.config.action_label, Action::Heading.code())
            .await?;
        self.log.append_response(
            &format!("Command H{} executed", angle),
            &response,
            false,
        );

        self.wait_for_heading().await
    }

    async fn wait_for_heading(&mut self) -> Result<(), RunError> {
        self.log
            .append_response("Waiting for the rover to finish turning", &Value::Null, false);

        let max_attempts = self.config.poll_max_attempts;
        for attempt in 1..=max_attempts {
            let target = self
                .store
                .read_latest(&self.config.target_label)
                .await?;

            let observed = match target {
                Some(v) => format!("target: {}", v),
                None => "target: no samples".to_string(),
            };
            self.log.append_response(
                &format!("Heading status (attempt {})", attempt),
                &json!(observed),
                false,
            );

            if target == Some(-1.0) {
                self.log.append_response("Turn complete", &Value::Null, false);
                return Ok(());
            }

            if attempt < max_attempts {
                self.clock
                    .sleep(Duration::from_millis(self.config.poll_interval_ms))
                    .await;
            }
        }

        Err(RunError::HeadingTimeout {
            attempts: max_attempts,
        })
    }

    async fn send_stop(&mut self) -> Result<Value, StoreError> {
        self.store
            .write_latest(&self.config.action_label, Action::Stop.code())
            .await
    }
}
