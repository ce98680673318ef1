//! JSON-lines session protocol for an external scheduler
//!
//! One command per input line, one event per output line:
//!
//! ```text
//! {"command":"info"}                                        -> {"event":"info",...}
//! {"command":"manifest"}                                    -> {"event":"manifest","test_cases":[...]}
//! {"command":"run_test_cases","test_case_ids":["..."]}      -> {"event":"test_case_result",...} per test,
//!                                                              then {"event":"run_complete",...}
//! {"command":"remove_test_case_result","test_case_id":"."}  -> {"event":"removed",...}
//! {"command":"finish"}                                      -> {"event":"finished","exit_status":0}
//! ```
//!
//! Bad input and rejected commands produce `{"event":"error","message":...}`; the session continues.

use std::io::{self, BufRead, Write};

use selective_core::{Manifest, TestResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runner::{RunController, RunState, RunnerInfo};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode event: {0}")]
    Json(#[from] serde_json::Error),
}

/// Commands accepted from the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SessionCommand {
    Info,
    Manifest,
    RunTestCases { test_case_ids: Vec<String> },
    RemoveTestCaseResult { test_case_id: String },
    Finish,
}

/// Events written back to the scheduler.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Info(RunnerInfo),
    Manifest(Manifest),
    TestCaseResult(TestResult),
    RunComplete { executed: usize, missing: Vec<String> },
    Removed { test_case_id: String, removed: bool },
    Finished { exit_status: i32 },
    Error { message: String },
}

/// Serialize `value` as one line of JSON and flush.
pub fn write_json_line(out: &mut impl Write, value: &impl Serialize) -> Result<(), SessionError> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Drive `controller` from `input` until `finish` or EOF. Returns the run's exit status.
///
/// ## Notes
/// - EOF without `finish` finalizes the run implicitly (a dropped scheduler connection).
pub fn serve(controller: &mut RunController, input: impl BufRead, mut output: impl Write) -> Result<i32, SessionError> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match serde_json::from_str::<SessionCommand>(&line) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable session command");
                write_json_line(
                    &mut output,
                    &SessionEvent::Error {
                        message: format!("invalid command: {}", e),
                    },
                )?;
                continue;
            }
        };

        if let Some(exit_status) = handle(controller, command, &mut output)? {
            return Ok(exit_status);
        }
    }

    if controller.state() == RunState::Finalized {
        return Ok(controller.exit_status());
    }
    tracing::info!("input closed without finish; finalizing");
    finish(controller, &mut output)
}

/// Handle one command. Returns `Some(exit_status)` once the run is finalized.
fn handle(controller: &mut RunController, command: SessionCommand, output: &mut impl Write) -> Result<Option<i32>, SessionError> {
    match command {
        SessionCommand::Info => write_json_line(output, &SessionEvent::Info(controller.info()))?,
        SessionCommand::Manifest => match controller.manifest() {
            Ok(manifest) => write_json_line(output, &SessionEvent::Manifest(manifest))?,
            Err(e) => write_error(output, &e)?,
        },
        SessionCommand::RunTestCases { test_case_ids } => {
            let mut write_failure = None;
            let report = controller.run_test_cases(&test_case_ids, |result| {
                if write_failure.is_none() {
                    write_failure = write_json_line(output, &SessionEvent::TestCaseResult(result)).err();
                }
            });
            if let Some(e) = write_failure {
                return Err(e);
            }
            match report {
                Ok(report) => write_json_line(
                    output,
                    &SessionEvent::RunComplete {
                        executed: report.executed,
                        missing: report.missing.into_iter().map(|m| m.test_id).collect(),
                    },
                )?,
                Err(e) => write_error(output, &e)?,
            }
        }
        SessionCommand::RemoveTestCaseResult { test_case_id } => match controller.remove_test_case_result(&test_case_id) {
            Ok(removed) => write_json_line(output, &SessionEvent::Removed { test_case_id, removed })?,
            Err(e) => write_error(output, &e)?,
        },
        SessionCommand::Finish => return finish(controller, output).map(Some),
    }
    Ok(None)
}

fn finish(controller: &mut RunController, output: &mut impl Write) -> Result<i32, SessionError> {
    match controller.finish() {
        Ok(outcome) => {
            write_json_line(
                output,
                &SessionEvent::Finished {
                    exit_status: outcome.exit_status,
                },
            )?;
            Ok(outcome.exit_status)
        }
        Err(e) => {
            write_error(output, &e)?;
            Ok(controller.exit_status())
        }
    }
}

fn write_error(output: &mut impl Write, err: &dyn std::error::Error) -> Result<(), SessionError> {
    write_json_line(
        output,
        &SessionEvent::Error {
            message: err.to_string(),
        },
    )
}
