//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::io;
use std::path::Path;

use super::session::{self, SessionEvent, write_json_line};
use super::{CliError, CliResult, ExitCode};
use crate::runner::{LibtestFramework, RunController, RunSettings};

/// Configure a run over `root` with the libtest adapter.
fn start(root: &Path, args: Vec<String>) -> CliResult<RunController> {
    let settings = RunSettings::from_env(root, args).map_err(|e| CliError::failure(format!("Error: {}", e)))?;
    Ok(RunController::start(Box::new(LibtestFramework::from_env()), settings)?)
}

/// `selective manifest`: print the manifest as a single JSON document.
pub fn print_manifest(root: &Path, args: Vec<String>) -> CliResult<ExitCode> {
    let controller = start(root, args)?;
    let manifest = controller.manifest()?;

    let mut out = io::stdout().lock();
    write_json_line(&mut out, &manifest).map_err(|e| CliError::failure(format!("Error writing manifest: {}", e)))?;
    Ok(ExitCode::SUCCESS)
}

/// `selective run`: run the targeted IDs (or the whole registry) and print one result per line.
pub fn run_tests(root: &Path, args: Vec<String>) -> CliResult<ExitCode> {
    let mut controller = start(root, args)?;
    let ids: Vec<String> = if controller.targeted_ids().is_empty() {
        controller.registry().ids().to_vec()
    } else {
        controller.targeted_ids().to_vec()
    };

    let mut out = io::stdout().lock();
    let mut write_error = None;
    let report = controller.run_test_cases(&ids, |result| {
        if write_error.is_none() {
            write_error = write_json_line(&mut out, &result).err();
        }
    })?;

    if let Some(e) = write_error {
        return Err(CliError::failure(format!("Error writing results: {}", e)));
    }
    for missing in &report.missing {
        eprintln!("\x1b[33m{}\x1b[0m", missing);
    }

    let outcome = controller.finish()?;
    Ok(ExitCode(outcome.exit_status))
}

/// `selective serve`: run the JSON-lines session until `finish` or EOF.
pub fn serve(root: &Path, args: Vec<String>) -> CliResult<ExitCode> {
    let mut controller = match start(root, args) {
        Ok(controller) => controller,
        Err(e) => {
            // The scheduler only reads stdout; tell it why there is no session.
            let event = SessionEvent::Error {
                message: e.message.clone(),
            };
            let _ = write_json_line(&mut io::stdout().lock(), &event);
            return Err(e);
        }
    };

    let exit_status = session::serve(&mut controller, io::stdin().lock(), io::stdout().lock())
        .map_err(|e| CliError::failure(format!("Error: {}", e)))?;
    Ok(ExitCode(exit_status))
}
