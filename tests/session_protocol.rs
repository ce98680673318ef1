//! JSON-lines session driven by scripted scheduler input.

mod support;

use std::io::Cursor;

use selective::cli::session::serve;
use selective::runner::{RunController, RunSettings, RunState};
use selective_core::test_id;
use serde_json::Value;
use support::{Script, ScriptedFramework};
use tempfile::TempDir;

fn controller(root: &TempDir) -> RunController {
    let framework = ScriptedFramework::new()
        .test("math", "adds", "tests/math.rs", 3, Script::Pass)
        .test("math", "divides", "tests/math.rs", 12, Script::Fail("boom"));
    let settings = RunSettings::from_lookup(root.path(), ["--seed=7", "--no-progress"], |_: &str| None).unwrap();
    RunController::start(Box::new(framework), settings).unwrap()
}

fn events(output: Vec<u8>) -> Vec<Value> {
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn full_session_round() {
    let root = TempDir::new().unwrap();
    let mut controller = controller(&root);
    let adds = test_id("tests/math.rs", "math", "adds");
    let divides = test_id("tests/math.rs", "math", "divides");

    let input = format!(
        concat!(
            "{{\"command\":\"info\"}}\n",
            "{{\"command\":\"manifest\"}}\n",
            "\n",
            "{{\"command\":\"run_test_cases\",\"test_case_ids\":[\"{divides}\",\"{adds}\",\"nope.rs:00\"]}}\n",
            "{{\"command\":\"remove_test_case_result\",\"test_case_id\":\"{divides}\"}}\n",
            "{{\"command\":\"finish\"}}\n",
            "{{\"command\":\"info\"}}\n",
        ),
        divides = divides,
        adds = adds
    );

    let mut output = Vec::new();
    let exit = serve(&mut controller, Cursor::new(input), &mut output).unwrap();
    assert_eq!(exit, 0);
    assert_eq!(controller.state(), RunState::Finalized);

    let events = events(output);
    let kinds: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec![
            "info",
            "manifest",
            "test_case_result",
            "test_case_result",
            "run_complete",
            "removed",
            "finished"
        ]
    );

    assert_eq!(events[0]["framework"], "scripted");
    assert_eq!(events[1]["test_cases"].as_array().unwrap().len(), 2);
    assert_eq!(events[2]["id"], divides.as_str());
    assert_eq!(events[2]["status"], "failed");
    assert_eq!(events[3]["status"], "passed");
    assert_eq!(events[4]["executed"], 2);
    assert_eq!(events[4]["missing"], serde_json::json!(["nope.rs:00"]));
    assert_eq!(events[5]["removed"], true);
    assert_eq!(events[6]["exit_status"], 0);
}

#[test]
fn failing_run_exits_nonzero_on_eof() {
    let root = TempDir::new().unwrap();
    let mut controller = controller(&root);
    let divides = test_id("tests/math.rs", "math", "divides");
    let input = format!("{{\"command\":\"run_test_cases\",\"test_case_ids\":[\"{divides}\"]}}\n");

    let mut output = Vec::new();
    let exit = serve(&mut controller, Cursor::new(input), &mut output).unwrap();
    assert_eq!(exit, 1);

    let events = events(output);
    assert_eq!(events.last().unwrap()["event"], "finished");
    assert_eq!(events.last().unwrap()["exit_status"], 1);
}

#[test]
fn malformed_line_reports_error_and_continues() {
    let root = TempDir::new().unwrap();
    let mut controller = controller(&root);
    let input = "not json\n{\"command\":\"launch\"}\n{\"command\":\"finish\"}\n";

    let mut output = Vec::new();
    serve(&mut controller, Cursor::new(input), &mut output).unwrap();

    let events = events(output);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["event"], "error");
    assert!(events[0]["message"].as_str().unwrap().starts_with("invalid command"));
    assert_eq!(events[1]["event"], "error");
    assert_eq!(events[2]["event"], "finished");
}
