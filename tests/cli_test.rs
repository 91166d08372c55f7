// CLI tests for the poly-repl binary, run against a mocked evaluator

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// keeps the user's own config out of the tests
fn poly_repl_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("poly-repl").unwrap();
    cmd.arg("--config-dir").arg(config_dir.path());
    cmd.arg("--no-color");
    cmd
}

#[tokio::test]
async fn test_eval_command_prints_echo_and_result() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/eval")
        .match_body("input=1+%2B+1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"type":"expr","value":"2"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    poly_repl_cmd(&dir)
        .arg("-u")
        .arg(server.url())
        .arg("eval")
        .arg("1 + 1")
        .assert()
        .success()
        .stdout(predicate::str::contains(">> 1 + 1\n   2\n"));
}

#[tokio::test]
async fn test_eval_command_reports_evaluator_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/eval")
        .with_status(200)
        .with_body(r#"{"type":"error","message":"division by zero"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    poly_repl_cmd(&dir)
        .arg("-u")
        .arg(server.url())
        .arg("eval")
        .arg("1 / 0")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error: division by zero"));
}

#[tokio::test]
async fn test_eval_command_protocol_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/eval")
        .with_status(200)
        .with_body(r#"{"type":"surprise"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    poly_repl_cmd(&dir)
        .arg("-u")
        .arg(server.url())
        .arg("eval")
        .arg("x")
        .assert()
        .failure()
        .stdout(predicate::str::contains(">> x"))
        .stdout(predicate::str::contains(
            "Error: Protocol error: unrecognized response type 'surprise'",
        ));
}

#[test]
fn test_eval_command_unreachable_evaluator() {
    // nothing listens on the discard port
    let dir = tempfile::tempdir().unwrap();
    poly_repl_cmd(&dir)
        .arg("-u")
        .arg("http://127.0.0.1:9")
        .arg("eval")
        .arg("1 + 1")
        .assert()
        .failure()
        .stdout(predicate::str::contains(">> 1 + 1"))
        .stdout(predicate::str::contains("Error: Transport failure:"));
}

#[tokio::test]
async fn test_interactive_session() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/poly/eval")
        .with_status(200)
        .with_body(r#"{"type":"expr","value":"6"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    poly_repl_cmd(&dir)
        .arg("-u")
        .arg(server.url())
        .arg("--base-path")
        .arg("poly")
        .arg("--no-banner")
        .write_stdin("\n(* 2 3)\n:nope\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(">> (* 2 3)"))
        .stdout(predicate::str::contains("   6"))
        .stdout(predicate::str::contains("Error: Undefined command 'nope'"));
}

#[test]
fn test_interactive_banner_and_quit() {
    let dir = tempfile::tempdir().unwrap();
    poly_repl_cmd(&dir)
        .arg("-u")
        .arg("http://127.0.0.1:9")
        .write_stdin(":q\n1 + 1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Poly REPL"))
        .stdout(predicate::str::contains(">> 1 + 1").not());
}

#[test]
fn test_config_save_and_show() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("poly-repl")
        .unwrap()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("-u")
        .arg("http://saved.example.com")
        .arg("--timeout-ms")
        .arg("2500")
        .arg("config")
        .arg("save")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration saved to"));

    Command::cargo_bin("poly-repl")
        .unwrap()
        .env_remove("POLY_REPL_API_URL")
        .arg("--config-dir")
        .arg(dir.path())
        .arg("config")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://saved.example.com"))
        .stdout(predicate::str::contains("2500"));
}
