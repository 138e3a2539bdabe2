use predicates::prelude::*;

use crate::common::{SCANS_CSV, TestEnv};

#[test]
fn test_help_lists_commands() {
    let env = TestEnv::new();
    env.command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("filter"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_usage_error_has_own_exit_code() {
    let env = TestEnv::new();
    env.command().args(["resolve", "Platform", "--page-size", "0"]).assert().code(64);
    env.command().arg("resolve").assert().code(64);
}

#[test]
fn test_missing_url_is_config_error() {
    let env = TestEnv::new();
    env.command()
        .args(["resolve", "Platform"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Black Duck URL must be provided"))
        .stderr(predicate::str::contains("BD_URL"));
}

#[test]
fn test_missing_credentials_is_auth_error() {
    let env = TestEnv::new();
    env.command()
        .args(["resolve", "Platform", "--bd-url", "https://hub.invalid/"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("missing credentials"))
        .stderr(predicate::str::contains("BD_API_TOKEN"));
}

#[test]
fn test_env_credentials_are_used() {
    let env = TestEnv::new();
    // Port 9 (discard) is not listening, so a token from the environment
    // gets as far as the network
    env.command()
        .args(["resolve", "Platform", "--timeout", "2"])
        .env("BD_URL", "http://127.0.0.1:9")
        .env("BD_API_TOKEN", "token")
        .assert()
        .code(6)
        .stderr(predicate::str::contains("127.0.0.1:9/api/tokens/authenticate"));
}

#[test]
fn test_filter_rejects_missing_archive() {
    let env = TestEnv::new();
    env.command()
        .args(["filter", "missing.zip", "--project-group", "Platform"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_filter_rejects_non_zip_extension() {
    let env = TestEnv::new();
    std::fs::write(env.path().join("scans.csv"), SCANS_CSV).unwrap();
    env.command()
        .args(["filter", "scans.csv", "-g", "Platform"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be a zip archive"));
}

#[test]
fn test_filter_loads_archive_before_contacting_hub() {
    let env = TestEnv::new();
    std::fs::write(env.path().join("broken.zip"), "not a zip").unwrap();
    // No URL is configured: the archive error must win
    env.command()
        .args(["filter", "broken.zip", "-g", "Platform"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a valid zip archive"));
}

#[test]
fn test_filter_with_valid_archive_then_needs_url() {
    let env = TestEnv::new();
    env.write_zip("export.zip", &[("scans.csv", SCANS_CSV)]);
    env.command()
        .args(["filter", "export.zip", "-g", "Platform"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Black Duck URL must be provided"));
}
