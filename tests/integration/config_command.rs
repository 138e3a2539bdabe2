use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn test_config_path_follows_env() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_show_redacts_token() {
    let env = TestEnv::new();
    env.command().args(["config", "init"]).assert().success();
    assert!(env.config_path().exists());

    env.command()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://blackduck.example.com"))
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("YOUR_API_TOKEN").not());
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let env = TestEnv::new();
    env.write_config("base_url = \"https://mine\"\n");

    env.command()
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
    let content = std::fs::read_to_string(env.config_path()).unwrap();
    assert!(content.contains("https://mine"));

    env.command().args(["config", "init", "--force"]).assert().success();
}

#[test]
fn test_config_show_applies_environment() {
    let env = TestEnv::new();
    env.write_config("base_url = \"https://from-file\"\ntimeout_secs = 40\n");

    env.command()
        .arg("config")
        .env("BD_URL", "https://from-env")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://from-env"))
        .stdout(predicate::str::contains("timeout_secs = 40"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let env = TestEnv::new();
    env.write_config("base_url = [not toml");

    env.command()
        .args(["resolve", "Platform"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[cfg(unix)]
#[test]
fn test_config_init_restricts_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::new();
    env.command().args(["config", "init"]).assert().success();
    let mode = std::fs::metadata(env.config_path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
