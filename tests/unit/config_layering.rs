//! File, environment and flag precedence of hub settings.

use bdmetrics::cli::HubArgs;
use bdmetrics::config::{AuthMethod, HubConfig};
use bdmetrics::resolver::ErrorPolicy;
use serial_test::serial;
use std::collections::HashMap;
use tempfile::TempDir;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key| map.get(key).cloned()
}

async fn file_config(content: &str) -> (TempDir, HubConfig) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    tokio::fs::write(&path, content).await.unwrap();
    let config = HubConfig::load_from(&path).await.unwrap();
    (temp, config)
}

#[tokio::test]
async fn test_file_then_env_then_flags() {
    let (_temp, config) = file_config(
        r#"
base_url = "https://file.example.com/"
timeout_secs = 30
policy = "strict"

[credentials]
username = "file-user"
password = "file-pass"
"#,
    )
    .await;
    assert_eq!(config.policy, ErrorPolicy::Strict);
    assert!(matches!(config.credentials.resolve().unwrap(), AuthMethod::Password { .. }));

    let config = config.with_env_overrides(env_of(&[
        ("BD_URL", "https://env.example.com"),
        ("BD_API_TOKEN", "env-token"),
        ("BD_TIMEOUT", "45"),
    ]));
    assert_eq!(config.normalized_base_url().unwrap(), "https://env.example.com");
    assert_eq!(config.timeout_secs, 45);
    // A token from any layer beats username/password
    assert_eq!(config.credentials.resolve().unwrap(), AuthMethod::ApiToken("env-token".into()));

    let args = HubArgs {
        bd_url: Some("https://flag.example.com//".into()),
        timeout: Some(5),
        max_depth: Some(4),
        ..HubArgs::default()
    };
    let config = args.apply(config);
    assert_eq!(config.normalized_base_url().unwrap(), "https://flag.example.com");
    assert_eq!(config.timeout_secs, 5);
    assert_eq!(config.resolve_options().max_depth, 4);
    assert_eq!(config.resolve_options().policy, ErrorPolicy::Strict);
}

#[tokio::test]
async fn test_blank_env_values_are_ignored() {
    let (_temp, config) = file_config("base_url = \"https://file.example.com\"\n").await;
    let config = config.with_env_overrides(env_of(&[("BD_URL", "  "), ("BD_TIMEOUT", "soon")]));
    assert_eq!(config.base_url.as_deref(), Some("https://file.example.com"));
    assert_eq!(config.timeout_secs, 15);
}

#[tokio::test]
async fn test_missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.toml");
    let config = HubConfig::load_with_optional(Some(missing)).await.unwrap();
    assert_eq!(config, HubConfig::default());
}

#[tokio::test]
#[serial]
async fn test_process_environment_lookup() {
    // SAFETY: serialized with every other test touching the environment
    unsafe {
        std::env::set_var("BD_INSECURE", "yes");
    }
    let config = HubConfig::default().with_env_overrides(|key| std::env::var(key).ok());
    unsafe {
        std::env::remove_var("BD_INSECURE");
    }

    assert!(config.insecure);
}
