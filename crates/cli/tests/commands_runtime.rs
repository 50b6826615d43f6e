use std::env;
use std::sync::{Mutex, OnceLock};

use navigator_cli::commands::{doctor, migrate, recommend, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("NAVIGATOR_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("NAVIGATOR_DATABASE_URL", "postgres://localhost/navigator")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("navigator.db").display());

    with_env(&[("NAVIGATOR_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["status"], "ok");
        let first_message = first_payload["message"].as_str().unwrap_or_default();
        assert!(first_message.contains("6 orders, 6 jobs"), "{first_message}");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(second_payload["command"], "seed");
        let second_message = second_payload["message"].as_str().unwrap_or_default();
        assert!(second_message.contains("0 orders, 0 jobs"), "{second_message}");
    });
}

#[test]
fn seed_reports_unreachable_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("missing/navigator.db").display());

    with_env(&[("NAVIGATOR_DATABASE_URL", url.as_str())], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "db_connectivity");
    });
}

#[test]
fn doctor_passes_with_rules_only_assistant() {
    with_env(&[("NAVIGATOR_DATABASE_URL", "sqlite::memory:")], || {
        let (passed, output) = doctor::run(true);
        assert!(passed, "{output}");

        let payload = parse_payload(&output);
        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks");
        assert!(checks
            .iter()
            .any(|check| check["name"] == "llm_readiness" && check["status"] == "warn"));
    });
}

#[test]
fn recommend_prints_the_server_response_shape() {
    with_env(&[("NAVIGATOR_DATABASE_URL", "sqlite::memory:")], || {
        let result = recommend::run("I need 10 uplights", None);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["intent"]["category"], "lighting");
        assert_eq!(payload["intent"]["subcategory"], "uplights");
        assert_eq!(payload["items"][0]["quantity"], 10);
        assert!(payload["message"].as_str().unwrap_or_default().contains("Lighting"));
    });
}

#[test]
fn recommend_rejects_blank_prompt() {
    with_env(&[], || {
        let result = recommend::run("   ", None);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["message"], "No prompt provided");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "NAVIGATOR_DATABASE_URL",
        "NAVIGATOR_DATABASE_MAX_CONNECTIONS",
        "NAVIGATOR_DATABASE_TIMEOUT_SECS",
        "NAVIGATOR_DATABASE_FALLBACK_TO_MEMORY",
        "NAVIGATOR_LLM_PROVIDER",
        "NAVIGATOR_LLM_API_KEY",
        "NAVIGATOR_LLM_BASE_URL",
        "NAVIGATOR_LLM_MODEL",
        "NAVIGATOR_LLM_TIMEOUT_SECS",
        "NAVIGATOR_LLM_MAX_RETRIES",
        "NAVIGATOR_LLM_TEMPERATURE",
        "NAVIGATOR_SERVER_BIND_ADDRESS",
        "NAVIGATOR_SERVER_PORT",
        "NAVIGATOR_SERVER_STATIC_DIR",
        "NAVIGATOR_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "NAVIGATOR_LOG_LEVEL",
        "NAVIGATOR_LOG_FORMAT",
        "OPENAI_API_KEY",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
