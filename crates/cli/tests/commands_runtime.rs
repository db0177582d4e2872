use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use shopbot_cli::commands::{ask, config, doctor};

const NO_PRODUCTS: &str = "Šobrīd nav pieejamu produktu. Lūdzu, vēlāk mēģiniet vēlreiz.";

#[test]
fn ask_without_credential_answers_from_simulated_tier() {
    with_env(&[], || {
        let result = ask::run("Kādi produkti jums ir?", None);
        assert_eq!(result.exit_code, 0, "simulated mode should still answer");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], NO_PRODUCTS);
    });
}

#[test]
fn ask_refuses_off_topic_questions() {
    with_env(&[], || {
        let result = ask::run("Kāds šodien ir laiks?", None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().expect("message should be a string");
        assert!(message.starts_with("Atvainojiet"), "unexpected reply: {message}");
    });
}

#[test]
fn ask_reports_config_failure_for_out_of_range_timeout() {
    with_env(&[("SHOPBOT_CHATBOT_TIMEOUT_SECS", "0")], || {
        let result = ask::run("Kādi produkti jums ir?", None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn ask_accepts_history_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let history_path = dir.path().join("history.json");
    fs::write(
        &history_path,
        r#"[{"role":"user","content":"Sveiki"},{"role":"assistant","content":"Labdien!"}]"#,
    )
    .expect("write history");

    with_env(&[], || {
        let result = ask::run("Paldies!", Some(&history_path));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert!(!payload["message"].as_str().unwrap_or_default().is_empty());
    });
}

#[test]
fn ask_rejects_unreadable_history_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let history_path = dir.path().join("history.json");
    fs::write(&history_path, "not json").expect("write history");

    with_env(&[], || {
        let result = ask::run("Kādi produkti jums ir?", Some(&history_path));
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "history_file");
    });

    with_env(&[], || {
        let missing = dir.path().join("missing.json");
        let result = ask::run("Kādi produkti jums ir?", Some(&missing));
        assert_eq!(result.exit_code, 4);
    });
}

#[test]
fn ask_uses_custom_templates_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let templates_path = dir.path().join("templates.toml");
    fs::write(&templates_path, "topic_refusal = \"Only shop questions, please.\"\n")
        .expect("write templates");
    let templates_value = templates_path.display().to_string();

    with_env(&[("SHOPBOT_CHATBOT_TEMPLATES_PATH", templates_value.as_str())], || {
        let result = ask::run("Kāds šodien ir laiks?", None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "Only shop questions, please.");
    });
}

#[test]
fn ask_reports_resolver_failure_for_missing_templates_file() {
    with_env(&[("SHOPBOT_CHATBOT_TEMPLATES_PATH", "/definitely/not/here.toml")], || {
        let result = ask::run("Kādi produkti jums ir?", None);
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "resolver_init");
    });
}

#[test]
fn doctor_json_warns_about_simulated_mode_without_credential() {
    with_env(&[], || {
        let payload = parse_payload(&doctor::run(true));

        assert_eq!(payload["verdict"], "warn");
        assert_eq!(payload["inference_mode"], "simulated");
        let findings = payload["findings"].as_array().expect("findings array");
        let inference = findings
            .iter()
            .find(|finding| finding["check"] == "inference_mode")
            .expect("inference finding present");
        assert_eq!(inference["verdict"], "warn");
        assert!(inference["details"].as_str().unwrap_or_default().contains("simulated"));
    });
}

#[test]
fn doctor_marks_dependent_checks_skipped_on_invalid_config() {
    with_env(&[("SHOPBOT_CHATBOT_HISTORY_WINDOW", "0")], || {
        let payload = parse_payload(&doctor::run(true));

        assert_eq!(payload["verdict"], "fail");
        assert!(payload["inference_mode"].is_null());
        let verdicts: Vec<&str> = payload["findings"]
            .as_array()
            .expect("findings array")
            .iter()
            .map(|finding| finding["verdict"].as_str().unwrap_or_default())
            .collect();
        assert_eq!(verdicts, vec!["fail", "skipped", "skipped", "skipped"]);
    });
}

#[test]
fn doctor_fails_when_templates_file_is_missing() {
    with_env(&[("SHOPBOT_CHATBOT_TEMPLATES_PATH", "/definitely/not/here.toml")], || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["verdict"], "fail");
    });
}

#[test]
fn doctor_human_output_lists_each_check() {
    with_env(&[("HF_API_KEY", "hf_doctor_token")], || {
        let output = doctor::run(false);

        assert!(output.starts_with("doctor: shopbot is ready with warnings"));
        assert!(output.contains("[  ok] inference_mode"));
        assert!(output.contains("remote inference via"));
        assert!(output.contains("[warn] catalog"));
    });
}

#[test]
fn config_redacts_credential_and_attributes_env_source() {
    with_env(&[("HF_API_KEY", "hf_super_secret"), ("SHOPBOT_CHATBOT_TIMEOUT_SECS", "12")], || {
        let output = config::run();

        assert!(!output.contains("hf_super_secret"));
        assert!(output.contains("- chatbot.api_key = hf_*** (source: env (HF_API_KEY))"));
        assert!(output.contains("- chatbot.timeout_secs = 12 (source: env (SHOPBOT_CHATBOT_TIMEOUT_SECS))"));
        assert!(output.contains("- chatbot.history_window = 3 (source: default)"));
    });
}

#[test]
fn config_attributes_secondary_credential_variable() {
    with_env(&[("HUGGINGFACE_API_KEY", "other_token")], || {
        let output = config::run();

        assert!(!output.contains("other_token"));
        assert!(output.contains("- chatbot.api_key = <redacted> (source: env (HUGGINGFACE_API_KEY))"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "HF_API_KEY",
        "HUGGINGFACE_API_KEY",
        "SHOPBOT_CHATBOT_ENDPOINT",
        "SHOPBOT_CHATBOT_TIMEOUT_SECS",
        "SHOPBOT_CHATBOT_HISTORY_WINDOW",
        "SHOPBOT_CHATBOT_MAX_LENGTH",
        "SHOPBOT_CHATBOT_TEMPERATURE",
        "SHOPBOT_CHATBOT_PAYLOAD_FORMAT",
        "SHOPBOT_CHATBOT_TOPIC_GATE",
        "SHOPBOT_CHATBOT_TOPIC_KEYWORDS",
        "SHOPBOT_CHATBOT_LISTING_LIMIT",
        "SHOPBOT_CHATBOT_TEMPLATES_PATH",
        "SHOPBOT_SERVER_BIND_ADDRESS",
        "SHOPBOT_SERVER_PORT",
        "SHOPBOT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "SHOPBOT_LOGGING_LEVEL",
        "SHOPBOT_LOGGING_FORMAT",
        "SHOPBOT_LOG_LEVEL",
        "SHOPBOT_LOG_FORMAT",
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
