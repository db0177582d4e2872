use serde::Serialize;
use serde_json::json;
use shopbot_agent::templates::ReplyTemplates;
use shopbot_core::config::{AppConfig, LoadOptions};

/// `Warn` marks a degraded but working setup, such as simulated replies or an empty catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
enum Verdict {
    Pass,
    Warn,
    Skipped,
    Fail,
}

#[derive(Debug, Serialize)]
struct Finding {
    check: &'static str,
    verdict: Verdict,
    details: String,
}

impl Finding {
    fn new(check: &'static str, verdict: Verdict, details: impl Into<String>) -> Self {
        Self { check, verdict, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct Readiness {
    verdict: Verdict,
    inference_mode: Option<&'static str>,
    findings: Vec<Finding>,
}

pub fn run(json_output: bool) -> String {
    let readiness = assess();

    if json_output {
        return serde_json::to_string_pretty(&readiness).unwrap_or_else(|error| {
            json!({ "verdict": "fail", "findings": [], "error": error.to_string() }).to_string()
        });
    }

    render_human(&readiness)
}

fn assess() -> Readiness {
    let config = AppConfig::load(LoadOptions::default());
    let findings = match &config {
        Ok(config) => vec![
            Finding::new("config_validation", Verdict::Pass, "configuration loaded and validated"),
            inference_finding(config),
            templates_finding(config),
            catalog_finding(config),
        ],
        Err(error) => {
            let mut findings = vec![Finding::new("config_validation", Verdict::Fail, error.to_string())];
            findings.extend(["inference_mode", "reply_templates", "catalog"].map(|check| {
                Finding::new(check, Verdict::Skipped, "configuration did not load")
            }));
            findings
        }
    };

    let verdict = findings
        .iter()
        .map(|finding| match finding.verdict {
            Verdict::Skipped => Verdict::Fail,
            other => other,
        })
        .max()
        .unwrap_or(Verdict::Pass);
    let inference_mode = config.ok().map(|config| {
        if config.chatbot.has_credential() {
            "remote"
        } else {
            "simulated"
        }
    });

    Readiness { verdict, inference_mode, findings }
}

fn inference_finding(config: &AppConfig) -> Finding {
    if config.chatbot.has_credential() {
        Finding::new(
            "inference_mode",
            Verdict::Pass,
            format!("remote inference via `{}`", config.chatbot.endpoint),
        )
    } else {
        Finding::new(
            "inference_mode",
            Verdict::Warn,
            "HF_API_KEY / HUGGINGFACE_API_KEY not set; every reply will be simulated",
        )
    }
}

fn templates_finding(config: &AppConfig) -> Finding {
    let path = config.chatbot.templates_path.as_deref();
    match ReplyTemplates::load_or_default(path) {
        Ok(_) => match path {
            Some(path) => Finding::new(
                "reply_templates",
                Verdict::Pass,
                format!("loaded from `{}`", path.display()),
            ),
            None => Finding::new("reply_templates", Verdict::Pass, "built-in Latvian templates"),
        },
        Err(error) => Finding::new("reply_templates", Verdict::Fail, error.to_string()),
    }
}

fn catalog_finding(config: &AppConfig) -> Finding {
    match config.catalog.len() {
        0 => Finding::new(
            "catalog",
            Verdict::Warn,
            "no products configured; product questions will be told nothing is available",
        ),
        count => Finding::new("catalog", Verdict::Pass, format!("{count} products configured")),
    }
}

fn render_human(readiness: &Readiness) -> String {
    let headline = match readiness.verdict {
        Verdict::Pass => "shopbot is ready",
        Verdict::Warn => "shopbot is ready with warnings",
        Verdict::Skipped | Verdict::Fail => "shopbot is not ready",
    };

    let mut lines = vec![format!("doctor: {headline}")];
    lines.extend(readiness.findings.iter().map(|finding| {
        let marker = match finding.verdict {
            Verdict::Pass => "ok",
            Verdict::Warn => "warn",
            Verdict::Skipped => "skip",
            Verdict::Fail => "fail",
        };
        format!("  [{marker:>4}] {:<18} {}", finding.check, finding.details)
    }));
    lines.join("\n")
}
