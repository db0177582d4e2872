pub mod ask;
pub mod config;
pub mod doctor;

use serde::Serialize;
use serde_json::json;

/// Reasons `shopbot ask` can stop before printing a reply. Each class owns its exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AskFailure {
    /// The async runtime could not start.
    Runtime,
    ConfigValidation,
    /// Templates or the inference client could not be built.
    ResolverInit,
    HistoryFile,
}

impl AskFailure {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Runtime => 1,
            Self::ConfigValidation => 2,
            Self::ResolverInit => 3,
            Self::HistoryFile => 4,
        }
    }
}

/// Printed text plus the process exit code.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    /// Human or pre-rendered output from `config` and `doctor`.
    pub fn report(output: String) -> Self {
        Self { exit_code: 0, output }
    }

    /// `ask` outcome carrying the assistant reply.
    pub fn replied(reply: &str) -> Self {
        let outcome = json!({
            "command": "ask",
            "status": "ok",
            "error_class": null,
            "message": reply,
        });
        Self { exit_code: 0, output: outcome.to_string() }
    }

    pub fn ask_failed(failure: AskFailure, message: impl AsRef<str>) -> Self {
        let outcome = json!({
            "command": "ask",
            "status": "error",
            "error_class": failure,
            "message": message.as_ref(),
        });
        Self { exit_code: failure.exit_code(), output: outcome.to_string() }
    }
}
