use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use shopbot_agent::ResponseResolver;
use shopbot_core::catalog::{CatalogSource, StaticCatalog};
use shopbot_core::config::{AppConfig, LoadOptions};
use shopbot_core::domain::conversation::Message;

use crate::commands::{AskFailure, CommandResult};

pub fn run(message: &str, history_file: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::ask_failed(AskFailure::ConfigValidation, error.to_string()),
    };

    let history = match load_history(history_file) {
        Ok(history) => history,
        Err(error) => return CommandResult::ask_failed(AskFailure::HistoryFile, format!("{error:#}")),
    };

    let resolver = match ResponseResolver::from_config(&config.chatbot) {
        Ok(resolver) => resolver,
        Err(error) => return CommandResult::ask_failed(AskFailure::ResolverInit, error.to_string()),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::ask_failed(
                AskFailure::Runtime,
                format!("failed to initialize async runtime: {error}"),
            )
        }
    };

    let catalog = StaticCatalog::new(config.catalog).products();
    let reply = runtime.block_on(resolver.resolve(message, &history, &catalog));
    CommandResult::replied(&reply)
}

fn load_history(path: Option<&Path>) -> Result<Vec<Message>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read history file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("history file `{}` is not a JSON message list", path.display()))
}
