use std::sync::Arc;

use axum::Router;
use shopbot_agent::{ResolverError, ResponseResolver};
use shopbot_core::catalog::{CatalogSource, StaticCatalog};
use shopbot_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;
use tracing::info;

use crate::{chatbot, health};

pub struct Application {
    pub config: AppConfig,
    pub resolver: Arc<ResponseResolver>,
    pub catalog: Arc<dyn CatalogSource>,
}

impl Application {
    pub fn inference_mode(&self) -> &'static str {
        if self.resolver.is_remote_enabled() {
            "remote"
        } else {
            "simulated"
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("chatbot resolver initialization failed: {0}")]
    Resolver(#[from] ResolverError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let resolver = Arc::new(ResponseResolver::from_config(&config.chatbot)?);
    info!(
        event_name = "system.bootstrap.resolver_ready",
        correlation_id = "bootstrap",
        stages = ?resolver.stage_names(),
        "chatbot resolver initialized"
    );

    let catalog: Arc<dyn CatalogSource> = Arc::new(StaticCatalog::new(config.catalog.clone()));
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        product_count = config.catalog.len(),
        "static catalog loaded"
    );

    Ok(Application { config, resolver, catalog })
}

pub fn router(app: &Application) -> Router {
    chatbot::router(Arc::clone(&app.resolver), Arc::clone(&app.catalog))
        .merge(health::router(app.inference_mode(), app.config.catalog.len()))
}

#[cfg(test)]
mod tests {
    use shopbot_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn overrides(overrides: ConfigOverrides) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides { chatbot_api_key: Some(String::new()), ..overrides },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn bootstrap_fails_fast_on_invalid_history_window() {
        let result = bootstrap(overrides(ConfigOverrides {
            chatbot_history_window: Some(0),
            ..ConfigOverrides::default()
        }));

        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("chatbot.history_window"));
    }

    #[test]
    fn bootstrap_fails_when_templates_file_is_missing() {
        let result = bootstrap(overrides(ConfigOverrides {
            chatbot_templates_path: Some("/nonexistent/shopbot-templates.toml".into()),
            ..ConfigOverrides::default()
        }));

        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("chatbot resolver initialization failed"));
    }

    #[test]
    fn bootstrap_without_credential_runs_in_simulated_mode() {
        let app = bootstrap(overrides(ConfigOverrides::default()))
            .expect("bootstrap should succeed without a credential");

        assert_eq!(app.inference_mode(), "simulated");
        assert_eq!(app.resolver.stage_names(), vec!["topic_gate"]);
    }
}
