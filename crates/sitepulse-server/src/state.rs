use std::sync::Arc;

use sitepulse_core::{
    analytics::AnalyticsBackend,
    classify::{HeuristicClassifier, UserAgentClassifier},
    config::{ClassifierKind, Config},
};
use sitepulse_duckdb::DuckDbBackend;

use crate::{
    metadata::{duckdb::DuckDbMetadataStore, MetadataStore},
    ua::WootheeClassifier,
};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Event store seen through the backend-agnostic trait.
    pub analytics: Arc<dyn AnalyticsBackend>,

    /// Settings and site registry.
    pub metadata: Arc<dyn MetadataStore>,

    /// Device/browser strategy chosen by `SITEPULSE_UA_CLASSIFIER`.
    pub classifier: Arc<dyn UserAgentClassifier>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let db = Arc::new(db);
        let classifier: Arc<dyn UserAgentClassifier> = match config.ua_classifier {
            ClassifierKind::Heuristic => Arc::new(HeuristicClassifier),
            ClassifierKind::Woothee => Arc::new(WootheeClassifier),
        };
        Self {
            analytics: Arc::clone(&db) as Arc<dyn AnalyticsBackend>,
            metadata: Arc::new(DuckDbMetadataStore::new(db)),
            classifier,
            config: Arc::new(config),
        }
    }

    /// Secret used to sign and verify bearer tokens.
    ///
    /// `SITEPULSE_JWT_SECRET` wins; otherwise the secret persisted in the
    /// settings table is used (and created on first call).
    pub async fn jwt_secret(&self) -> anyhow::Result<String> {
        match &self.config.jwt_secret {
            Some(secret) => Ok(secret.clone()),
            None => self.metadata.ensure_jwt_secret().await,
        }
    }
}
