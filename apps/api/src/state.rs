use std::sync::Arc;

use sqlx::SqlitePool;

use crate::boards::BoardSource;
use crate::config::Config;
use crate::crypto::CredentialCipher;
use crate::documents::DocumentGenerator;
use crate::llm_client::ProviderFactory;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub cipher: CredentialCipher,
    /// Builds the generator for whichever provider is active at request time.
    pub providers: Arc<dyn ProviderFactory>,
    pub documents: DocumentGenerator,
    pub boards: Arc<dyn BoardSource>,
}

#[cfg(test)]
impl AppState {
    /// In-memory database, fake converter, and the given provider and board doubles.
    pub async fn for_tests(
        data_dir: &std::path::Path,
        providers: Arc<dyn ProviderFactory>,
        boards: Arc<dyn BoardSource>,
    ) -> Self {
        let config = Config::for_tests(data_dir.to_path_buf());
        AppState {
            db: crate::db::test_pool().await,
            cipher: CredentialCipher::new(&config.secret_key),
            providers,
            documents: DocumentGenerator::new(
                config.applications_dir(),
                Arc::new(crate::documents::converter::fake::FakeConverter),
            ),
            boards,
            config,
        }
    }
}
