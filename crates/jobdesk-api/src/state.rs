//! Application state.

use std::sync::Arc;

use jobdesk_blob::ResumeStore;
use jobdesk_store::StoreClient;

use crate::auth::TokenKeys;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: StoreClient,
    pub resumes: Arc<ResumeStore>,
    pub keys: Arc<TokenKeys>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = StoreClient::new();

        let resumes = ResumeStore::new(&config.upload_dir);
        resumes.init().await?;

        let keys = TokenKeys::from_secret(config.jwt_secret.as_bytes());

        Ok(Self {
            config,
            store,
            resumes: Arc::new(resumes),
            keys: Arc::new(keys),
        })
    }
}
