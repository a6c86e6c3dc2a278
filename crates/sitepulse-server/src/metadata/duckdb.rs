use std::sync::Arc;

use async_trait::async_trait;

use sitepulse_duckdb::{site::Site, DuckDbBackend};

use super::MetadataStore;

pub struct DuckDbMetadataStore {
    db: Arc<DuckDbBackend>,
}

impl DuckDbMetadataStore {
    pub fn new(db: Arc<DuckDbBackend>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetadataStore for DuckDbMetadataStore {
    async fn ensure_jwt_secret(&self) -> anyhow::Result<String> {
        self.db.ensure_jwt_secret().await
    }

    async fn create_site(&self, owner: &str, domain: &str) -> anyhow::Result<Site> {
        self.db.create_site(owner, domain).await
    }

    async fn get_site(&self, site_id: &str) -> anyhow::Result<Option<Site>> {
        self.db.get_site(site_id).await
    }

    async fn list_sites(&self, owner: &str) -> anyhow::Result<Vec<Site>> {
        self.db.list_sites(owner).await
    }

    async fn site_exists(&self, site_id: &str) -> anyhow::Result<bool> {
        self.db.site_exists(site_id).await
    }

    async fn delete_site(&self, site_id: &str) -> anyhow::Result<bool> {
        self.db.delete_site(site_id).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.db.ping().await
    }
}
