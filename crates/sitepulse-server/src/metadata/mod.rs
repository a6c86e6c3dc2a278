use async_trait::async_trait;

use sitepulse_duckdb::site::Site;

pub mod duckdb;

/// Storage interface for non-analytics metadata: settings and the site
/// registry.
///
/// Route handlers depend on this trait only, so the registry can move to a
/// different store without touching them.
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    async fn ensure_jwt_secret(&self) -> anyhow::Result<String>;

    async fn create_site(&self, owner: &str, domain: &str) -> anyhow::Result<Site>;
    async fn get_site(&self, site_id: &str) -> anyhow::Result<Option<Site>>;
    async fn list_sites(&self, owner: &str) -> anyhow::Result<Vec<Site>>;
    async fn site_exists(&self, site_id: &str) -> anyhow::Result<bool>;
    async fn delete_site(&self, site_id: &str) -> anyhow::Result<bool>;

    async fn ping(&self) -> anyhow::Result<()>;
}
