/// DuckDB initialization SQL.
///
/// Executed once at open time via `Connection::execute_batch`. Every statement
/// uses `IF NOT EXISTS`, so re-running it on each startup is a no-op.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (`SITEPULSE_DUCKDB_MEMORY`, default `"1GB"`).
///
/// `events.site_id` carries no foreign key; `delete_site` removes events and
/// the site row inside one transaction.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- Keys: 'jwt_secret' (generated when SITEPULSE_JWT_SECRET is unset)
CREATE TABLE IF NOT EXISTS settings (
    key             VARCHAR PRIMARY KEY,
    value           VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS sites (
    site_id         VARCHAR PRIMARY KEY,           -- lowercase UUID v4
    owner           VARCHAR NOT NULL,              -- token subject of the creator
    domain          VARCHAR NOT NULL,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_sites_owner ON sites(owner);

CREATE TABLE IF NOT EXISTS events (
    id              VARCHAR NOT NULL,              -- UUID v4
    site_id         VARCHAR NOT NULL,
    event_type      VARCHAR NOT NULL DEFAULT 'pageview',
    url             VARCHAR NOT NULL,
    referrer        VARCHAR,
    utm_source      VARCHAR,
    user_agent      VARCHAR,
    language        VARCHAR,
    screen_width    INTEGER,
    screen_height   INTEGER,
    session_id      VARCHAR NOT NULL,
    ip_address      VARCHAR,
    country         VARCHAR,
    created_at      TIMESTAMP NOT NULL             -- UTC
);
CREATE INDEX IF NOT EXISTS idx_events_site_time ON events(site_id, created_at);
CREATE INDEX IF NOT EXISTS idx_events_site_session ON events(site_id, session_id);
"#
    )
}
