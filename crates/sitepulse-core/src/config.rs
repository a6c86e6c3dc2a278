#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    /// Token signing secret. `None` means a generated secret persisted in the
    /// `settings` table is used instead.
    pub jwt_secret: Option<String>,
    /// Lifetime of tokens minted by `sitepulse token`.
    pub token_days: u32,
    pub cors_origins: Vec<String>,
    pub ua_classifier: ClassifierKind,
}

/// Which user-agent classification strategy the dashboards use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierKind {
    #[default]
    Heuristic,
    Woothee,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Only the port is strict; every other malformed value falls back to its
    /// default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: lookup("SITEPULSE_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: lookup("SITEPULSE_DATA_DIR").unwrap_or_else(|| "./data".to_string()),
            duckdb_memory_limit: lookup("SITEPULSE_DUCKDB_MEMORY")
                .unwrap_or_else(|| "1GB".to_string()),
            jwt_secret: lookup("SITEPULSE_JWT_SECRET").filter(|s| !s.trim().is_empty()),
            token_days: lookup("SITEPULSE_TOKEN_DAYS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
            cors_origins: lookup("SITEPULSE_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            ua_classifier: match lookup("SITEPULSE_UA_CLASSIFIER") {
                Some(raw) if raw.trim().eq_ignore_ascii_case("woothee") => {
                    ClassifierKind::Woothee
                }
                _ => ClassifierKind::Heuristic,
            },
        })
    }
}
