use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use sitepulse_core::config::Config;
use sitepulse_duckdb::DuckDbBackend;
use sitepulse_server::{auth::jwt::encode_jwt, seed::seed_demo, state::AppState};

/// `sitepulse health` - liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$SITEPULSE_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("SITEPULSE_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

fn open_store(cfg: &Config) -> Result<DuckDbBackend> {
    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/sitepulse.db", cfg.data_dir);
    DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sitepulse=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let db = open_store(&cfg)?;

    match args.get(1).map(|s| s.as_str()) {
        Some("token") => {
            let user = args
                .get(2)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow::anyhow!("usage: sitepulse token <user>"))?;
            let state = AppState::new(db, cfg.clone());
            let secret = state.jwt_secret().await?;
            let (token, expires_at) = encode_jwt(&secret, user, cfg.token_days)?;
            info!(user, expires_at = %expires_at, "token issued");
            println!("{token}");
            Ok(())
        }
        Some("seed") => {
            let owner = args.get(2).map(|s| s.as_str()).unwrap_or("demo");
            let summary = seed_demo(&db, owner).await?;
            println!("{}", summary.site_id);
            Ok(())
        }
        Some(other) => Err(anyhow::anyhow!(
            "unknown command '{other}' (expected: health, token <user>, seed [user])"
        )),
        None => serve(db, cfg).await,
    }
}

async fn serve(db: DuckDbBackend, cfg: Config) -> Result<()> {
    let state = Arc::new(AppState::new(db, cfg.clone()));

    match state.jwt_secret().await {
        Ok(_) => info!("JWT secret ready"),
        Err(e) => tracing::error!(error = %e, "Failed to ensure JWT secret"),
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = sitepulse_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, classifier = ?cfg.ua_classifier, "SitePulse listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("shutdown complete");
    Ok(())
}
