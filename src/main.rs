use std::sync::Arc;

use anyhow::Context;
use onboarding_forms::config::ServerConfig;
use onboarding_forms::server;
use onboarding_forms::store::{Database, LibSqlBackend, seed_default_pages};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    eprintln!("📝 Onboarding Forms v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://{}", config.bind_address());
    eprintln!("   Database: {}", config.db_path.display());

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    if config.seed_default_pages && seed_default_pages(db.as_ref()).await? {
        eprintln!("   Seeded default onboarding pages");
    }

    // ── HTTP ─────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    server::serve(listener, db).await?;

    Ok(())
}
