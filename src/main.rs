use std::path::Path;
use std::sync::Arc;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use care_companion::api::{AppState, app};
use care_companion::catalog::{CatalogSeed, ProgramTagger};
use care_companion::config::{ServiceConfig, log_dir_from_env};
use care_companion::llm::create_oracle;
use care_companion::recommend::Recommender;
use care_companion::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing(log_dir_from_env().as_deref());

    let config = ServiceConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });

    eprintln!("🧓 Care Companion v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   REST: http://0.0.0.0:{}/api", config.port);
    eprintln!("   Chat WS: ws://0.0.0.0:{}/ws/chat", config.port);

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}", config.db_path.display());

    let oracle = create_oracle(&config)?;

    // ── Catalog seed ─────────────────────────────────────────────────────
    if let Some(seed_path) = &config.catalog_seed {
        let summary = CatalogSeed::load(seed_path)?.import(db.as_ref()).await?;
        eprintln!(
            "   Catalog: {} centers, {} programs, {} users from {}",
            summary.centers,
            summary.programs,
            summary.users,
            seed_path.display()
        );

        let report = ProgramTagger::new(Arc::clone(&db), Arc::clone(&oracle))
            .tag_untagged()
            .await?;
        if report.tagged + report.failed > 0 {
            eprintln!(
                "   Tagged {} programs ({} failed)",
                report.tagged, report.failed
            );
        }
    }

    let recommender = Arc::new(match config.rng_seed {
        Some(seed) => Recommender::seeded(seed),
        None => Recommender::from_entropy(),
    });

    let state = AppState::new(db, oracle, recommender, config.reanalysis_days);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "HTTP server started");
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Console logging, plus a daily-rolling file when a log directory is set.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "care-companion.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            None
        }
    }
}
