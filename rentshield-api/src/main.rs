//! # RentShield API Server
//!
//! Task, submission and property-review workflows for landlords, tenants and
//! an administrator, behind cookie sessions.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/rentshield cargo run -p rentshield-api
//! STORE_BACKEND=memory cargo run -p rentshield-api
//! ```

use rentshield_api::{
    app::{build_router, AppState},
    config::{Config, StoreBackend},
    sweeper::spawn_session_sweeper,
};
use rentshield_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::{memory::MemoryStore, postgres::PgStore, SharedStore},
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "RentShield API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let (store, pool) = open_store(&config).await?;
    tracing::info!(backend = store.backend(), "Store ready");

    let state = AppState::new(store, config.clone());

    if let Some(admin) = &config.bootstrap {
        match state
            .identity
            .bootstrap_admin(&admin.name, &admin.email, &admin.password)
            .await?
        {
            Some(user) => tracing::info!(user_id = %user.id, "Bootstrap admin created"),
            None => tracing::debug!("Admin already exists; bootstrap skipped"),
        }
    }

    let shutdown = CancellationToken::new();

    let sweeper = (config.session.sweep_interval_secs > 0).then(|| {
        spawn_session_sweeper(
            state.sessions.clone(),
            Duration::from_secs(config.session.sweep_interval_secs),
            shutdown.clone(),
        )
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Session sweeper ended abnormally");
        }
    }

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server shut down");
    Ok(())
}

/// `RUST_LOG` filter; `LOG_FORMAT=json` for JSON lines
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "rentshield_api=debug,rentshield_shared=info,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Builds the configured store; the pool is returned for shutdown
async fn open_store(config: &Config) -> anyhow::Result<(SharedStore, Option<PgPool>)> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok((Arc::new(MemoryStore::new()), None))
        }
        StoreBackend::Postgres => {
            let url = config
                .database
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;

            let mut db_config = DatabaseConfig::new(url);
            db_config.max_connections = config.database.max_connections;

            let pool = create_pool(db_config).await?;
            run_migrations(&pool).await?;

            Ok((Arc::new(PgStore::new(pool.clone())), Some(pool)))
        }
    }
}

/// Resolves on Ctrl-C, SIGTERM, or cancellation of `shutdown`
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
