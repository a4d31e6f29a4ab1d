use forge404::Config;
use forge404::db::{ConnectionManager, PageStore, SqliteConnector};
use forge404::generation::GeminiGenerator;
use forge404::server::{ForgeState, forge_router};
use forge404::service::PageService;
use forge404::utils::logging::duration_ms;
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let policy = cfg.connection_policy();
    info!(
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        loglevel = %cfg.basic.loglevel,
        site_url = %cfg.basic.site_url,
        admin_routes = cfg.basic.admin_key().is_some(),
        model = %cfg.generation.model,
        proxy = %cfg.generation.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        connect_attempts = policy.connect_attempts,
        worst_case_connect_ms = duration_ms(policy.exhaustion_bound()),
        "Configuration loaded"
    );

    let connector = SqliteConnector::new(&cfg.database.url, policy.connect_timeout)?;
    let manager = ConnectionManager::spawn(connector, policy).await?;

    // Warm the connection in the background; requests still connect lazily if this fails.
    let warmup = manager.clone();
    tokio::spawn(async move {
        match warmup.acquire().await {
            Ok(handle) => info!(
                generation = handle.generation(),
                attempts = handle.attempts(),
                "Background task: record store ready"
            ),
            Err(e) => warn!(error = %e, "Background task: record store warm-up failed"),
        }
    });

    let store = PageStore::new(manager.clone(), cfg.store_budgets());
    let generator = Arc::new(GeminiGenerator::new(&cfg.generation)?);
    let pages = PageService::new(store, generator, cfg.generation.max_prompt_chars);

    let state = ForgeState::new(pages, cfg.basic.admin_key(), cfg.basic.site_url.clone());
    let app = forge_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = manager.reset().await {
        error!(error = %e, "Failed to close record store connection");
    }
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
