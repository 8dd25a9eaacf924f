//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::routes::orders::AppState;
use domain::TransitionPolicy;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use store::{
    CartStore, OrderStore, PostgresCartStore, PostgresOrderStore, PostgresProductCatalog,
    ProductCatalog,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use workflow::OrderService;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve<O, P, C>(config: &Config, state: Arc<AppState<O, P, C>>, metrics_handle: PrometheusHandle)
where
    O: OrderStore + Clone + 'static,
    P: ProductCatalog + Clone + 'static,
    C: CartStore + 'static,
{
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let policy = if config.strict_transitions {
        TransitionPolicy::ForwardOnly
    } else {
        TransitionPolicy::Permissive
    };

    // 3. Pick the stores and serve
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            store::run_migrations(&pool)
                .await
                .expect("failed to run migrations");
            tracing::info!(
                max_connections = config.database_max_connections,
                ?policy,
                "using PostgreSQL stores"
            );

            let service = OrderService::new(
                PostgresOrderStore::new(pool.clone()),
                PostgresProductCatalog::new(pool.clone()),
                PostgresCartStore::new(pool),
            )
            .with_policy(policy);
            serve(&config, Arc::new(AppState::new(service)), metrics_handle).await;
        }
        None => {
            tracing::warn!(?policy, "DATABASE_URL not set, using in-memory stores");
            let (state, _catalog) = api::create_default_state(policy);
            serve(&config, state, metrics_handle).await;
        }
    }

    tracing::info!("server shut down gracefully");
}
