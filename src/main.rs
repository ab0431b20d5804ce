use std::net::SocketAddr;

use dotenvy::dotenv;
use newsdesk::logging::init_tracing;
use newsdesk::metrics::{init_metrics, metrics_app};
use newsdesk::newsdesk_db::init_db_pool;
use newsdesk::router::init_router;
use newsdesk::state::init_app_state;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        error!("DATABASE_URL must be set");
        std::process::exit(1);
    };

    let pool = match init_db_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    match init_metrics() {
        Ok(Some(handle)) => {
            let port = env_port("METRICS_PORT", 9090);
            tokio::spawn(async move {
                let addr = SocketAddr::from(([0, 0, 0, 0], port));
                match tokio::net::TcpListener::bind(addr).await {
                    Ok(listener) => {
                        info!(%addr, "Metrics server listening");
                        if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                            error!(error = %e, "Metrics server stopped");
                        }
                    }
                    Err(e) => error!(error = %e, %addr, "Failed to bind metrics listener"),
                }
            });
        }
        Ok(None) => info!("Observability disabled, metrics not exported"),
        Err(e) => warn!(error = %e, "Failed to install metrics recorder"),
    }

    let state = init_app_state(pool);
    let app = init_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], env_port("PORT", 3000)));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!("🚀 Server running on http://{addr}");
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

fn env_port(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
