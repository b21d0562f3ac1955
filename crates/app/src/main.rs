use quiz_api::config::Config;
use quiz_api::logging::init_tracing;
use quiz_api::{AppServices, build_router};
use services::Clock;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    init_tracing(&config.log_level);

    if config.uses_dev_secret() {
        tracing::warn!("SECRET_KEY not set; using the development default");
    }

    let auth = config.auth_settings();
    let services = match AppServices::new_sqlite(&config.database_url, Clock::default(), &auth)
        .await
    {
        Ok(services) => services,
        Err(err) => {
            tracing::error!(
                error = %err,
                db = %config.database_url,
                "storage initialization failed"
            );
            std::process::exit(1);
        }
    };

    let app = build_router(services, &config);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "bind failed");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, project = %config.project_name, "listening");

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server error");
    }
    tracing::info!("server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
