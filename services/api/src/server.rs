use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAcceptanceRepository, InMemoryDirectory, InMemoryVideoCatalog,
};
use crate::routes::with_api_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use masar::auth::TokenVerifier;
use masar::catalog::VideoCatalogService;
use masar::config::AppConfig;
use masar::directory::{ensure_admin, DirectorySeed, SeedError, TeacherDirectory};
use masar::error::AppError;
use masar::notifications::{LoggingWhatsAppSink, NotificationDispatcher};
use masar::selection::SelectionEngine;
use masar::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let directory = Arc::new(InMemoryDirectory::default());
    if let Some(path) = args.seed.take() {
        let summary = DirectorySeed::from_path(&path)?.apply(directory.as_ref())?;
        info!(
            path = %path.display(),
            registered = summary.registered,
            skipped = summary.skipped,
            "directory seeded"
        );
    }
    ensure_admin(directory.as_ref(), &config.admin).map_err(SeedError::from)?;

    let notifier = NotificationDispatcher::spawn(Arc::new(LoggingWhatsAppSink));
    let engine = Arc::new(SelectionEngine::new(
        directory.clone(),
        Arc::new(InMemoryAcceptanceRepository::default()),
        notifier.clone(),
        config.admin.clone(),
    ));
    let catalog = Arc::new(VideoCatalogService::new(
        directory.clone(),
        Arc::new(InMemoryVideoCatalog::default()),
    ));
    let teachers = Arc::new(TeacherDirectory::new(directory));
    let verifier = Arc::new(TokenVerifier::new(&config.auth.jwt_secret));

    let app = with_api_routes(engine, catalog, teachers, verifier)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "masar api ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    notifier.flush().await;
    info!("masar api stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(%err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(%err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
