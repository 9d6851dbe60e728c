//! bookings server binary

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use bookings::api;
use bookings::config::Config;
use bookings::db::{PgRepository, postgres};
use bookings::email::{LogMailer, MailQueue, MailWorker};
use bookings::render::Renderer;
use bookings::session::{self, EXPIRED_SWEEP_INTERVAL};
use bookings::state::{AppState, MailSettings};
use clap::Parser;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How long queued mail may take to drain on shutdown
const MAIL_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookings=info,tower_http=info".into()),
        )
        .init();

    let config = Config::parse();
    if let Err(e) = config.validate() {
        eprintln!("bookings: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("bookings stopped: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), BoxError> {
    tracing::info!(
        production = config.production,
        template_cache = config.use_cache,
        "Starting bookings"
    );

    // Templates are checked before anything listens
    let renderer = Renderer::new(&config.template_dir, config.use_cache)?;
    renderer.verify_pages(api::PAGES)?;

    tracing::info!("Connecting to database...");
    let pool = postgres::connect(&config).await?;
    tracing::info!("Connected to database");

    let sessions = session::postgres_store(pool.clone()).await?;
    let sweeper = tokio::spawn(session::sweep_expired(
        sessions.clone(),
        EXPIRED_SWEEP_INTERVAL,
    ));

    // Mail worker owns the receiving end; it stops once every sender is gone
    let (mail, mail_rx) = MailQueue::new(config.mail_queue_capacity);
    let worker = MailWorker::new(Arc::new(LogMailer), &config.email_template_dir);
    let mail_handle = tokio::spawn(worker.run(mail_rx));

    let state = AppState::new(
        Arc::new(PgRepository::new(pool.clone())),
        renderer,
        mail,
        MailSettings {
            from: config.mail_from.clone(),
            owner: config.owner_email.clone(),
        },
    )
    .with_production(config.production)
    .with_asset_dir(&config.asset_dir);

    let app = api::create_router(state, sessions);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("bookings listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router and its mail senders are gone; let the worker finish
    match tokio::time::timeout(MAIL_DRAIN_TIMEOUT, mail_handle).await {
        Ok(Ok(sent)) => tracing::info!(sent, "Mail worker drained"),
        Ok(Err(e)) => tracing::error!("Mail worker panicked: {e}"),
        Err(_) => tracing::warn!("Mail worker did not drain in time"),
    }

    sweeper.abort();
    pool.close().await;
    tracing::info!("bookings stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
