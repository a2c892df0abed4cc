//! Inkwell server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use inkwell_api::{AppState, SessionManager, app};
use inkwell_common::{Config, LocalStorage};
use inkwell_core::{
    CommentService, FeedService, LikeService, LocalImageStore, PasswordResetService, PostService,
    UserService, mailer_from_config,
};
use inkwell_db::repositories::{
    CommentRepository, LikeRepository, PostRepository, UserRepository,
};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
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
            Ok(mut stream) => {
                stream.recv().await;
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "inkwell=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_state(config: &Config, db: Arc<sea_orm::DatabaseConnection>) -> anyhow::Result<AppState> {
    let user_repo = UserRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(db);

    let mailer = mailer_from_config(&config.mail)?;
    let image_store = Arc::new(LocalImageStore::new(LocalStorage::new(
        config.storage.profile_pics_path.clone(),
    )));

    Ok(AppState {
        user_service: UserService::new(user_repo.clone(), image_store),
        post_service: PostService::new(post_repo.clone(), comment_repo.clone(), like_repo.clone()),
        comment_service: CommentService::new(comment_repo, post_repo.clone()),
        like_service: LikeService::new(like_repo, post_repo.clone()),
        feed_service: FeedService::new(post_repo, user_repo.clone(), config.feed.page_size),
        password_reset_service: PasswordResetService::new(
            user_repo,
            &config.auth.secret_key,
            mailer,
            config.auth.reset_token_ttl_secs,
        ),
        sessions: SessionManager::new(&config.auth),
        server_url: config.server.url.clone(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.server.log_format);

    info!("Starting inkwell server...");

    let db = inkwell_db::init(&config)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    info!("Running database migrations...");
    inkwell_db::migrate(&db).await?;
    info!("Migrations completed");

    let state = build_state(&config, Arc::new(db))?;
    let router = app(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.server.host, config.server.port))?;
    info!(%addr, url = %config.server.url, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}
