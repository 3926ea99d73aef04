//! # Modboard Binary
//!
//! The entry point that assembles the application based on compile-time
//! features, then serves the moderation API.

mod config;

use actix_web::{web, App, HttpServer};
use config::{Config, StorageMode};
use mb_api::handlers::AppState;
use mb_api::middleware;
use mb_core::traits::AttachmentStore;
use std::sync::Arc;

// Feature-gated imports: this is the "compiled-to-order" assembly
#[cfg(feature = "db-sqlite")]
use mb_db_sqlite::SqliteRepo;

#[cfg(feature = "storage-local")]
use mb_storage_local::{DiskAttachmentStore, MemoryAttachmentStore};

#[cfg(feature = "auth-jwt")]
use mb_auth_jwt::JwtAuthProvider;

#[cfg(feature = "notify-smtp")]
use mb_notify_smtp::SmtpNotifier;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env()?;

    // 1. Persistence
    #[cfg(feature = "db-sqlite")]
    let repo = Arc::new(SqliteRepo::new(&config.database_url).await?);

    // 2. Attachment storage: one strategy for the whole process lifetime
    #[cfg(feature = "storage-local")]
    let store: Arc<dyn AttachmentStore> = match config.storage_mode {
        StorageMode::Disk => Arc::new(DiskAttachmentStore::new(config.upload_dir.clone())),
        StorageMode::Memory => Arc::new(MemoryAttachmentStore),
    };

    // 3. Auth
    #[cfg(feature = "auth-jwt")]
    let auth = Arc::new(JwtAuthProvider::new(&config.jwt_secret));

    // 4. Mail
    #[cfg(feature = "notify-smtp")]
    let notifier = Arc::new(SmtpNotifier::new(
        &config.smtp_host,
        config.smtp_username.clone(),
        config.smtp_password.clone(),
        &config.mail_from,
        &config.operator_email,
    )?);

    // 5. Wrap in AppState (dynamic dispatch so plugins stay swappable)
    let state = web::Data::new(AppState {
        repo: repo.clone(),
        admins: repo,
        auth,
        store,
        notifier,
    });

    log::info!(
        "modboard starting on http://{} ({:?} attachment storage)",
        config.bind_addr,
        config.storage_mode
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .configure(mb_api::configure_routes)
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}
