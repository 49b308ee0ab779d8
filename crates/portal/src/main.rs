//! Coding Sprout portal service entry point.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sprout_payments::HttpCheckoutClient;
use sprout_portal::config::Config;
use sprout_portal::notify::{EmailSender, HttpEmailSender, LogEmailSender};
use sprout_portal::registration::RegistrationService;
use sprout_portal::settlement::Settlement;
use sprout_portal::sponsorship::SponsorshipService;
use sprout_portal::storage::Storage;
use sprout_portal::{create_router, AppState};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sprout_portal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    info!("Starting Coding Sprout portal");

    let config = Config::from_env().context("Failed to load configuration")?;

    let storage = Storage::connect(&config.database_url)
        .await
        .context("Failed to open database")?;
    storage.migrate().await.context("Failed to run migrations")?;
    info!("Database ready: {}", config.database_url);

    let checkout = Arc::new(HttpCheckoutClient::new(
        config.checkout_api_url.clone(),
        config.checkout_secret_key.clone(),
    ));
    let email: Arc<dyn EmailSender> = match &config.email_api_url {
        Some(url) => Arc::new(HttpEmailSender::new(
            url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
        )),
        None => {
            warn!("No email provider configured; emails will be logged only");
            Arc::new(LogEmailSender)
        }
    };

    let registrations = RegistrationService::new(
        storage.clone(),
        checkout.clone(),
        email.clone(),
        config.base_url.clone(),
    );
    let sponsorships = SponsorshipService::new(checkout, config.base_url.clone());
    let settlement = Settlement::new(storage.clone(), email.clone());

    spawn_pending_sweeper(
        storage.clone(),
        config.pending_ttl_minutes,
        config.sweep_interval_secs,
    );

    let address = format!("{}:{}", config.host, config.port);
    let app = create_router(AppState {
        storage,
        registrations,
        sponsorships,
        settlement,
        email,
        config,
    });

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;
    info!("Coding Sprout portal listening on {}", address);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Periodically deletes abandoned card registrations and releases their
/// seat holds. Charter rows are exempt; only an admin decision moves them.
fn spawn_pending_sweeper(storage: Storage, ttl_minutes: i64, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(StdDuration::from_secs(interval_secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let cutoff = Utc::now() - Duration::minutes(ttl_minutes);
            match storage.expire_stale_pending(cutoff).await {
                Ok(0) => {}
                Ok(count) => info!("Expired {} stale pending registrations", count),
                Err(e) => error!("Pending sweep failed: {}", e),
            }
        }
    });
}
