//! Phone Restore - Entry point.

use anyhow::{anyhow, Context};
use notifier::{LogNotifier, MailCommandNotifier, Notifier, WebhookNotifier};
use phone_restore::{
    api::{create_router_with_limits, AppState, RateLimitState},
    config::{Config, NotifierConfig, NotifierKind},
    template::TemplateEngine,
};
use phone_vault::{EncryptedRepository, Repository};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log.level);

    info!("Starting Phone Restore");

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    // A missing or corrupt store document is fatal
    let repository = Repository::open(&config.store.path)
        .await
        .context("Failed to load client store")?;
    let vault = EncryptedRepository::new(repository);

    let templates = TemplateEngine::new(&config.templates.dir, &config.templates.layout)
        .await
        .context("Failed to load layout template")?;

    let notifier = build_notifier(&config.notifier)?;

    let state = AppState::new(vault, templates, notifier)
        .with_error_disclosure(config.responses.disclose_errors);

    let app = create_router_with_limits(
        state.clone(),
        RateLimitState::new(config.rate_limit.global_per_minute),
        config.server.max_body_bytes,
    );

    let ip = config
        .server
        .listen_addr
        .parse::<IpAddr>()
        .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?;
    let addr = SocketAddr::new(ip, config.server.port);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");

    // Final flush; a failure here is reported but does not block exit
    let vault = state.vault.read().await;
    match vault.save().await {
        Ok(()) => info!("Client store saved"),
        Err(e) => error!(error = %e, "Final save failed"),
    }

    Ok(())
}

fn build_notifier(config: &NotifierConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match config.kind {
        NotifierKind::Log => {
            info!("Restore notifications are logged only");
            Arc::new(LogNotifier)
        }
        NotifierKind::Mail => {
            info!(program = %config.mail_program, "Restore notifications go through mail command");
            Arc::new(MailCommandNotifier::new(&config.mail_program))
        }
        NotifierKind::Webhook => {
            let url = config
                .webhook_url
                .as_deref()
                .ok_or_else(|| anyhow!("NOTIFIER__WEBHOOK_URL is required for the webhook notifier"))?;
            let webhook = WebhookNotifier::new(url).context("Failed to create webhook notifier")?;
            info!(url = %webhook.url(), "Restore notifications go to webhook");
            Arc::new(webhook)
        }
    };

    Ok(notifier)
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
