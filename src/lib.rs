pub mod accounts;
pub mod analysis;
pub mod api;
pub mod chart;
pub mod config;
pub mod db;
pub mod delivery;
pub mod diagnosis;
pub mod report;
pub mod session;
pub mod wells;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::accounts::AccountStore;
use crate::api::{ApiContext, DatasetSource};
use crate::config::AppConfig;
use crate::delivery::{ReportMailer, SmtpMailer};
use crate::diagnosis::{GeminiClient, TextGenerator};
use crate::report::ReportFont;
use crate::session::SessionStore;

/// Anything that stops the service from coming up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("Cannot load dataset: {0}")]
    Dataset(#[from] wells::DatasetError),
    #[error(transparent)]
    Report(#[from] report::ReportError),
    #[error("Cannot open account store: {0}")]
    Accounts(#[from] accounts::AccountError),
    #[error("Cannot create text-generation client: {0}")]
    Diagnosis(#[from] diagnosis::DiagnosisError),
    #[error("Startup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Server(String),
}

/// Load configuration, open every dependency and serve the API until
/// Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let (ctx, config) =
        tokio::task::spawn_blocking(move || build_context(&config).map(|ctx| (ctx, config)))
            .await??;

    let server = api::start_api_server(ctx.clone(), config.bind_addr)
        .await
        .map_err(StartupError::Server)?;
    tracing::info!(addr = %server.addr, "Listening");

    wait_for_shutdown(server).await;

    // The blocking HTTP client must not be dropped on an async worker.
    tokio::task::spawn_blocking(move || drop(ctx)).await?;
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}

async fn wait_for_shutdown(mut server: api::ApiServer) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.wait().await;
}

/// Open the dataset, font, account store and outbound clients. Blocking.
fn build_context(config: &AppConfig) -> Result<ApiContext, StartupError> {
    let datasets = DatasetSource::open(config.dataset_path.clone())?;

    let font = ReportFont::load(&config.font_path)?;
    if let Err(e) = chart::install_font(font.bytes().to_vec()) {
        tracing::warn!(error = %e, "Chart titles disabled: font could not be registered");
    }

    let accounts = AccountStore::open(&config.database_path, config.password_hash_rounds)?;

    let gemini = GeminiClient::new(&config.gemini)?;
    if !gemini.is_configured() {
        tracing::warn!("GEMINI_API_KEY not set; diagnoses will report failure");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(gemini);

    let mailer: Option<Arc<dyn ReportMailer>> = match SmtpMailer::new(&config.smtp) {
        Ok(mailer) => Some(Arc::new(mailer)),
        Err(delivery::DeliveryError::NotConfigured) => {
            tracing::warn!("EMAIL_ADDRESS/EMAIL_PASSWORD not set; email delivery disabled");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Email delivery disabled");
            None
        }
    };

    Ok(ApiContext {
        accounts: Arc::new(accounts),
        sessions: Arc::new(SessionStore::new(Duration::from_secs(config.session_idle_secs))),
        datasets: Arc::new(datasets),
        generator,
        mailer,
        font: Arc::new(font),
    })
}
