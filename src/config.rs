use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "ScadaAssist";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Gemini `generateContent` endpoint used when `GEMINI_ENDPOINT` is unset.
pub const DEFAULT_GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
const DEFAULT_DATASET_PATH: &str = "scada_dataset.csv";
const DEFAULT_FONT_PATH: &str = "DejaVuSans.ttf";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;
pub const DEFAULT_PASSWORD_HASH_ROUNDS: u32 = 600_000;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,scada_assist_lib=debug"
}

/// Get the application data directory (~/ScadaAssist/).
///
/// Falls back to the working directory when no home directory exists
/// (service accounts in containers).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite file for the account store.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("scada.db")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Credentials for the text-generation endpoint.
#[derive(Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// SMTP settings. Email delivery is disabled unless both address and
/// password are present.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "sender",
                &self.credentials.as_ref().map(|(address, _)| address.as_str()),
            )
            .finish()
    }
}

/// Runtime configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub dataset_path: PathBuf,
    pub database_path: PathBuf,
    pub font_path: PathBuf,
    pub gemini: GeminiConfig,
    pub smtp: SmtpConfig,
    pub session_idle_secs: u64,
    pub password_hash_rounds: u32,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = get("SCADA_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "SCADA_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let database_path = match get("DATABASE_URL") {
            Some(url) => database_path_from_url(&url)?,
            None => default_database_path(),
        };

        let credentials = match (get("EMAIL_ADDRESS"), get("EMAIL_PASSWORD")) {
            (Some(address), Some(password)) => Some((address, password)),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            dataset_path: get("SCADA_DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH)),
            database_path,
            font_path: get("REPORT_FONT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_PATH)),
            gemini: GeminiConfig {
                endpoint: get("GEMINI_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
                api_key: get("GEMINI_API_KEY"),
                timeout_secs: parse_or(&get, "GEMINI_TIMEOUT_SECS", DEFAULT_GEMINI_TIMEOUT_SECS)?,
            },
            smtp: SmtpConfig {
                host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port: parse_or(&get, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                credentials,
            },
            session_idle_secs: parse_or(&get, "SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)?,
            password_hash_rounds: parse_or(
                &get,
                "PASSWORD_HASH_ROUNDS",
                DEFAULT_PASSWORD_HASH_ROUNDS,
            )?,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

/// Accepts `sqlite://path`, `sqlite:path` or a bare filesystem path.
///
/// Any other URL scheme (`postgresql://...`) is rejected; only the scheme is
/// echoed back so credentials in the URL never reach the logs.
fn database_path_from_url(url: &str) -> Result<PathBuf, ConfigError> {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    // Two or more characters, so `C:\data\scada.db` stays a path.
    let scheme = SCHEME.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]+):").expect("static regex")
    });

    if let Some(path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
    {
        return Ok(PathBuf::from(path));
    }
    if let Some(caps) = scheme.captures(url) {
        return Err(ConfigError::InvalidValue {
            key: "DATABASE_URL",
            value: format!("unsupported scheme {:?} (expected sqlite)", &caps[1]),
        });
    }
    Ok(PathBuf::from(url))
}
