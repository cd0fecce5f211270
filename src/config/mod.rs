//! Configuration module for the SignDesk Gateway
//!
//! Handles loading configuration from environment variables and config files.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream document/user/company API
    pub upstream: UpstreamConfig,
    /// Session cookie settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Page routing (locales, public paths, admin prefix)
    #[serde(default)]
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the web app (used for absolute links and CORS)
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// `production` turns on the `Secure` cookie attribute
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Directory holding the built page shell and static assets
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Hard limit for a whole inbound request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the upstream API, e.g. https://api.example.com/api
    pub base_url: String,
    /// Per-call timeout
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
    /// Fixed key for the unauthenticated signed PDF endpoint
    pub public_pdf_api_key: Option<String>,
    /// Shared-secret pair for super user provisioning
    pub super_user_name: Option<String>,
    pub super_user_password: Option<String>,
    /// Returns the caller's own profile and roles for a bearer token
    #[serde(default = "default_current_user_path")]
    pub current_user_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Cookie lifetime in seconds
    #[serde(default = "default_session_max_age")]
    pub max_age_secs: i64,
    /// Keep the bearer token out of reach of page scripts
    #[serde(default = "default_token_http_only")]
    pub token_http_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Supported locale codes, matched against the first path segment
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Pages reachable without a session (logical paths, prefix match)
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_current_user_path() -> String {
    "UserAuth/User/GetCurrentUser".to_string()
}

fn default_session_max_age() -> i64 {
    60 * 60 * 24 * 7 // one week
}

fn default_token_http_only() -> bool {
    true
}

fn default_locales() -> Vec<String> {
    vec!["tr".to_string(), "en".to_string()]
}

fn default_locale() -> String {
    "tr".to_string()
}

fn default_public_paths() -> Vec<String> {
    vec![
        "/register".to_string(),
        "/forgot-password".to_string(),
        "/reset-password".to_string(),
        "/sign".to_string(),
    ]
}

fn default_admin_prefix() -> String {
    "/admin".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_dashboard_path() -> String {
    "/dashboard".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            environment: default_environment(),
            static_dir: default_static_dir(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_upstream_timeout(),
            public_pdf_api_key: None,
            super_user_name: None,
            super_user_password: None,
            current_user_path: default_current_user_path(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_session_max_age(),
            token_http_only: default_token_http_only(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            locales: default_locales(),
            default_locale: default_locale(),
            public_paths: default_public_paths(),
            admin_prefix: default_admin_prefix(),
            login_path: default_login_path(),
            dashboard_path: default_dashboard_path(),
        }
    }
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl AppConfig {
    /// Load configuration from environment and config files
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            // Set defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("server.public_url", default_public_url())?
            .set_default("server.environment", default_environment())?
            .set_default("server.static_dir", default_static_dir())?
            .set_default("server.request_timeout_secs", default_request_timeout())?
            .set_default("upstream.timeout_secs", default_upstream_timeout())?
            .set_default("upstream.current_user_path", default_current_user_path())?
            .set_default("session.max_age_secs", default_session_max_age())?
            .set_default("session.token_http_only", default_token_http_only())?
            .set_default("routing.locales", default_locales())?
            .set_default("routing.default_locale", default_locale())?
            .set_default("routing.public_paths", default_public_paths())?
            // Load from config file if exists
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Override with environment variables (SIGNDESK_ prefix)
            .add_source(
                config::Environment::with_prefix("SIGNDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        url::Url::parse(&self.upstream.base_url).map_err(|e| {
            config::ConfigError::Message(format!(
                "upstream.base_url '{}' is not a valid URL: {}",
                self.upstream.base_url, e
            ))
        })?;

        if !self.routing.locales.contains(&self.routing.default_locale) {
            return Err(config::ConfigError::Message(format!(
                "routing.default_locale '{}' is not one of {:?}",
                self.routing.default_locale, self.routing.locales
            )));
        }

        Ok(())
    }
}

/// Shared application state
///
/// Holds no per-user data: the bearer token travels with each upstream call.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, anyhow::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("SignDesk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.upstream.timeout_secs))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    /// `Secure` cookie attribute is only set in production
    pub fn secure_cookies(&self) -> bool {
        self.config.server.is_production()
    }
}
