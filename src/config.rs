use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Fallback backend URL used outside production (the portfolio API on its dev port).
pub const LOCAL_API_URL: &str = "http://localhost:5000/api/v1";

/// AppConfig
///
/// Holds the dashboard's entire configuration. Loaded once at startup and cloned into
/// the `Dashboard` context; nothing mutates it afterwards.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects the log format and whether the API URL may default.
    pub env: Env,
    // Base URL of the portfolio REST API, without a trailing slash.
    pub api_url: String,
    // Minimum time the bootstrap keeps `loading` set. Purely cosmetic (branding splash).
    pub splash_delay: Duration,
    // Per-request timeout applied by the HTTP backend.
    pub request_timeout: Duration,
    // Page sizes for each resource panel.
    pub page_limits: PageLimits,
    // Where the route guard sends unauthenticated visitors.
    pub login_path: String,
    // Optional credentials the binary signs in with before bootstrapping.
    pub credentials: Option<(String, String)>,
}

/// Env
///
/// Defines the runtime context. `Production` demands explicit configuration and emits
/// JSON logs; `Local` tolerates defaults and logs for humans.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// PageLimits
///
/// The `limit` each panel requests per page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub blogs: u32,
    pub projects: u32,
    pub users: u32,
    pub messages: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            blogs: 5,
            projects: 5,
            users: 10,
            messages: 10,
        }
    }
}

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-failing values for tests: local env, no splash delay, local API URL.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_url: LOCAL_API_URL.to_string(),
            splash_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(30),
            page_limits: PageLimits::default(),
            login_path: "/login".to_string(),
            credentials: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (a `.env` file is loaded by the
    /// binary beforehand).
    ///
    /// # Errors
    /// `ConfigError::Missing` if `PORTFOLIO_API_URL` is absent in production, and
    /// `ConfigError::Invalid` if a numeric variable does not parse.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        // The backend URL is mandatory in production; local runs fall back to the dev API.
        let api_url = match (env, env::var("PORTFOLIO_API_URL")) {
            (_, Ok(url)) if !url.trim().is_empty() => url,
            (Env::Production, _) => return Err(ConfigError::Missing("PORTFOLIO_API_URL")),
            (Env::Local, _) => LOCAL_API_URL.to_string(),
        };

        let splash_delay = Duration::from_millis(read_number("SPLASH_DELAY_MS", 0)?);
        let request_timeout = Duration::from_secs(read_number("REQUEST_TIMEOUT_SECS", 30)?);

        let credentials = match (env::var("DASHBOARD_EMAIL"), env::var("DASHBOARD_PASSWORD")) {
            (Ok(email), Ok(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            env,
            api_url: api_url.trim_end_matches('/').to_string(),
            splash_delay,
            request_timeout,
            page_limits: PageLimits::default(),
            login_path: "/login".to_string(),
            credentials,
        })
    }
}

fn read_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
