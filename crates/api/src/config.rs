//! Process configuration, read from the environment.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use safeaid_infra::BootstrapAdmin;

const DEV_JWT_SECRET: &str = "dev-secret";
const DEV_FIELD_KEY: &str = "dev-field-encryption-key";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// `max` requests per client per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max: NonZeroU32,
    pub window: Duration,
}

#[derive(Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub field_encryption_key: String,
    pub token_ttl: chrono::Duration,
    pub login_rate_limit: RateLimitSettings,
    pub api_rate_limit: RateLimitSettings,
    pub cors_origin: String,
    /// Peers whose `X-Forwarded-For`/`X-Real-IP` headers name the client.
    pub trusted_proxies: Vec<IpAddr>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub database_url: Option<String>,
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("login_rate_limit", &self.login_rate_limit)
            .field("api_rate_limit", &self.api_rate_limit)
            .field("cors_origin", &self.cors_origin)
            .field("trusted_proxies", &self.trusted_proxies)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Defaults for everything but the two secrets.
    pub fn new(jwt_secret: impl Into<String>, field_encryption_key: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            jwt_secret: jwt_secret.into(),
            field_encryption_key: field_encryption_key.into(),
            token_ttl: chrono::Duration::hours(168),
            login_rate_limit: RateLimitSettings {
                max: NonZeroU32::MIN.saturating_add(4),
                window: Duration::from_secs(900),
            },
            api_rate_limit: RateLimitSettings {
                max: NonZeroU32::MIN.saturating_add(99),
                window: Duration::from_secs(900),
            },
            cors_origin: "http://localhost:5173".to_string(),
            trusted_proxies: Vec::new(),
            bootstrap_admin: None,
            database_url: None,
        }
    }

    /// Read settings from the process environment (after loading `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });
        let field_key = get("FIELD_ENCRYPTION_KEY").unwrap_or_else(|| {
            warn!("FIELD_ENCRYPTION_KEY not set; using insecure dev default");
            DEV_FIELD_KEY.to_string()
        });

        let mut settings = Settings::new(jwt_secret, field_key);

        if let Some(bind) = get("SAFEAID_BIND") {
            settings.bind_addr = bind.parse().map_err(|_| ConfigError::Invalid {
                key: "SAFEAID_BIND",
                value: bind.clone(),
                reason: "expected host:port",
            })?;
        }
        if let Some(hours) = get("TOKEN_TTL_HOURS") {
            let hours = parse_positive("TOKEN_TTL_HOURS", &hours)?;
            settings.token_ttl = chrono::Duration::hours(i64::from(hours.get()));
        }

        settings.login_rate_limit = rate_limit(
            &get,
            "LOGIN_RATE_LIMIT_ATTEMPTS",
            "LOGIN_RATE_LIMIT_WINDOW_SECS",
            settings.login_rate_limit,
        )?;
        settings.api_rate_limit = rate_limit(
            &get,
            "API_RATE_LIMIT_REQUESTS",
            "API_RATE_LIMIT_WINDOW_SECS",
            settings.api_rate_limit,
        )?;

        if let Some(origin) = get("CORS_ORIGIN") {
            settings.cors_origin = origin;
        }
        if let Some(proxies) = get("TRUSTED_PROXIES") {
            settings.trusted_proxies = proxies
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    p.parse().map_err(|_| ConfigError::Invalid {
                        key: "TRUSTED_PROXIES",
                        value: p.to_string(),
                        reason: "expected a comma-separated list of IP addresses",
                    })
                })
                .collect::<Result<_, _>>()?;
        }

        settings.bootstrap_admin = match (get("BOOTSTRAP_ADMIN_EMAIL"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                username: get("BOOTSTRAP_ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Empty("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Empty("BOOTSTRAP_ADMIN_EMAIL")),
        };

        settings.database_url = get("DATABASE_URL");
        Ok(settings)
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<NonZeroU32, ConfigError> {
    raw.trim().parse::<NonZeroU32>().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: "expected a positive integer",
    })
}

fn rate_limit(
    get: &impl Fn(&str) -> Option<String>,
    max_key: &'static str,
    window_key: &'static str,
    default: RateLimitSettings,
) -> Result<RateLimitSettings, ConfigError> {
    let max = match get(max_key) {
        Some(raw) => parse_positive(max_key, &raw)?,
        None => default.max,
    };
    let window = match get(window_key) {
        Some(raw) => Duration::from_secs(u64::from(parse_positive(window_key, &raw)?.get())),
        None => default.window,
    };
    Ok(RateLimitSettings { max, window })
}
