use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cal: CalConfig,
    pub stripe: StripeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_hours: i64,
}

/// Cal.com scheduling integration. The webhook secret is the shared
/// HMAC key configured on the Cal.com webhook subscription.
#[derive(Debug, Deserialize, Clone)]
pub struct CalConfig {
    pub webhook_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
}

impl Settings {
    /// Load settings from config files and TUTELAGE__ environment
    /// variables. Secrets (cal.webhook_secret, stripe.*) have no
    /// defaults: a missing value fails deserialization, which the
    /// binary treats as fatal at startup.
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://tutelage.db")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_hours", 24)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with TUTELAGE__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("TUTELAGE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Settings {
    /// Fixed settings for tests; nothing here reaches a real provider.
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            auth: AuthConfig {
                session_duration_hours: 24,
            },
            cal: CalConfig {
                webhook_secret: "cal-test-secret".to_string(),
            },
            stripe: StripeConfig {
                secret_key: "sk_test_placeholder".to_string(),
                webhook_secret: "whsec_placeholder".to_string(),
            },
        }
    }
}
