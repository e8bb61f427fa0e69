//! [`Config`]-related definitions.

use std::{path::PathBuf, time};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::SecretString;
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Uploaded documents storage configuration.
    pub storage: Storage,

    /// Payment gateway configuration.
    pub payment: Payment,

    /// SMTP configuration.
    pub smtp: Smtp,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] configuration.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    pub jwt: Jwt,

    /// Service tasks configuration.
    pub tasks: Tasks,

    /// Email verification configuration.
    pub verification: Verification,

    /// Processing speed of refunds for cancelled tickets, either `normal`
    /// or `optimum`.
    pub refund_speed: service::domain::payment::RefundSpeed,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        use secrecy::ExposeSecret as _;

        let Service {
            jwt,
            tasks:
                Tasks {
                    expire_tickets,
                    evict_verification_codes,
                },
            verification,
            refund_speed,
        } = value;
        Self {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt.secret.expose_secret().as_bytes(),
            ),
            expire_tickets: service::task::expire_tickets::Config {
                interval: expire_tickets.interval,
            },
            evict_verification_codes:
                service::task::evict_verification_codes::Config {
                    interval: evict_verification_codes.interval,
                },
            verification_code_ttl: verification.code_ttl,
            refund_speed,
        }
    }
}

/// [JWT] configuration.
///
/// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Jwt {
    /// Secret the sessions are signed with.
    #[default(SecretString::from("secret"))]
    pub secret: SecretString,
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `ExpireTickets` task configuration.
    pub expire_tickets: Task,

    /// `EvictVerificationCodes` task configuration.
    pub evict_verification_codes: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Email verification configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Verification {
    /// Lifetime of an issued verification code.
    #[default(time::Duration::from_secs(5 * 60))]
    #[serde(with = "humantime_serde")]
    pub code_ttl: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Uploaded documents storage configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Storage {
    /// Directory to store the uploaded documents in.
    #[default(PathBuf::from("uploads"))]
    pub root: PathBuf,
}

/// Payment gateway configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Payment {
    /// Base URL of the gateway API.
    #[default(service::infra::payment::Razorpay::DEFAULT_URL.to_owned())]
    pub url: String,

    /// Key ID to authenticate with.
    pub key_id: String,

    /// Key secret to authenticate with.
    #[default(SecretString::from(""))]
    pub key_secret: SecretString,
}

/// SMTP configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Smtp {
    /// Indicator whether emails are actually sent, rather than logged.
    pub enabled: bool,

    /// Host of the SMTP relay.
    #[default("smtp.gmail.com".to_owned())]
    pub host: String,

    /// Port of the SMTP relay.
    #[default(587)]
    pub port: u16,

    /// User to authenticate as.
    pub username: String,

    /// Password to authenticate with.
    #[default(SecretString::from(""))]
    pub password: SecretString,

    /// Address the emails are sent from.
    #[default("no-reply@localhost".to_owned())]
    pub sender: String,
}

impl TryFrom<Smtp> for service::infra::notification::Smtp {
    type Error = tracerr::Traced<service::infra::notification::Error>;

    fn try_from(value: Smtp) -> Result<Self, Self::Error> {
        let Smtp {
            enabled,
            host,
            port,
            username,
            password,
            sender,
        } = value;

        if enabled {
            Self::new(&host, port, username, &password, &sender)
        } else {
            Self::disabled(&sender)
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use secrecy::ExposeSecret as _;

    use super::Config;

    #[test]
    fn defaults_without_file() {
        let config = Config::new("definitely-missing.toml").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.postgres.dbname, "postgres");
        assert_eq!(
            config.service.tasks.expire_tickets.interval,
            Duration::from_secs(60),
        );
        assert_eq!(
            config.service.verification.code_ttl,
            Duration::from_secs(300),
        );
        assert_eq!(config.service.jwt.secret.expose_secret(), "secret");
        assert!(!config.smtp.enabled);
    }
}
