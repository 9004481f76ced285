use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Session token signing
    pub jwt: JwtAuthConfig,
    /// Registration and verification policy
    #[serde(default)]
    pub auth: AuthConfig,
    /// Outbound email
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// Generative-text service used for page summaries
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(cfg: &DatabaseConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            max_connections: cfg.max_connections,
            min_connections: cfg.min_connections,
            connect_timeout_secs: cfg.connect_timeout_secs,
            idle_timeout_secs: cfg.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Allowed browser origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Per-user request budget. 0 disables rate limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// HMAC secret, at least 32 bytes
    pub secret: String,

    /// Session lifetime (default: 2592000 = 30 days)
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: i64,

    /// Clock skew tolerance for `exp`
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// When true, new accounts must confirm their email before logging in.
    #[serde(default = "default_true")]
    pub require_email_verification: bool,

    #[serde(default = "default_verification_ttl_hours")]
    pub verification_token_ttl_hours: i64,

    #[serde(default = "default_invite_expiry_days")]
    pub invite_expiry_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_email_verification: true,
            verification_token_ttl_hours: default_verification_ttl_hours(),
            invite_expiry_days: default_invite_expiry_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// When false, messages are only logged.
    #[serde(default)]
    pub enabled: bool,

    /// `console` or `sendgrid`
    #[serde(default = "default_email_provider")]
    pub provider: String,

    #[serde(default)]
    pub sendgrid_api_key: String,

    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Frontend origin used for the sign-up link in invites
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Public origin of this API. Verification links open
    /// `{api_base_url}/api/auth/verifyemail/:token` directly.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            sendgrid_api_key: String::new(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            base_url: default_base_url(),
            api_base_url: default_api_base_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryConfig {
    /// Enables `POST /api/inventory/return`.
    #[serde(default)]
    pub returns_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    /// Empty disables summaries (503).
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_summarizer_model")]
    pub model: String,

    #[serde(default = "default_summarizer_base_url")]
    pub base_url: String,

    #[serde(default = "default_summarizer_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_summarizer_model(),
            base_url: default_summarizer_base_url(),
            timeout_ms: default_summarizer_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    120
}
fn default_token_expiry() -> i64 {
    2_592_000
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_verification_ttl_hours() -> i64 {
    24
}
fn default_invite_expiry_days() -> i64 {
    domain::models::invite::DEFAULT_INVITE_EXPIRY_DAYS
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_sender_email() -> String {
    "noreply@cicr.club".to_string()
}
fn default_sender_name() -> String {
    "CICR Connect".to_string()
}
fn default_base_url() -> String {
    "http://localhost:5173".to_string()
}
fn default_api_base_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_summarizer_model() -> String {
    "gemini-pro".to_string()
}
fn default_summarizer_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_summarizer_timeout_ms() -> u64 {
    15_000
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Loads configuration, later sources overriding earlier ones:
    /// 1. config/default.toml
    /// 2. config/local.toml (optional, not in git)
    /// 3. Environment variables with the CICR__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("CICR")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Builds a config from embedded defaults plus overrides, without files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 5000
            request_timeout_secs = 30

            [database]
            url = ""

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 120

            [jwt]
            secret = "test-secret-that-is-at-least-32-bytes-long"
            token_expiry_secs = 2592000
            leeway_secs = 30
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "CICR__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.jwt.secret.len() < shared::jwt::MIN_SECRET_LEN {
            return Err(ConfigValidationError::InvalidValue(format!(
                "CICR__JWT__SECRET must be at least {} bytes",
                shared::jwt::MIN_SECRET_LEN
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.email.enabled
            && self.email.provider == "sendgrid"
            && self.email.sendgrid_api_key.is_empty()
        {
            return Err(ConfigValidationError::MissingRequired(
                "email.sendgrid_api_key is required for the sendgrid provider".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
