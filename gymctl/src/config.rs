//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `GYMCTL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `GYMCTL_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `GYMCTL_AUTH__SECURITY__JWT_EXPIRY=12h` sets the `auth.security.jwt_expiry` field.

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short = 'f', long, env = "GYMCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate the configuration and exit
    #[arg(long)]
    pub validate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub host: String,
    pub port: u16,

    /// Raw DATABASE_URL override, takes precedence over `database.url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,

    /// Username for the initial admin account, seeded idempotently at startup
    pub admin_username: String,
    /// Password for the initial admin account. When unset an existing admin
    /// keeps its password; a fresh database gets an admin that cannot log in
    /// until a password is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,

    /// Secret used to sign session tokens. Required when native auth is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    pub auth: AuthConfig,
    pub billing: BillingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            database: DatabaseConfig::default(),
            admin_username: "admin".to_string(),
            admin_password: None,
            secret_key: None,
            auth: AuthConfig::default(),
            billing: BillingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/gymctl".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub native: NativeAuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeAuthConfig {
    pub enabled: bool,
    pub session: SessionConfig,
}

impl Default for NativeAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "gymctl_session".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Session token lifetime. Also used as the session cookie Max-Age.
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    pub cors: CorsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(24 * 3600),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    pub allow_credentials: bool,
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age: Duration::from_secs(3600),
        }
    }
}

/// Either `"*"` or a concrete origin URL
#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigin {
    Wildcard,
    Url(Url),
}

impl Serialize for CorsOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CorsOrigin::Wildcard => serializer.serialize_str("*"),
            CorsOrigin::Url(url) => serializer.serialize_str(url.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "*" {
            Ok(CorsOrigin::Wildcard)
        } else {
            Url::parse(&s)
                .map(CorsOrigin::Url)
                .map_err(|e| serde::de::Error::custom(format!("invalid CORS origin '{s}': {e}")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    /// List-price admission fee recorded on new members
    pub admission_fee_default: i64,
    /// Prefix for suggested member ids (e.g. GM -> GM20260001)
    pub member_id_prefix: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            admission_fee_default: 2000,
            member_id_prefix: "GM".to_string(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, Error> {
        let config: Config = Self::figment(&args.config).extract().map_err(|e| Error::Internal {
            operation: format!("load configuration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_path: &str) -> Figment {
        Figment::new()
            .merge(Yaml::file(config_path))
            .merge(Env::prefixed("GYMCTL_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    /// Effective database URL: env override wins
    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(&self.database.url)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.native.enabled && self.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "validate configuration: secret_key is required when native auth is enabled".to_string(),
            });
        }

        let expiry = self.auth.security.jwt_expiry;
        if expiry < Duration::from_secs(5 * 60) || expiry > Duration::from_secs(30 * 24 * 3600) {
            return Err(Error::Internal {
                operation: "validate configuration: auth.security.jwt_expiry must be between 5 minutes and 30 days".to_string(),
            });
        }

        let cors = &self.auth.security.cors;
        if cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "validate configuration: auth.security.cors.allowed_origins must not be empty".to_string(),
            });
        }
        if cors.allow_credentials && cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
            return Err(Error::Internal {
                operation: "validate configuration: CORS cannot combine a wildcard origin with allow_credentials".to_string(),
            });
        }

        if self.billing.admission_fee_default < 0 {
            return Err(Error::Internal {
                operation: "validate configuration: billing.admission_fee_default must not be negative".to_string(),
            });
        }
        if self.billing.member_id_prefix.is_empty() {
            return Err(Error::Internal {
                operation: "validate configuration: billing.member_id_prefix must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            secret_key: Some("a-secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_load_from_empty_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "")?;

            let config: Config = Config::figment("config.yaml").extract()?;
            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 3000);
            assert_eq!(config.admin_username, "admin");
            assert_eq!(config.billing.admission_fee_default, 2000);
            assert_eq!(config.billing.member_id_prefix, "GM");
            assert!(config.auth.native.enabled);
            Ok(())
        });
    }

    #[test]
    fn test_yaml_values_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                port: 8080
                secret_key: file-secret
                billing:
                  member_id_prefix: BD
                auth:
                  security:
                    jwt_expiry: 12h
                "#,
            )?;

            let config: Config = Config::figment("config.yaml").extract()?;
            assert_eq!(config.port, 8080);
            assert_eq!(config.secret_key.as_deref(), Some("file-secret"));
            assert_eq!(config.billing.member_id_prefix, "BD");
            assert_eq!(config.auth.security.jwt_expiry, Duration::from_secs(12 * 3600));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_yaml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "port: 8080")?;
            jail.set_env("GYMCTL_PORT", "9090");
            jail.set_env("GYMCTL_AUTH__NATIVE__SESSION__COOKIE_NAME", "panel_session");

            let config: Config = Config::figment("config.yaml").extract()?;
            assert_eq!(config.port, 9090);
            assert_eq!(config.auth.native.session.cookie_name, "panel_session");
            Ok(())
        });
    }

    #[test]
    fn test_database_url_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                database:
                  url: postgres://file-host/gym
                "#,
            )?;
            jail.set_env("DATABASE_URL", "postgres://env-host/gym");

            let config: Config = Config::figment("config.yaml").extract()?;
            assert_eq!(config.database_url(), "postgres://env-host/gym");
            Ok(())
        });
    }

    #[test]
    fn test_validate_requires_secret_key_for_native_auth() {
        let mut config = valid_config();
        config.secret_key = None;
        assert!(config.validate().is_err());

        config.auth.native.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_jwt_expiry_bounds() {
        let mut config = valid_config();
        config.auth.security.jwt_expiry = Duration::from_secs(60);
        assert!(config.validate().is_err());

        config.auth.security.jwt_expiry = Duration::from_secs(60 * 24 * 3600);
        assert!(config.validate().is_err());

        config.auth.security.jwt_expiry = Duration::from_secs(24 * 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_wildcard_with_credentials() {
        let mut config = valid_config();
        config.auth.security.cors.allow_credentials = true;
        assert!(config.validate().is_err());

        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Url("http://localhost:5173".parse().unwrap())];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_member_id_prefix() {
        let mut config = valid_config();
        config.billing.member_id_prefix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cors_origin_parsing() {
        let origins: Vec<CorsOrigin> = serde_json::from_str(r#"["*", "http://localhost:5173"]"#).unwrap();
        assert_eq!(origins[0], CorsOrigin::Wildcard);
        assert!(matches!(&origins[1], CorsOrigin::Url(u) if u.as_str() == "http://localhost:5173/"));

        let bad: Result<Vec<CorsOrigin>, _> = serde_json::from_str(r#"["not a url"]"#);
        assert!(bad.is_err());
    }
}
