/// Relay configuration
///
/// Layered: built-in defaults, then an optional TOML file (--config <path>,
/// or ./relay.toml when present), then environment variable overrides, then
/// CLI overrides. The resolved config is owned by the server state and passed
/// explicitly to the pieces that need it.
///
/// Environment overrides:
/// - RELAY_HOST / RELAY_PORT       listener address
/// - RELAY_JWT_SECRET              subscriber token secret
/// - RELAY_ENV                     "production" enables the strict auth posture
/// - RELAY_FLEET_API_BASE / RELAY_FLEET_API_TOKEN   fleet provisioning client
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::arguments;
use crate::errors::RelayError;
use crate::logger::{self, LogTag};

/// Fallback secret installed outside production when none is configured.
/// The gate still verifies signatures against it; it never accepts unsigned data.
pub const DEV_FALLBACK_SECRET: &str = "fleet-relay-dev-secret";

const DEFAULT_CONFIG_FILE: &str = "relay.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub websocket: WebsocketConfig,
    pub fleet: FleetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener bind address
    pub host: String,
    /// Listener port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for subscriber bearer tokens
    pub jwt_secret: Option<String>,
    /// Strict posture: refuse to start without a configured secret
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsocketConfig {
    /// Liveness probe interval for subscriber connections
    pub ping_interval_secs: u64,
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Base URL of the fleet-management API (out-of-band provisioning only)
    pub api_base: Option<String>,
    /// Bearer token for the fleet-management API
    pub api_token: Option<String>,
}

/// Load the relay configuration: defaults → TOML file → env → CLI.
pub fn load() -> Result<RelayConfig, RelayError> {
    let mut config = match arguments::get_config_path() {
        Some(path) => read_config_file(&path, true)?,
        None => read_config_file(DEFAULT_CONFIG_FILE, false)?,
    };

    apply_env_overrides(&mut config)?;

    if let Some(port) = arguments::get_port_override() {
        config.server.port = port
            .parse()
            .map_err(|_| RelayError::Config(format!("invalid --port value '{}'", port)))?;
    }

    Ok(config)
}

/// Read a TOML config file. A missing file is fatal only when the path was
/// given explicitly; the implicit default path is allowed to be absent.
fn read_config_file(path: &str, required: bool) -> Result<RelayConfig, RelayError> {
    if !Path::new(path).exists() {
        if required {
            return Err(RelayError::Config(format!(
                "config file '{}' not found",
                path
            )));
        }
        return Ok(RelayConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| RelayError::Config(format!("failed to read '{}': {}", path, e)))?;
    let config: RelayConfig = toml::from_str(&raw)
        .map_err(|e| RelayError::Config(format!("failed to parse '{}': {}", path, e)))?;

    logger::info(LogTag::Config, &format!("loaded configuration from {}", path));
    Ok(config)
}

fn apply_env_overrides(config: &mut RelayConfig) -> Result<(), RelayError> {
    if let Ok(host) = env::var("RELAY_HOST") {
        config.server.host = host;
    }
    if let Ok(port) = env::var("RELAY_PORT") {
        config.server.port = port
            .parse()
            .map_err(|_| RelayError::Config(format!("invalid RELAY_PORT value '{}'", port)))?;
    }
    if let Ok(secret) = env::var("RELAY_JWT_SECRET") {
        if !secret.is_empty() {
            config.auth.jwt_secret = Some(secret);
        }
    }
    if let Ok(environment) = env::var("RELAY_ENV") {
        if environment.eq_ignore_ascii_case("production") {
            config.auth.production = true;
        }
    }
    if let Ok(base) = env::var("RELAY_FLEET_API_BASE") {
        config.fleet.api_base = Some(base);
    }
    if let Ok(token) = env::var("RELAY_FLEET_API_TOKEN") {
        config.fleet.api_token = Some(token);
    }
    Ok(())
}

/// Resolve the effective token secret for the gate.
///
/// A missing secret is fatal in production; otherwise a fixed development
/// secret is installed with a loud warning so signatures are still verified.
pub fn resolve_secret(auth: &AuthConfig) -> Result<String, RelayError> {
    match auth.jwt_secret.as_deref() {
        Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
        _ if auth.production => Err(RelayError::MissingSecret),
        _ => {
            logger::warning(
                LogTag::Config,
                "no JWT secret configured; using the built-in development secret \
                 (set auth.jwt_secret or RELAY_JWT_SECRET before deploying)",
            );
            Ok(DEV_FALLBACK_SECRET.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.websocket.ping_interval_secs, 30);
        assert!(config.auth.jwt_secret.is_none());
        assert!(!config.auth.production);
    }

    #[test]
    fn test_toml_sections_are_optional() {
        let config: RelayConfig = toml::from_str(
            r#"
            [server]
            port = 9443

            [auth]
            jwt_secret = "s3cret"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9443);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.websocket.ping_interval_secs, 30);
    }

    #[test]
    fn test_resolve_secret_production_requires_secret() {
        let auth = AuthConfig {
            jwt_secret: None,
            production: true,
        };
        assert!(matches!(
            resolve_secret(&auth),
            Err(RelayError::MissingSecret)
        ));
    }

    #[test]
    fn test_resolve_secret_falls_back_outside_production() {
        let auth = AuthConfig {
            jwt_secret: None,
            production: false,
        };
        assert_eq!(resolve_secret(&auth).unwrap(), DEV_FALLBACK_SECRET);
    }

    #[test]
    fn test_resolve_secret_prefers_configured_value() {
        let auth = AuthConfig {
            jwt_secret: Some("configured".to_string()),
            production: true,
        };
        assert_eq!(resolve_secret(&auth).unwrap(), "configured");
    }
}
