use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::ConfigError;

/// Port the health check binds to when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 10000;

/// How often the bot's presence is refreshed.
pub const PRESENCE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Prefix for the non-slash variants of the bot's commands.
pub const COMMAND_PREFIX: &str = "!";

const TOKEN_VAR: &str = "TOKEN";
const PLATFORM_MARKER_VAR: &str = "RENDER";
const PORT_VAR: &str = "PORT";

/// Process settings, read once at startup and passed down from there.
#[derive(Clone)]
pub struct Settings {
    pub token: String,
    /// Set when running on the hosting platform; enables the health check.
    pub hosted: bool,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_VAR)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(TOKEN_VAR.to_string()))?;

        let hosted = lookup(PLATFORM_MARKER_VAR).is_some_and(|marker| !marker.is_empty());

        let port = match lookup(PORT_VAR) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: PORT_VAR.to_string(),
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            token,
            hosted,
            port,
        })
    }

    /// Address the health check listens on.
    pub fn health_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &"<redacted>")
            .field("hosted", &self.hosted)
            .field("port", &self.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = settings(&[("RENDER", "true")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref name) if name == "TOKEN"));
    }

    #[test]
    fn blank_token_is_treated_as_missing() {
        assert!(settings(&[("TOKEN", "  ")]).is_err());
    }

    #[test]
    fn port_defaults_when_unset() {
        let settings = settings(&[("TOKEN", "abc"), ("RENDER", "true")]).unwrap();
        assert!(settings.hosted);
        assert_eq!(settings.port, 10000);
        assert_eq!(
            settings.health_addr(),
            "0.0.0.0:10000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn port_is_read_from_env() {
        let settings = settings(&[("TOKEN", "abc"), ("PORT", "8080")]).unwrap();
        assert_eq!(settings.port, 8080);
        assert!(!settings.hosted);
    }

    #[test]
    fn malformed_port_is_rejected() {
        let err = settings(&[("TOKEN", "abc"), ("PORT", "ten")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref value, .. } if value == "ten"));
    }

    #[test]
    fn empty_marker_does_not_count() {
        let settings = settings(&[("TOKEN", "abc"), ("RENDER", "")]).unwrap();
        assert!(!settings.hosted);
    }

    #[test]
    fn debug_output_hides_token() {
        let settings = settings(&[("TOKEN", "super-secret")]).unwrap();
        assert!(!format!("{settings:?}").contains("super-secret"));
    }
}
