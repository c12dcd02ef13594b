//! Resolver settings loaded from environment variables.

use crate::error::{ConfigError, Result};
use crate::sources::DEFAULT_LOCAL_PORT;
use config::Environment;
use serde::Deserialize;

/// Environment namespace that switches resolution to the local development server.
pub const LOCAL_ENVIRONMENT: &str = "local";

/// Settings that steer resolution.
///
/// # Examples
///
/// ```rust,no_run
/// use paramstore_config::settings::ResolverSettings;
///
/// // PARAMSTORE_ENVIRONMENT=production PARAMSTORE_LOCAL_PORT=10641
/// let settings = ResolverSettings::from_env("PARAMSTORE")?;
/// # Ok::<(), paramstore_config::error::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolverSettings {
    /// Environment namespace, e.g. `production`. Keys are stored under `/{environment}/`.
    #[serde(default)]
    pub environment: Option<String>,
    /// Port of the local development server.
    #[serde(default = "default_local_port")]
    pub local_port: u16,
    /// Full URL of the local development server, overriding `local_port`.
    #[serde(default)]
    pub local_url: Option<String>,
}

fn default_local_port() -> u16 {
    DEFAULT_LOCAL_PORT
}

impl ResolverSettings {
    /// Settings with the given environment namespace and defaults elsewhere.
    pub fn for_environment(environment: impl Into<String>) -> Self {
        Self {
            environment: Some(environment.into()),
            ..Self::default()
        }
    }

    /// Load settings from `{PREFIX}_ENVIRONMENT`, `{PREFIX}_LOCAL_PORT` and `{PREFIX}_LOCAL_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable cannot be parsed.
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_environment(Environment::with_prefix(prefix))
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        load(environment)
    }

    /// Overlay every variable set under `prefix` onto these settings.
    ///
    /// Unset variables leave the current values alone, so a variable set to
    /// the default value still wins over a value given in code.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable cannot be parsed.
    pub fn apply_env(&mut self, prefix: &str) -> Result<()> {
        self.apply_environment(Environment::with_prefix(prefix))
    }

    fn apply_environment(&mut self, environment: Environment) -> Result<()> {
        let overrides: SettingsOverrides = load(environment)?;
        if let Some(environment) = overrides.environment {
            self.environment = Some(environment);
        }
        if let Some(port) = overrides.local_port {
            self.local_port = port;
        }
        if let Some(url) = overrides.local_url {
            self.local_url = Some(url);
        }
        Ok(())
    }

    /// The configured environment namespace.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if no non-empty namespace is set.
    pub fn namespace(&self) -> Result<&str> {
        self.environment
            .as_deref()
            .map(str::trim)
            .filter(|env| !env.is_empty())
            .ok_or_else(|| {
                ConfigError::ConfigurationError(
                    "environment namespace must be configured".to_string(),
                )
            })
    }

    /// Whether resolution should go to the local development server.
    pub fn is_local(&self) -> bool {
        matches!(self.namespace(), Ok(LOCAL_ENVIRONMENT))
    }
}

/// The variables that were actually set.
#[derive(Debug, Default, Deserialize)]
struct SettingsOverrides {
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    local_port: Option<u16>,
    #[serde(default)]
    local_url: Option<String>,
}

fn load<T: serde::de::DeserializeOwned>(environment: Environment) -> Result<T> {
    config::Config::builder()
        .add_source(environment)
        .build()
        .and_then(|settings| settings.try_deserialize::<T>())
        .map_err(|e| {
            ConfigError::ConfigurationError(format!(
                "Failed to load settings from environment: {}",
                e
            ))
        })
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            environment: None,
            local_port: DEFAULT_LOCAL_PORT,
            local_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        Environment::with_prefix("PARAMSTORE").source(Some(source))
    }

    fn load(vars: &[(&str, &str)]) -> Result<ResolverSettings> {
        ResolverSettings::from_environment(env(vars))
    }

    #[test]
    fn test_defaults() {
        let settings = load(&[]).unwrap();
        assert_eq!(settings, ResolverSettings::default());
        assert_eq!(settings.local_port, 10641);
    }

    #[test]
    fn test_from_environment() {
        let settings = load(&[
            ("PARAMSTORE_ENVIRONMENT", "production"),
            ("PARAMSTORE_LOCAL_PORT", "9000"),
            ("OTHER_ENVIRONMENT", "ignored"),
        ])
        .unwrap();

        assert_eq!(settings.namespace().unwrap(), "production");
        assert_eq!(settings.local_port, 9000);
        assert!(!settings.is_local());
    }

    #[test]
    fn test_env_port_equal_to_default_still_wins() {
        let mut settings = ResolverSettings {
            local_port: 9000,
            ..ResolverSettings::for_environment("staging")
        };
        settings
            .apply_environment(env(&[("PARAMSTORE_LOCAL_PORT", "10641")]))
            .unwrap();

        assert_eq!(settings.local_port, DEFAULT_LOCAL_PORT);
        assert_eq!(settings.namespace().unwrap(), "staging");
    }

    #[test]
    fn test_unset_variables_keep_values() {
        let mut settings = ResolverSettings {
            local_port: 9000,
            local_url: Some("http://dev:8080/".to_string()),
            ..ResolverSettings::for_environment("staging")
        };
        settings
            .apply_environment(env(&[("PARAMSTORE_ENVIRONMENT", "production")]))
            .unwrap();

        assert_eq!(settings.namespace().unwrap(), "production");
        assert_eq!(settings.local_port, 9000);
        assert_eq!(settings.local_url.as_deref(), Some("http://dev:8080/"));
    }

    #[test]
    fn test_bad_port() {
        let err = load(&[("PARAMSTORE_LOCAL_PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigurationError(_)));
    }

    #[test]
    fn test_missing_namespace() {
        assert!(ResolverSettings::default().namespace().is_err());
        assert!(ResolverSettings::for_environment("  ").namespace().is_err());
    }

    #[test]
    fn test_local() {
        assert!(ResolverSettings::for_environment("local").is_local());
    }
}
