//! Shared types for the OpenLaunch service.
//!
//! Holds the small enums that configuration, logging and the HTTP layer all
//! agree on. Parsing is strict: an unknown value is an error, never a silent
//! fallback to a default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Deployment environment the service runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Environment {
    /// Developer workstation.
    #[default]
    Local,
    /// Shared development/staging deployment.
    Dev,
    /// Production.
    Prod,
}

impl Environment {
    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    /// True only for [`Environment::Prod`].
    pub fn is_production(self) -> bool {
        self == Self::Prod
    }

    /// True for the non-production environments where developer tooling
    /// (API description, verbose diagnostics) may be exposed.
    pub fn is_local_dev(self) -> bool {
        matches!(self, Self::Local | Self::Dev)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            _ => Err(ParseEnvironmentError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = ParseEnvironmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Error returned when parsing an unknown environment name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown environment '{0}', expected one of: local, dev, prod")]
pub struct ParseEnvironmentError(pub String);

/// Log verbosity accepted by the service configuration.
///
/// The names follow the conventional syslog-style vocabulary; use
/// [`LogLevel::as_directive`] to turn one into a `tracing` filter directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Every accepted level, most severe first.
    pub const ALL: [LogLevel; 6] = [
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Info,
        Self::Debug,
        Self::Trace,
    ];

    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Maps the level to a `tracing` filter directive.
    ///
    /// `tracing` has no level above `error`, so `critical` collapses onto it.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Critical | Self::Error => "error",
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| ParseLogLevelError(s.to_string()))
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ParseLogLevelError;

    // `Self::Error` would name the variant.
    fn try_from(value: String) -> Result<Self, ParseLogLevelError> {
        value.parse()
    }
}

/// Error returned when a log level is not one of [`LogLevel::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("log_level must be one of [critical, error, warning, info, debug, trace], got '{0}'")]
pub struct ParseLogLevelError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert_eq!(" dev ".parse::<Environment>(), Ok(Environment::Dev));
        assert_eq!(Environment::default(), Environment::Local);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn environment_flags() {
        assert!(Environment::Prod.is_production());
        assert!(!Environment::Prod.is_local_dev());
        assert!(Environment::Local.is_local_dev());
        assert!(Environment::Dev.is_local_dev());
        assert!(!Environment::Dev.is_production());
    }

    #[test]
    fn log_level_normalizes_to_lowercase() {
        let level: LogLevel = "WARNING".parse().unwrap();
        assert_eq!(level, LogLevel::Warning);
        assert_eq!(level.to_string(), "warning");
        assert_eq!(level.as_directive(), "warn");
        assert_eq!(LogLevel::Critical.as_directive(), "error");
    }

    #[test]
    fn log_level_rejects_unknown_and_lists_valid_levels() {
        let err = "verbose".parse::<LogLevel>().unwrap_err();
        let msg = err.to_string();
        for level in LogLevel::ALL {
            assert!(msg.contains(level.as_str()), "missing {level} in {msg}");
        }
        assert!(msg.contains("verbose"));
    }

    #[test]
    fn serde_uses_validated_parsing() {
        let level: LogLevel = serde_json::from_str("\"Debug\"").unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert!(serde_json::from_str::<LogLevel>("\"loud\"").is_err());

        let env: Environment = serde_json::from_str("\"Prod\"").unwrap();
        assert_eq!(serde_json::to_string(&env).unwrap(), "\"prod\"");
    }

    #[test]
    fn log_level_try_from_string() {
        assert_eq!(LogLevel::try_from("Error".to_string()), Ok(LogLevel::Error));
        assert_eq!(
            LogLevel::try_from("loud".to_string()),
            Err(ParseLogLevelError("loud".to_string()))
        );
    }
}
