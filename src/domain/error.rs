//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration: \"{input}\". Use <number><unit> terms with units h, m, s or ms (e.g. 5m, 2m30s, 500ms)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when an invalid quality preset is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid preset: \"{input}\". Valid presets are: SD, HD")]
pub struct InvalidPresetError {
    pub input: String,
}

/// Error when an invalid subscription plan is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid plan: \"{input}\". Valid plans are: FREE, PRO")]
pub struct InvalidPlanError {
    pub input: String,
}

/// Error when a profile is submitted with required fields missing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Incomplete capture profile, missing: {}", .missing.join(", "))]
pub struct IncompleteProfile {
    pub missing: Vec<&'static str>,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_profile_lists_fields() {
        let err = IncompleteProfile {
            missing: vec!["screen", "audio"],
        };
        assert_eq!(
            err.to_string(),
            "Incomplete capture profile, missing: screen, audio"
        );
    }
}
