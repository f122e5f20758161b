//! Per-profile validation settings.

use crate::rules::RuleKindTag;
use serde::{Deserialize, Serialize};

/// Name of the context rules go into when none is given.
pub const DEFAULT_CONTEXT: &str = "default";

/// Settings for one rule profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Skip rules on unchanged attributes of persisted subjects.
    pub optimize: bool,
    /// Rule kinds that run on persisted subjects even when their attribute
    /// is unchanged.
    pub always_run: Vec<RuleKindTag>,
    /// Context used when none is requested or the current one is unknown.
    pub default_context: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            always_run: vec![
                RuleKindTag::Method,
                RuleKindTag::Presence,
                RuleKindTag::Absence,
            ],
            default_context: DEFAULT_CONTEXT.to_string(),
        }
    }
}

impl ValidationConfig {
    /// Parse settings from JSON; missing fields take their defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use validity::validation::ValidationConfig;
    ///
    /// let config = ValidationConfig::from_json(r#"{"optimize": false}"#).unwrap();
    /// assert!(!config.optimize);
    /// assert_eq!(config.default_context, "default");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn always_runs(&self, tag: RuleKindTag) -> bool {
        self.always_run.contains(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ValidationConfig::default();
        assert!(config.optimize);
        assert!(config.always_runs(RuleKindTag::Presence));
        assert!(config.always_runs(RuleKindTag::Method));
        assert!(!config.always_runs(RuleKindTag::Length));
        assert!(!config.always_runs(RuleKindTag::Block));
    }

    #[test]
    fn always_run_is_configurable() {
        let config =
            ValidationConfig::from_json(r#"{"always_run": ["uniqueness", "block"]}"#).unwrap();
        assert!(config.always_runs(RuleKindTag::Uniqueness));
        assert!(config.always_runs(RuleKindTag::Block));
        assert!(!config.always_runs(RuleKindTag::Presence));
        assert!(config.optimize);
    }

    #[test]
    fn rejects_unknown_kinds() {
        assert!(ValidationConfig::from_json(r#"{"always_run": ["psychic"]}"#).is_err());
    }
}
