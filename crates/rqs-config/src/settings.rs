//! Boolean settings lookup read by the service at decision time.

use crate::ServiceConfig;
use std::collections::HashMap;

/// Setting consulted by `approve`: SUBMITTED may skip straight to APPROVED.
pub const SKIP_AUTHORIZATION: &str = "skipAuthorization";

pub trait SettingsProvider: Send + Sync {
    /// Unknown keys read as `false`.
    fn bool_value(&self, key: &str) -> bool;
}

/// Settings backed by the loaded service config.
#[derive(Debug, Clone)]
pub struct ConfigSettings {
    skip_authorization: bool,
}

impl ConfigSettings {
    pub fn new(cfg: &ServiceConfig) -> Self {
        Self {
            skip_authorization: cfg.service.skip_authorization,
        }
    }
}

impl SettingsProvider for ConfigSettings {
    fn bool_value(&self, key: &str) -> bool {
        match key {
            SKIP_AUTHORIZATION => self.skip_authorization,
            _ => false,
        }
    }
}

/// Fixed key/value settings for tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, bool>,
}

impl StaticSettings {
    pub fn with(mut self, key: &str, value: bool) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }
}

impl SettingsProvider for StaticSettings {
    fn bool_value(&self, key: &str) -> bool {
        self.values.get(key).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_settings_reads_skip_authorization() {
        let mut cfg = ServiceConfig::default();
        assert!(!ConfigSettings::new(&cfg).bool_value(SKIP_AUTHORIZATION));
        cfg.service.skip_authorization = true;
        let s = ConfigSettings::new(&cfg);
        assert!(s.bool_value(SKIP_AUTHORIZATION));
        assert!(!s.bool_value("somethingElse"));
    }

    #[test]
    fn static_settings_default_false() {
        let s = StaticSettings::default().with(SKIP_AUTHORIZATION, true);
        assert!(s.bool_value(SKIP_AUTHORIZATION));
        assert!(!s.bool_value("unknown"));
    }
}
