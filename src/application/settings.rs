//! Engine tuning knobs. Loaded by the infrastructure config layer, passed
//! explicitly into every stage.

use crate::domain::error::DomainError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub accept_threshold: f64,
    pub low_confidence_floor: f64,
    pub stopword_penalty: f64,
    pub no_context_penalty: f64,
    pub price_context_bonus: f64,
    pub halt_bonus: f64,
    pub registry_boost: f64,
    pub arbitration_batch_delay_ms: u64,
    pub arbitration_timeout_ms: u64,
    pub arbitration_excerpts: usize,
    pub catch_up_window_hours: u32,
    pub recent_mention_window_hours: u32,
    pub min_message_len: usize,
    pub batch_limit: usize,
    pub allowed_venues: Vec<String>,
    pub allowed_classes: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            accept_threshold: 0.80,
            low_confidence_floor: 0.60,
            stopword_penalty: -0.40,
            no_context_penalty: -0.20,
            price_context_bonus: 0.10,
            halt_bonus: 0.05,
            registry_boost: 0.10,
            arbitration_batch_delay_ms: 250,
            arbitration_timeout_ms: 10_000,
            arbitration_excerpts: 5,
            catch_up_window_hours: 24,
            recent_mention_window_hours: 24,
            min_message_len: 2,
            batch_limit: 500,
            allowed_venues: ["NASDAQ", "NYSE", "AMEX", "NYSEARCA", "OTC"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_classes: ["common", "adr", "etf", "preferred"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("accept_threshold", self.accept_threshold),
            ("low_confidence_floor", self.low_confidence_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.low_confidence_floor > self.accept_threshold {
            return Err(DomainError::Config(format!(
                "low_confidence_floor ({}) exceeds accept_threshold ({})",
                self.low_confidence_floor, self.accept_threshold
            )));
        }
        for (name, value) in [
            ("stopword_penalty", self.stopword_penalty),
            ("no_context_penalty", self.no_context_penalty),
        ] {
            if value > 0.0 {
                return Err(DomainError::Config(format!(
                    "{name} must not be positive, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("price_context_bonus", self.price_context_bonus),
            ("halt_bonus", self.halt_bonus),
            ("registry_boost", self.registry_boost),
        ] {
            if value < 0.0 {
                return Err(DomainError::Config(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        if self.batch_limit == 0 {
            return Err(DomainError::Config("batch_limit must be at least 1".into()));
        }
        Ok(())
    }

    /// True when a score sits in the band that warrants arbitration.
    pub fn in_arbitration_band(&self, confidence: f64) -> bool {
        confidence >= self.low_confidence_floor && confidence < self.accept_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = EngineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.accept_threshold, 0.80);
        assert_eq!(settings.catch_up_window_hours, 24);
    }

    #[test]
    fn test_floor_above_threshold_rejected() {
        let settings = EngineSettings {
            low_confidence_floor: 0.9,
            ..EngineSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_positive_penalty_rejected() {
        let settings = EngineSettings {
            stopword_penalty: 0.4,
            ..EngineSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_arbitration_band_includes_floor_excludes_threshold() {
        let settings = EngineSettings::default();
        assert!(settings.in_arbitration_band(0.60));
        assert!(settings.in_arbitration_band(0.79));
        assert!(!settings.in_arbitration_band(0.80));
        assert!(!settings.in_arbitration_band(0.59));
    }
}
