//! Application configuration.
//!
//! An explicit configuration structure assembled by the glue layer:
//! defaults, then `config.toml`, then a `GRIMOIRE_`-prefixed environment
//! overlay (e.g. `GRIMOIRE_ENGINE__INSTANT_DEATH=true`,
//! `GRIMOIRE_RULES__SOURCE_DIR=...`). Core components never read the
//! process environment; they receive the values they need at
//! construction time.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::encounter::EncounterRules;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub content: ContentConfig,
    pub rules: RulesConfig,
    pub engine: EngineConfig,
    pub display: DisplayConfig,
}

/// Content directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory holding the per-type content files.
    pub dir: PathBuf,
}

/// Rules index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Directory of rule source text files.
    pub source_dir: PathBuf,
    /// Path of the persisted rules index.
    pub index_path: PathBuf,
}

/// Encounter engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Instant-death rule variant.
    pub instant_death: bool,
    /// Round cap terminating unbounded encounters.
    pub round_cap: u32,
    /// Which combatant source backs the engine.
    pub backend: EngineBackend,
}

/// Combatant source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// Content-backed stat blocks from the content store.
    Data,
    /// Builtin fallback bestiary.
    Builtin,
}

/// Output presentation toggles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show numeric similarity scores in verb suggestions.
    pub show_scores: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("content"),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("content/rules"),
            index_path: data_dir().join("rules-index.json"),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instant_death: false,
            round_cap: 20,
            backend: EngineBackend::Data,
        }
    }
}

impl AppConfig {
    /// Assemble configuration: defaults, `config.toml`, environment.
    /// Falls back to defaults (with a warning) if a layer is malformed.
    pub fn load() -> Self {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path()))
            .merge(Env::prefixed("GRIMOIRE_").split("__"));
        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                warn!("config unusable, falling back to defaults: {e}");
                AppConfig::default()
            }
        }
    }

    /// Encounter rule toggles for the engine, derived from this config.
    pub fn encounter_rules(&self) -> EncounterRules {
        EncounterRules {
            instant_death: self.engine.instant_death,
            round_cap: self.engine.round_cap,
        }
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("grimoire").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("grimoire"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.content.dir, PathBuf::from("content"));
        assert!(!config.engine.instant_death);
        assert_eq!(config.engine.round_cap, 20);
        assert_eq!(config.engine.backend, EngineBackend::Data);
        assert!(!config.display.show_scores);
    }

    #[test]
    fn test_encounter_rules_derivation() {
        let mut config = AppConfig::default();
        config.engine.instant_death = true;
        config.engine.round_cap = 5;
        let rules = config.encounter_rules();
        assert!(rules.instant_death);
        assert_eq!(rules.round_cap, 5);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::default();
        let figment = Figment::from(Serialized::defaults(config));
        let back: AppConfig = figment.extract().unwrap();
        assert_eq!(back.engine.round_cap, 20);
    }
}
