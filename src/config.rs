use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::{BudgetPolicy, MatchOptions, ScoringMode, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub airtable: AirtableSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirtableSettings {
    #[serde(default = "default_airtable_url")]
    pub api_url: String,
    #[serde(default)]
    pub base_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_experiences_table")]
    pub experiences_table: String,
    pub experiences_view: Option<String>,
    #[serde(default = "default_leads_table")]
    pub leads_table: String,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
}

fn default_airtable_url() -> String { "https://api.airtable.com/v0".to_string() }
fn default_experiences_table() -> String { "Experiences".to_string() }
fn default_leads_table() -> String { "Leads".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Shared tier; the cache is in-process only when unset
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default)]
    pub budget_policy: BudgetPolicy,
    #[serde(default)]
    pub scoring_mode: ScoringMode,
    #[serde(default = "default_near_budget_threshold")]
    pub near_budget_threshold: u32,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            max_limit: default_max_limit(),
            budget_policy: BudgetPolicy::default(),
            scoring_mode: ScoringMode::default(),
            near_budget_threshold: default_near_budget_threshold(),
        }
    }
}

fn default_top_n() -> usize { 6 }
fn default_max_limit() -> usize { 20 }
fn default_near_budget_threshold() -> u32 { 30 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_budget_weight")]
    pub budget: f64,
    #[serde(default = "default_budget_near_weight")]
    pub budget_near: f64,
    #[serde(default = "default_vibe_weight")]
    pub vibe: f64,
    #[serde(default = "default_tone_weight")]
    pub tone: f64,
    #[serde(default = "default_flavour_weight")]
    pub flavour: f64,
    #[serde(default = "default_adventure_weight")]
    pub adventure: f64,
    #[serde(default = "default_adventure_penalty")]
    pub adventure_penalty: f64,
    #[serde(default = "default_involvement_weight")]
    pub involvement: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            budget: default_budget_weight(),
            budget_near: default_budget_near_weight(),
            vibe: default_vibe_weight(),
            tone: default_tone_weight(),
            flavour: default_flavour_weight(),
            adventure: default_adventure_weight(),
            adventure_penalty: default_adventure_penalty(),
            involvement: default_involvement_weight(),
        }
    }
}

fn default_budget_weight() -> f64 { 30.0 }
fn default_budget_near_weight() -> f64 { 10.0 }
fn default_vibe_weight() -> f64 { 20.0 }
fn default_tone_weight() -> f64 { 8.0 }
fn default_flavour_weight() -> f64 { 6.0 }
fn default_adventure_weight() -> f64 { 12.0 }
fn default_adventure_penalty() -> f64 { 4.0 }
fn default_involvement_weight() -> f64 { 10.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with EXPMATCH_)
    /// 5. Airtable and Redis variables shared with other tooling (AIRTABLE_*, REDIS_URL)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., EXPMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("EXPMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_shared_env(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("EXPMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_shared_env(settings)?.try_deserialize()
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        let w = &self.scoring.weights;
        ScoringWeights {
            budget: w.budget,
            budget_near: w.budget_near,
            vibe: w.vibe,
            tone: w.tone,
            flavour: w.flavour,
            adventure: w.adventure,
            adventure_penalty: w.adventure_penalty,
            involvement: w.involvement,
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            top_n: self.matching.top_n.max(1),
            budget_policy: self.matching.budget_policy,
            scoring_mode: self.matching.scoring_mode,
            near_budget_threshold: self.matching.near_budget_threshold,
        }
    }
}

/// Override Airtable and Redis settings from the unprefixed variables the
/// rest of the stack already uses
fn apply_shared_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("AIRTABLE_URL", "airtable.api_url"),
        ("AIRTABLE_BASE_ID", "airtable.base_id"),
        ("AIRTABLE_TOKEN", "airtable.token"),
        ("AIRTABLE_LEADS_TABLE", "airtable.leads_table"),
        ("REDIS_URL", "cache.redis_url"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            if !value.trim().is_empty() {
                builder = builder.set_override(key, value)?;
            }
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.budget, 30.0);
        assert_eq!(weights.budget_near, 10.0);
        assert_eq!(weights.vibe, 20.0);
        assert_eq!(weights.tone, 8.0);
        assert_eq!(weights.flavour, 6.0);
        assert_eq!(weights.adventure, 12.0);
        assert_eq!(weights.adventure_penalty, 4.0);
        assert_eq!(weights.involvement, 10.0);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("expmatch-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8081

[airtable]
base_id = "appTEST"

[matching]
top_n = 5
budget_policy = "advisory"
scoring_mode = "stepped"

[scoring.weights]
vibe = 25.0
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.airtable.experiences_table, "Experiences");

        let options = settings.match_options();
        assert_eq!(options.top_n, 5);
        assert_eq!(options.budget_policy, BudgetPolicy::Advisory);
        assert_eq!(options.scoring_mode, ScoringMode::Stepped);

        let weights = settings.scoring_weights();
        assert_eq!(weights.vibe, 25.0);
        assert_eq!(weights.budget, 30.0);
    }

    #[test]
    fn test_load_from_applies_shared_env() {
        let path = std::env::temp_dir().join(format!("expmatch-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8082

[airtable]
leads_table = "FromFile"
"#,
        )
        .unwrap();

        std::env::set_var("AIRTABLE_LEADS_TABLE", "QuizLeads");
        let settings = Settings::load_from(&path);
        std::env::remove_var("AIRTABLE_LEADS_TABLE");
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.unwrap().airtable.leads_table, "QuizLeads");
    }
}
