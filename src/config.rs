use crate::BrainFilterError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct BrainFilterConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub filter: FilterSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Path or http(s) URL of the model artifact.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            source: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// User filtering preferences.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FilterSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Start of the daily window during which filtering is suspended (inclusive).
    #[serde(default = "default_allowed_hour_start")]
    pub allowed_hour_start: u8,
    /// End of that window (exclusive).
    #[serde(default = "default_allowed_hour_end")]
    pub allowed_hour_end: u8,
    #[serde(default = "default_filtered_categories")]
    pub filtered_categories: Vec<String>,
    #[serde(default)]
    pub blocked_channels: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_hour_start: default_allowed_hour_start(),
            allowed_hour_end: default_allowed_hour_end(),
            filtered_categories: default_filtered_categories(),
            blocked_channels: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_allowed_hour_start() -> u8 {
    20
}

fn default_allowed_hour_end() -> u8 {
    21
}

fn default_filtered_categories() -> Vec<String> {
    vec!["jeux".into(), "divertissement".into(), "shorts".into()]
}

impl FilterSettings {
    /// Both window bounds must be valid hours.
    pub fn validate(&self) -> Result<(), BrainFilterError> {
        validate_hour("filter.allowed_hour_start", self.allowed_hour_start)?;
        validate_hour("filter.allowed_hour_end", self.allowed_hour_end)?;
        Ok(())
    }

    /// `[start, end)` with no wrap past midnight; `start >= end` never matches.
    pub fn in_allowed_window(&self, hour: u8) -> bool {
        hour >= self.allowed_hour_start && hour < self.allowed_hour_end
    }

    pub fn filters_category(&self, category: &str) -> bool {
        self.filtered_categories.iter().any(|c| c == category)
    }

    /// Case-insensitive match against `blocked_channels`.
    pub fn is_blocked_channel(&self, channel: &str) -> bool {
        let channel = channel.to_lowercase();
        self.blocked_channels
            .iter()
            .any(|c| c.to_lowercase() == channel)
    }
}

/// Load config from BRAINFILTER_CONFIG env var, ~/.brainfilter/config.toml, or defaults.
pub fn load_config() -> Result<BrainFilterConfig, BrainFilterError> {
    match config_path() {
        Some(p) if p.exists() => load_config_from(&p),
        _ => Ok(BrainFilterConfig::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<BrainFilterConfig, BrainFilterError> {
    let content = std::fs::read_to_string(path)?;
    let config: BrainFilterConfig = toml::from_str(&content)
        .map_err(|e| BrainFilterError::Config(format!("{}: {e}", path.display())))?;
    validate_config(&config)?;
    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("BRAINFILTER_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let home = std::env::var("HOME").ok()?;
    Some(Path::new(&home).join(".brainfilter").join("config.toml"))
}

pub fn validate_hour(name: &str, hour: u8) -> Result<u8, BrainFilterError> {
    if hour > 23 {
        return Err(BrainFilterError::Config(format!(
            "{name} must be in 0..=23, got {hour}"
        )));
    }
    Ok(hour)
}

fn validate_config(config: &BrainFilterConfig) -> Result<(), BrainFilterError> {
    config.filter.validate()?;
    if config.model.timeout_secs == 0 {
        return Err(BrainFilterError::Config(
            "model.timeout_secs must be greater than 0".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_extension_defaults() {
        let config = BrainFilterConfig::default();
        assert!(config.filter.enabled);
        assert_eq!(config.filter.allowed_hour_start, 20);
        assert_eq!(config.filter.allowed_hour_end, 21);
        assert_eq!(
            config.filter.filtered_categories,
            vec!["jeux", "divertissement", "shorts"]
        );
        assert!(config.filter.blocked_channels.is_empty());
        assert_eq!(config.model.source, None);
        assert_eq!(config.model.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: BrainFilterConfig = toml::from_str("").unwrap();
        assert_eq!(config.filter, FilterSettings::default());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[model]
source = "https://example.com/model.json"
timeout_secs = 3

[filter]
enabled = false
allowed_hour_start = 18
allowed_hour_end = 22
filtered_categories = ["jeux"]
blocked_channels = ["Squeezie", "Gotaga"]
"#;
        let config: BrainFilterConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.model.source.as_deref(),
            Some("https://example.com/model.json")
        );
        assert_eq!(config.model.timeout_secs, 3);
        assert!(!config.filter.enabled);
        assert_eq!(config.filter.allowed_hour_start, 18);
        assert_eq!(config.filter.allowed_hour_end, 22);
        assert_eq!(config.filter.filtered_categories, vec!["jeux"]);
        assert_eq!(config.filter.blocked_channels.len(), 2);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_filter_section_keeps_other_defaults() {
        let config: BrainFilterConfig = toml::from_str(
            r#"
[filter]
filtered_categories = ["sport"]
"#,
        )
        .unwrap();
        assert!(config.filter.enabled);
        assert_eq!(config.filter.allowed_hour_start, 20);
        assert_eq!(config.filter.filtered_categories, vec!["sport"]);
    }

    #[test]
    fn rejects_out_of_range_hours() {
        let config: BrainFilterConfig = toml::from_str(
            r#"
[filter]
allowed_hour_end = 24
"#,
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("allowed_hour_end"));
    }

    #[test]
    fn settings_built_in_code_are_validated() {
        assert!(FilterSettings::default().validate().is_ok());
        let settings = FilterSettings {
            allowed_hour_start: 25,
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("allowed_hour_start"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config: BrainFilterConfig = toml::from_str(
            r#"
[model]
timeout_secs = 0
"#,
        )
        .unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn load_config_from_file_reports_path_on_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[filter]\nenabled = \"yes\"\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, BrainFilterError::Config(_)));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn allowed_window_is_half_open() {
        let settings = FilterSettings::default();
        assert!(!settings.in_allowed_window(19));
        assert!(settings.in_allowed_window(20));
        assert!(!settings.in_allowed_window(21));
    }

    #[test]
    fn inverted_window_never_matches() {
        let settings = FilterSettings {
            allowed_hour_start: 22,
            allowed_hour_end: 2,
            ..Default::default()
        };
        assert!((0..24).all(|h| !settings.in_allowed_window(h)));
    }

    #[test]
    fn blocked_channels_ignore_case() {
        let settings = FilterSettings {
            blocked_channels: vec!["Squeezie".into()],
            ..Default::default()
        };
        assert!(settings.is_blocked_channel("squeezie"));
        assert!(settings.is_blocked_channel("SQUEEZIE"));
        assert!(!settings.is_blocked_channel("Gotaga"));
    }
}
