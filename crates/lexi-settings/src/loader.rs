//! Settings loading with deep merge and environment variable overrides.
//!
//! 1. Start from compiled defaults
//! 2. Deep-merge the user JSON file over them (if present)
//! 3. Apply environment variable overrides (highest priority)

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{LexiSettings, RepeatPolicy};

/// Load settings from the default path with env var overrides.
///
/// The default path is `~/.lexi/settings.json`.
pub fn load_settings() -> Result<LexiSettings> {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    let path = Path::new(&home).join(".lexi").join("settings.json");
    load_settings_from_path(&path)
}

/// Load settings from a specific path with env var overrides.
pub fn load_settings_from_path(path: &Path) -> Result<LexiSettings> {
    let defaults = serde_json::to_value(LexiSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: LexiSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are silently ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut LexiSettings) {
    if let Some(v) = read_env_usize("LEXI_MAX_CONCURRENT", 1, 1024) {
        settings.engine.max_concurrent_generations = v;
    }
    if let Some(v) = read_env_u64("LEXI_GENERATOR_TIMEOUT_SECS", 1, 3600) {
        settings.engine.generator_timeout_secs = v;
    }
    if let Some(v) = read_env_string("LEXI_REPEAT_POLICY") {
        match v.as_str() {
            "soft" => settings.engine.vocabulary_repeat_policy = RepeatPolicy::Soft,
            "hard" => settings.engine.vocabulary_repeat_policy = RepeatPolicy::Hard,
            _ => {}
        }
    }
    if let Some(v) = read_env_string("LEXI_GENERATOR_URL") {
        settings.generator.base_url = v;
    }
    if let Some(v) = read_env_string("LEXI_GENERATOR_MODEL") {
        settings.generator.model = v;
    }
    if let Some(v) = read_env_u64("LEXI_GENERATOR_RETRIES", 0, 10) {
        settings.generator.max_retries = v as u32;
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| (min..=max).contains(v))
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| (min..=max).contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("missing.json")).unwrap();
        assert_eq!(settings.engine.max_concurrent_generations, 4);
        assert_eq!(settings.generator.cache.max_entries, 50);
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"engine": {{"generator_timeout_secs": 30, "vocabulary_repeat_policy": "hard"}}}}"#
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.engine.generator_timeout_secs, 30);
        assert_eq!(
            settings.engine.vocabulary_repeat_policy,
            RepeatPolicy::Hard
        );
        // Untouched section keeps defaults.
        assert_eq!(settings.engine.max_concurrent_generations, 4);
        assert_eq!(settings.generator.model, "gpt-4o-mini");
    }

    #[test]
    fn deep_merge_skips_null_and_replaces_arrays() {
        let target = serde_json::json!({"a": {"b": 1, "c": [1, 2]}, "d": 4});
        let source = serde_json::json!({"a": {"b": null, "c": [9]}});
        let merged = deep_merge(target, source);
        assert_eq!(merged, serde_json::json!({"a": {"b": 1, "c": [9]}, "d": 4}));
    }
}
