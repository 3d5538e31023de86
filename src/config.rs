//! Engine configuration, persisted as TOML.
//!
//! Every field is optional in the file; omitted keys take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Bounds and defaults for the query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard upper bound on `max_depth` for path finding and connections.
    #[serde(default = "default_max_path_depth")]
    pub max_path_depth: usize,
    /// Depth used when a caller does not give one.
    #[serde(default = "default_path_depth")]
    pub default_path_depth: usize,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Larger `limit` values are rejected.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Coarse batch size multiplier for numeric post-filters.
    #[serde(default = "default_coarse_fetch_factor")]
    pub coarse_fetch_factor: usize,
    /// Apply numeric predicates to the whole filtered set so `total` is exact.
    #[serde(default)]
    pub exact_numeric_totals: bool,
    /// Window, in days, counted as "recent" by entity statistics.
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: i64,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// Longest accepted suggestion query, in characters.
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,
}

fn default_max_path_depth() -> usize {
    5
}
fn default_path_depth() -> usize {
    3
}
fn default_page_size() -> usize {
    50
}
fn default_max_page_size() -> usize {
    1000
}
fn default_coarse_fetch_factor() -> usize {
    3
}
/// Upper bound for `recent_window_days` (about a century).
pub const MAX_RECENT_WINDOW_DAYS: i64 = 36_500;

fn default_recent_window_days() -> i64 {
    30
}
fn default_max_suggestions() -> usize {
    20
}
fn default_max_query_length() -> usize {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_path_depth: default_max_path_depth(),
            default_path_depth: default_path_depth(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            coarse_fetch_factor: default_coarse_fetch_factor(),
            exact_numeric_totals: false,
            recent_window_days: default_recent_window_days(),
            max_suggestions: default_max_suggestions(),
            max_query_length: default_max_query_length(),
        }
    }
}

impl EngineConfig {
    /// Check that every bound is positive and defaults sit inside their bounds.
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |message: String| -> ConfigResult<()> { Err(ConfigError::Invalid { message }) };
        if self.max_path_depth == 0 {
            return invalid("max_path_depth must be at least 1".into());
        }
        if self.default_path_depth == 0 || self.default_path_depth > self.max_path_depth {
            return invalid(format!(
                "default_path_depth {} must be within 1..={}",
                self.default_path_depth, self.max_path_depth
            ));
        }
        if self.max_page_size == 0 {
            return invalid("max_page_size must be at least 1".into());
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return invalid(format!(
                "default_page_size {} must be within 1..={}",
                self.default_page_size, self.max_page_size
            ));
        }
        if self.coarse_fetch_factor == 0 {
            return invalid("coarse_fetch_factor must be at least 1".into());
        }
        if self.recent_window_days <= 0 || self.recent_window_days > MAX_RECENT_WINDOW_DAYS {
            return invalid(format!(
                "recent_window_days {} must be within 1..={MAX_RECENT_WINDOW_DAYS}",
                self.recent_window_days
            ));
        }
        if self.max_suggestions == 0 || self.max_query_length == 0 {
            return invalid("max_suggestions and max_query_length must be at least 1".into());
        }
        Ok(())
    }

    /// Load from a TOML file and validate.
    pub fn load(path: &std::path::Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &std::path::Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_path_depth, 5);
        assert_eq!(config.recent_window_days, 30);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("max_page_size = 200\n").unwrap();
        assert_eq!(config.max_page_size, 200);
        assert_eq!(config.default_page_size, 50);
        assert!(!config.exact_numeric_totals);
    }

    #[test]
    fn inverted_bounds_rejected() {
        let config = EngineConfig {
            default_path_depth: 6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn recent_window_is_bounded() {
        let at_bound = EngineConfig {
            recent_window_days: MAX_RECENT_WINDOW_DAYS,
            ..Default::default()
        };
        at_bound.validate().unwrap();
        for days in [0, -1, MAX_RECENT_WINDOW_DAYS + 1, 1_000_000_000] {
            let config = EngineConfig {
                recent_window_days: days,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { .. })),
                "{days} accepted"
            );
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("engine.toml");
        let config = EngineConfig {
            exact_numeric_totals: true,
            max_suggestions: 10,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "max_path_depth = \"deep\"").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
