use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::analyzer::DEFAULT_REANALYSIS_DAYS;

const APP_DIR: &str = "newslens";
const DEFAULT_BATCH_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub database_path: PathBuf,
    pub reanalysis_window_days: i64,
    pub batch_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            reanalysis_window_days: DEFAULT_REANALYSIS_DAYS,
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Result<Self> {
        Self::try_load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key → value source. Missing keys keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup("NEWSLENS_DATABASE").filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(days) = lookup("NEWSLENS_REANALYSIS_DAYS") {
            config.reanalysis_window_days = days
                .trim()
                .parse()
                .with_context(|| format!("NEWSLENS_REANALYSIS_DAYS must be a whole number of days, got '{}'", days))?;
        }

        if let Some(limit) = lookup("NEWSLENS_BATCH_LIMIT") {
            config.batch_limit = limit
                .trim()
                .parse()
                .with_context(|| format!("NEWSLENS_BATCH_LIMIT must be a positive integer, got '{}'", limit))?;
        }

        Ok(config)
    }

    fn try_load_dotenv() {
        // 1. Current directory
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/newslens/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join(APP_DIR).join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                dotenvy::from_path(&home_path).ok();
            }
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("articles.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.reanalysis_window_days, 7);
        assert_eq!(config.batch_limit, 100);
        assert!(config.database_path.ends_with("newslens/articles.db"));
    }

    #[test]
    fn test_overrides() {
        let config = AnalysisConfig::from_lookup(lookup(&[
            ("NEWSLENS_DATABASE", "/tmp/test.db"),
            ("NEWSLENS_REANALYSIS_DAYS", "3"),
            ("NEWSLENS_BATCH_LIMIT", " 25 "),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.reanalysis_window_days, 3);
        assert_eq!(config.batch_limit, 25);
    }

    #[test]
    fn test_malformed_value_is_error() {
        let err = AnalysisConfig::from_lookup(lookup(&[("NEWSLENS_BATCH_LIMIT", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("NEWSLENS_BATCH_LIMIT"));
    }
}
