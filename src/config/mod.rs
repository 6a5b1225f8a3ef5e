//! Query builder configuration

use std::env;

use anyhow::{Context, Result};

use crate::orm::PlaceholderStyle;

/// Settings shared by every builder created through a [`BuilderRegistry`](crate::BuilderRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// How bind parameters are written into compiled SQL
    pub placeholder_style: PlaceholderStyle,

    /// Page size used by `paginate` when the caller gives no limit
    pub default_page_size: i64,

    /// Upper bound for any page size requested through `paginate`
    pub max_page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placeholder_style: PlaceholderStyle::Numbered,
            default_page_size: 25,
            max_page_size: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let placeholder_style: PlaceholderStyle = match lookup("MODEL_QUERY_PLACEHOLDER") {
            Some(raw) => raw
                .parse()
                .context("Invalid MODEL_QUERY_PLACEHOLDER")?,
            None => defaults.placeholder_style,
        };

        let default_page_size: i64 = match lookup("MODEL_QUERY_PAGE_SIZE") {
            Some(raw) => raw.parse().context("Invalid MODEL_QUERY_PAGE_SIZE")?,
            None => defaults.default_page_size,
        };

        let max_page_size: i64 = match lookup("MODEL_QUERY_MAX_PAGE_SIZE") {
            Some(raw) => raw.parse().context("Invalid MODEL_QUERY_MAX_PAGE_SIZE")?,
            None => defaults.max_page_size,
        };

        if default_page_size <= 0 || max_page_size <= 0 {
            anyhow::bail!("page sizes must be positive");
        }

        Ok(Self {
            placeholder_style,
            // capped to the maximum
            default_page_size: default_page_size.min(max_page_size),
            max_page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_vars(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_vars(lookup(&[
            ("MODEL_QUERY_PLACEHOLDER", "dollar"),
            ("MODEL_QUERY_PAGE_SIZE", "10"),
            ("MODEL_QUERY_MAX_PAGE_SIZE", "50"),
        ]))
        .unwrap();
        assert_eq!(config.placeholder_style, PlaceholderStyle::Dollar);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 50);
    }

    #[test]
    fn test_default_page_size_is_capped() {
        let config = Config::from_vars(lookup(&[
            ("MODEL_QUERY_PAGE_SIZE", "500"),
            ("MODEL_QUERY_MAX_PAGE_SIZE", "50"),
        ]))
        .unwrap();
        assert_eq!(config.default_page_size, 50);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_vars(lookup(&[("MODEL_QUERY_PLACEHOLDER", "colon")])).is_err());
        assert!(Config::from_vars(lookup(&[("MODEL_QUERY_PAGE_SIZE", "ten")])).is_err());
        assert!(Config::from_vars(lookup(&[("MODEL_QUERY_MAX_PAGE_SIZE", "0")])).is_err());
    }
}
