use std::{path::PathBuf, str::FromStr};

use thiserror::Error;

pub const DEFAULT_TABLE_NAME: &str = "ECSTaskStatus";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Largest `maxResults` the task listing accepts.
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_TABLE: &str = "TASKLEDGER_TABLE";
pub const ENV_PAGE_SIZE: &str = "TASKLEDGER_PAGE_SIZE";
pub const ENV_STORE: &str = "TASKLEDGER_STORE";
pub const ENV_PLATFORM_ENDPOINT: &str = "TASKLEDGER_PLATFORM_ENDPOINT";
pub const ENV_STORE_ENDPOINT: &str = "TASKLEDGER_STORE_ENDPOINT";
pub const ENV_TIMEOUT_MS: &str = "TASKLEDGER_TIMEOUT_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("region is required (pass --region or set AWS_REGION)")]
    MissingRegion,
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Where task records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File(PathBuf),
    Remote,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "memory" => Ok(StoreBackend::Memory),
            "remote" => Ok(StoreBackend::Remote),
            _ => match s.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(StoreBackend::File(PathBuf::from(path))),
                _ => Err(ConfigError::InvalidValue {
                    key: ENV_STORE,
                    value: s.to_string(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub region: String,
    pub table_name: String,
    pub page_size: u32,
    pub store: StoreBackend,
    pub platform_endpoint: String,
    pub store_endpoint: String,
    pub request_timeout_ms: u64,
}

impl TrackerConfig {
    /// Defaults for `region`, with endpoints derived from it.
    pub fn for_region(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            platform_endpoint: format!("https://ecs.{region}.amazonaws.com"),
            store_endpoint: format!("https://dynamodb.{region}.amazonaws.com"),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            store: StoreBackend::Remote,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            region,
        }
    }

    /// Build from the process environment. An explicit `region` wins over `AWS_REGION`.
    pub fn from_env(region: Option<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(region, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(region: Option<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let region = region
            .or_else(|| lookup(ENV_REGION))
            .filter(|r| !r.trim().is_empty())
            .ok_or(ConfigError::MissingRegion)?;
        let mut cfg = Self::for_region(region);

        if let Some(table) = lookup(ENV_TABLE) {
            cfg.table_name = table;
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            cfg.page_size = parse_num(ENV_PAGE_SIZE, &raw)?;
            if cfg.page_size > MAX_PAGE_SIZE {
                return Err(ConfigError::InvalidValue {
                    key: ENV_PAGE_SIZE,
                    value: raw,
                });
            }
        }
        if let Some(raw) = lookup(ENV_STORE) {
            cfg.store = raw.parse()?;
        }
        if let Some(endpoint) = lookup(ENV_PLATFORM_ENDPOINT) {
            cfg.platform_endpoint = endpoint;
        }
        if let Some(endpoint) = lookup(ENV_STORE_ENDPOINT) {
            cfg.store_endpoint = endpoint;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            cfg.request_timeout_ms = parse_num(ENV_TIMEOUT_MS, &raw)?;
        }
        Ok(cfg)
    }
}

fn parse_num<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_follow_region() {
        let cfg = TrackerConfig::from_lookup(Some("eu-west-1".into()), lookup(&[])).unwrap();
        assert_eq!(cfg.table_name, "ECSTaskStatus");
        assert_eq!(cfg.page_size, 100);
        assert_eq!(cfg.store, StoreBackend::Remote);
        assert_eq!(cfg.platform_endpoint, "https://ecs.eu-west-1.amazonaws.com");
        assert_eq!(cfg.store_endpoint, "https://dynamodb.eu-west-1.amazonaws.com");
    }

    #[test]
    fn explicit_region_wins_over_env() {
        let cfg = TrackerConfig::from_lookup(
            Some("us-east-2".into()),
            lookup(&[("AWS_REGION", "ap-south-1")]),
        )
        .unwrap();
        assert_eq!(cfg.region, "us-east-2");

        let cfg =
            TrackerConfig::from_lookup(None, lookup(&[("AWS_REGION", "ap-south-1")])).unwrap();
        assert_eq!(cfg.region, "ap-south-1");
    }

    #[test]
    fn missing_region_is_an_error() {
        let err = TrackerConfig::from_lookup(None, lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingRegion);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = TrackerConfig::from_lookup(
            Some("local".into()),
            lookup(&[
                ("TASKLEDGER_TABLE", "Tasks"),
                ("TASKLEDGER_PAGE_SIZE", "25"),
                ("TASKLEDGER_STORE", "file:/tmp/tasks.json"),
                ("TASKLEDGER_PLATFORM_ENDPOINT", "http://localhost:4566"),
                ("TASKLEDGER_TIMEOUT_MS", "500"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.table_name, "Tasks");
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.store, StoreBackend::File("/tmp/tasks.json".into()));
        assert_eq!(cfg.platform_endpoint, "http://localhost:4566");
        assert_eq!(cfg.request_timeout_ms, 500);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = TrackerConfig::from_lookup(
            Some("local".into()),
            lookup(&[("TASKLEDGER_PAGE_SIZE", "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "TASKLEDGER_PAGE_SIZE", .. }));

        let err = TrackerConfig::from_lookup(
            Some("local".into()),
            lookup(&[("TASKLEDGER_PAGE_SIZE", "101")]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "TASKLEDGER_PAGE_SIZE",
                value: "101".into()
            }
        );

        assert!("file:".parse::<StoreBackend>().is_err());
        assert!("s3".parse::<StoreBackend>().is_err());
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
    }
}
