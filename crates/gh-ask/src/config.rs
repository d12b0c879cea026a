use std::collections::HashMap;

use thiserror::Error;

const TOKEN_ENVS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];
const HOST_ENV: &str = "GH_HOST";
const REPO_ENV: &str = "GH_REPO";
const GRAPHQL_URL_ENV: &str = "GH_ASK_GRAPHQL_URL";
const JQ_BIN_ENV: &str = "GH_ASK_JQ_BIN";
const BROWSER_ENVS: [&str; 2] = ["GH_BROWSER", "BROWSER"];
const TABLE_WIDTH_ENV: &str = "GH_ASK_TABLE_WIDTH";
const TIMEOUT_ENV: &str = "GH_ASK_TIMEOUT_SECS";
pub const LOG_ENV: &str = "GH_ASK_LOG";

pub const DEFAULT_HOST: &str = "github.com";
pub const DEFAULT_JQ_BIN: &str = "jq";
pub const DEFAULT_TABLE_WIDTH: usize = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const MIN_TABLE_WIDTH: i64 = 20;
const MAX_TABLE_WIDTH: i64 = 500;
const MIN_TIMEOUT_SECS: i64 = 1;
const MAX_TIMEOUT_SECS: i64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub token: Option<String>,
    pub host: String,
    pub repo: Option<String>,
    pub graphql_url: String,
    pub jq_bin: String,
    pub browser: Option<String>,
    pub table_width: usize,
    pub timeout_secs: u64,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env_map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        let lookup = |key: &str| non_empty(env_map.get(key).map(String::as_str));

        let host = parse_host(lookup(HOST_ENV))?;
        let graphql_url = lookup(GRAPHQL_URL_ENV)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| graphql_endpoint_for_host(&host));

        Ok(Self {
            token: TOKEN_ENVS
                .iter()
                .find_map(|key| lookup(key))
                .map(ToOwned::to_owned),
            host,
            repo: lookup(REPO_ENV).map(ToOwned::to_owned),
            graphql_url,
            jq_bin: lookup(JQ_BIN_ENV).unwrap_or(DEFAULT_JQ_BIN).to_string(),
            browser: BROWSER_ENVS
                .iter()
                .find_map(|key| lookup(key))
                .map(ToOwned::to_owned),
            table_width: parse_table_width(lookup(TABLE_WIDTH_ENV))?,
            timeout_secs: parse_timeout_secs(lookup(TIMEOUT_ENV))?,
        })
    }
}

pub fn graphql_endpoint_for_host(host: &str) -> String {
    if host.eq_ignore_ascii_case(DEFAULT_HOST) {
        "https://api.github.com/graphql".to_string()
    } else {
        format!("https://{host}/api/graphql")
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_host(raw: Option<&str>) -> Result<String, ConfigError> {
    let Some(value) = raw else {
        return Ok(DEFAULT_HOST.to_string());
    };

    let normalized = value.to_ascii_lowercase();
    let valid = normalized
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | ':'));
    if !valid {
        return Err(ConfigError::InvalidHost(value.to_string()));
    }

    Ok(normalized)
}

fn parse_table_width(raw: Option<&str>) -> Result<usize, ConfigError> {
    let Some(value) = raw else {
        return Ok(DEFAULT_TABLE_WIDTH);
    };

    let parsed = value
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidTableWidth(value.to_string()))?;

    Ok(parsed.clamp(MIN_TABLE_WIDTH, MAX_TABLE_WIDTH) as usize)
}

fn parse_timeout_secs(raw: Option<&str>) -> Result<u64, ConfigError> {
    let Some(value) = raw else {
        return Ok(DEFAULT_TIMEOUT_SECS);
    };

    let parsed = value
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidTimeout(value.to_string()))?;

    Ok(parsed.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS) as u64)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid GH_HOST: {0}")]
    InvalidHost(String),
    #[error("invalid GH_ASK_TABLE_WIDTH: {0}")]
    InvalidTableWidth(String),
    #[error("invalid GH_ASK_TIMEOUT_SECS: {0}")]
    InvalidTimeout(String),
}
