use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chirp_core::config::{DEFAULT_MAX_MEDIA_BYTES, DEFAULT_MAX_TWEET_LENGTH};
use chirp_core::{FeedPolicy, ServiceConfig};

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub media_dir: PathBuf,
    pub seed: bool,
    pub services: ServiceConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let services = ServiceConfig {
            feed: FeedPolicy {
                include_own_tweets: parse_bool(&get, "CHIRP_INCLUDE_OWN_TWEETS", false)?,
            },
            max_tweet_length: parse(&get, "CHIRP_MAX_TWEET_LENGTH", DEFAULT_MAX_TWEET_LENGTH)?,
            max_media_bytes: parse(&get, "CHIRP_MAX_MEDIA_BYTES", DEFAULT_MAX_MEDIA_BYTES)?,
            ..ServiceConfig::default()
        };

        Ok(Self {
            host: get("CHIRP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse(&get, "CHIRP_PORT", 8000)?,
            db_path: get("CHIRP_DB_PATH").unwrap_or_else(|| "chirp.db".into()).into(),
            media_dir: get("CHIRP_MEDIA_DIR").unwrap_or_else(|| "./uploads".into()).into(),
            seed: parse_bool(&get, "CHIRP_SEED", false)?,
            services,
        })
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}

fn parse_bool(get: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("{key} has invalid value {other:?}"),
    }
}
