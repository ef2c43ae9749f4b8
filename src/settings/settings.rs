use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub session: Session,
    pub http: Http,
    pub log: Log,
    pub mysql: MySql,
    pub redis: Redis,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub backend: String, // "real", "memory" or "fake"
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub revoke_concurrency: usize,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub cert_path: String,
    pub key_path: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct MySql {
    pub dsn: String,
}

#[derive(Debug, Deserialize)]
pub struct Redis {
    pub dsn: String,
    pub prefix: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
