use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub database: Database,
    pub http: Http,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub issuer: String,
    /// Signing secrets for the two token kinds; never interchangeable.
    /// Overridable via ACCESS_TOKEN_SECRET / REFRESH_TOKEN_SECRET env vars.
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl Auth {
    pub fn access_secret(&self) -> Vec<u8> {
        std::env::var("ACCESS_TOKEN_SECRET")
            .unwrap_or_else(|_| self.access_secret.clone())
            .into_bytes()
    }

    pub fn refresh_secret(&self) -> Vec<u8> {
        std::env::var("REFRESH_TOKEN_SECRET")
            .unwrap_or_else(|_| self.refresh_secret.clone())
            .into_bytes()
    }
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub backend: String, // "mysql" or "memory"
    pub dsn: String,
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
