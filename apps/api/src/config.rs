use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which persistence backend holds the CV collection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackendKind {
    Memory,
    File,
    Postgres,
    Redis,
}

impl FromStr for StoreBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackendKind::Memory),
            "file" => Ok(StoreBackendKind::File),
            "postgres" | "postgresql" => Ok(StoreBackendKind::Postgres),
            "redis" => Ok(StoreBackendKind::Redis),
            other => bail!(
                "CV_STORE_BACKEND must be one of memory, file, postgres, redis (got '{other}')"
            ),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if the selected backend is missing its connection URL.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub store_backend: StoreBackendKind,
    pub store_slot: String,
    pub store_path: PathBuf,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend: StoreBackendKind = env_or("CV_STORE_BACKEND", "file").parse()?;
        let database_url = std::env::var("DATABASE_URL").ok();
        let redis_url = std::env::var("REDIS_URL").ok();

        match store_backend {
            StoreBackendKind::Postgres if database_url.is_none() => {
                require_env("DATABASE_URL")?;
            }
            StoreBackendKind::Redis if redis_url.is_none() => {
                require_env("REDIS_URL")?;
            }
            _ => {}
        }

        let store_slot = env_or("CV_STORE_SLOT", "applyace_cvs");
        if store_slot.trim().is_empty() {
            bail!("CV_STORE_SLOT cannot be empty");
        }

        Ok(Config {
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            store_backend,
            store_slot,
            store_path: PathBuf::from(env_or("CV_STORE_PATH", "data/cvs.json")),
            database_url,
            redis_url,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
