//! Configuration module
//!
//! Settings are read from the environment (a `.env` file is loaded first when present).
//! Parsing goes through [`Config::from_lookup`] so tests can supply variables without
//! touching the process environment.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::QualityTier;

const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_VIDEO_SIZE_MB: usize = 500;
const MAX_CONCURRENT_TRANSCODES: usize = 2;
const UPLOAD_DIR: &str = "./uploads";
const FFMPEG_PATH: &str = "ffmpeg";
const TRANSCODE_TIERS: &str = "720p,1080p";

/// Where video records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStoreBackend {
    Postgres,
    Memory,
}

impl FromStr for RecordStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(RecordStoreBackend::Postgres),
            "memory" => Ok(RecordStoreBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid record store backend: {}", s)),
        }
    }
}

impl Display for RecordStoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecordStoreBackend::Postgres => write!(f, "postgres"),
            RecordStoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub record_store: RecordStoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Storage root shared by originals and derived artifacts
    pub upload_dir: PathBuf,
    pub ffmpeg_path: String,
    /// Tiers derived for every upload, in derivation order
    pub transcode_tiers: Vec<QualityTier>,
    pub max_concurrent_transcodes: usize,
    pub max_video_size_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let record_store = lookup("RECORD_STORE")
            .map(|s| s.parse::<RecordStoreBackend>())
            .transpose()?
            .unwrap_or(RecordStoreBackend::Postgres);

        let transcode_tiers = lookup("TRANSCODE_TIERS")
            .unwrap_or_else(|| TRANSCODE_TIERS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<QualityTier>)
            .collect::<Result<Vec<_>, _>>()?;

        let max_video_size_mb = lookup("MAX_VIDEO_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_VIDEO_SIZE_MB);
        let max_video_size_bytes = max_video_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_VIDEO_SIZE_MB is too large"))?;

        Ok(Config {
            server_port: lookup("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            record_store,
            database_url: lookup("DATABASE_URL"),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            upload_dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| UPLOAD_DIR.to_string())),
            ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or_else(|| FFMPEG_PATH.to_string()),
            transcode_tiers,
            max_concurrent_transcodes: lookup("MAX_CONCURRENT_TRANSCODES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONCURRENT_TRANSCODES),
            max_video_size_bytes,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.record_store == RecordStoreBackend::Postgres && self.database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be set when RECORD_STORE is postgres"
            ));
        }

        if self.upload_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_DIR cannot be empty"));
        }

        if self.ffmpeg_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FFMPEG_PATH cannot be empty"));
        }

        if self.max_concurrent_transcodes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_TRANSCODES must be at least 1"
            ));
        }

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be at least 1"));
        }

        let mut seen = Vec::with_capacity(self.transcode_tiers.len());
        for tier in &self.transcode_tiers {
            if seen.contains(tier) {
                return Err(anyhow::anyhow!("TRANSCODE_TIERS lists {} twice", tier));
            }
            seen.push(*tier);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port, 4000);
        assert_eq!(config.record_store, RecordStoreBackend::Postgres);
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.ffmpeg_path, "ffmpeg");
        assert_eq!(
            config.transcode_tiers,
            vec![QualityTier::Hd720, QualityTier::Hd1080]
        );
        assert_eq!(config.max_concurrent_transcodes, 2);
        assert_eq!(config.max_video_size_bytes, 500 * 1024 * 1024);
        assert!(!config.is_production());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let config = config_from(&[]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("DATABASE_URL", "postgres://localhost/videos")]).unwrap();
        assert!(config.validate().is_ok());

        let config = config_from(&[("RECORD_STORE", "memory")]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        let result = config_from(&[("TRANSCODE_TIERS", "720p,4k")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_tier_fails_validation() {
        let config = config_from(&[
            ("RECORD_STORE", "memory"),
            ("TRANSCODE_TIERS", "720p,720P"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let config = config_from(&[("RECORD_STORE", "memory"), ("ENVIRONMENT", "production")])
            .unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());

        let config = config_from(&[
            ("RECORD_STORE", "memory"),
            ("ENVIRONMENT", "production"),
            ("CORS_ORIGINS", "https://videos.example.com"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_video_limit_is_rejected() {
        let result = config_from(&[
            ("RECORD_STORE", "memory"),
            ("MAX_VIDEO_SIZE_MB", &usize::MAX.to_string()),
        ]);
        assert!(result.is_err());

        let config = config_from(&[("RECORD_STORE", "memory"), ("MAX_VIDEO_SIZE_MB", "2")]).unwrap();
        assert_eq!(config.max_video_size_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_zero_concurrency_fails_validation() {
        let config = config_from(&[
            ("RECORD_STORE", "memory"),
            ("MAX_CONCURRENT_TRANSCODES", "0"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }
}
