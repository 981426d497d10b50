use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::domain::SourceId;
use crate::error::FetchError;
use crate::resolver::{PingRule, ResolverSettings, RetentionWindow};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub save_dir: Option<String>,
    #[serde(default)]
    pub priority: Option<Vec<String>>,
    #[serde(default)]
    pub grib_size_threshold: Option<u64>,
    #[serde(default)]
    pub retention: Option<Vec<RetentionWindow>>,
    #[serde(default)]
    pub ping_before: Option<Vec<PingRule>>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub save_dir: Utf8PathBuf,
    pub priority: Option<Vec<SourceId>>,
    pub resolver: ResolverSettings,
}

impl Config {
    pub fn load(path: Option<&str>) -> Result<Self, FetchError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => {
                let Some(default_path) = default_config_path() else {
                    return Self::defaults();
                };
                if !default_path.exists() {
                    return Self::defaults();
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| FetchError::ConfigRead(config_path.clone()))?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|err| FetchError::ConfigParse(err.to_string()))?;
        Self::resolve_file(file)
    }

    pub fn defaults() -> Result<Self, FetchError> {
        Ok(Self {
            save_dir: default_save_dir()?,
            priority: None,
            resolver: ResolverSettings::default(),
        })
    }

    pub fn resolve_file(file: ConfigFile) -> Result<Self, FetchError> {
        let defaults = ResolverSettings::default();
        let priority = file
            .priority
            .map(|list| {
                list.iter()
                    .map(|name| name.parse())
                    .collect::<Result<Vec<SourceId>, FetchError>>()
            })
            .transpose()?;
        let save_dir = match file.save_dir {
            Some(dir) => Utf8PathBuf::from(dir),
            None => default_save_dir()?,
        };
        Ok(Self {
            save_dir,
            priority,
            resolver: ResolverSettings {
                grib_size_threshold: file
                    .grib_size_threshold
                    .unwrap_or(defaults.grib_size_threshold),
                retention: file.retention.unwrap_or(defaults.retention),
                ping_before: file.ping_before.unwrap_or(defaults.ping_before),
            },
        })
    }
}

fn default_save_dir() -> Result<Utf8PathBuf, FetchError> {
    BaseDirs::new()
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.home_dir().join("data")).ok())
        .ok_or_else(|| FetchError::Filesystem("unable to resolve home directory".to_string()))
}

fn default_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join("gribfetch")
            .join("config.json")
    })
}
