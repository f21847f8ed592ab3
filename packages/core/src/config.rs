use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cli::Cli;

const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceKind,
    pub database_url: Option<String>,
    pub data_path: Option<PathBuf>,
    pub bind_addr: String,
    pub cors_allow_origin: Option<String>,
}

/// Where benchmark records are served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Sqlite,
    Memory,
    Fixture,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(SourceKind::Sqlite),
            "memory" => Ok(SourceKind::Memory),
            "fixture" => Ok(SourceKind::Fixture),
            other => Err(format!("Invalid BENCHMARK_SOURCE: {}", other)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let source = match var("BENCHMARK_SOURCE") {
            Some(raw) => raw.parse::<SourceKind>()?,
            None => SourceKind::Fixture,
        };

        let bind_addr = match var("BIND_ADDR") {
            Some(addr) => addr,
            None => {
                let port = match var("PORT") {
                    Some(raw) => raw
                        .parse::<u16>()
                        .map_err(|_| "PORT must be a valid port number")?,
                    None => DEFAULT_PORT,
                };
                format!("0.0.0.0:{}", port)
            }
        };

        Ok(Self {
            source,
            database_url: var("DATABASE_URL"),
            data_path: var("BENCHMARK_DATA_PATH").map(PathBuf::from),
            bind_addr,
            cors_allow_origin: var("CORS_ALLOW_ORIGIN"),
        })
    }

    /// Apply command-line overrides, then check the chosen source has what
    /// it needs.
    pub fn apply_cli(mut self, cli: &Cli) -> Result<Self, String> {
        if let Some(source) = cli.source.as_deref() {
            self.source = source.parse()?;
        }
        if let Some(url) = cli.database_url.clone() {
            self.database_url = Some(url);
        }
        if let Some(path) = cli.data_path.clone() {
            self.data_path = Some(path);
        }
        if let Some(bind) = cli.bind.clone() {
            self.bind_addr = bind;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.source {
            SourceKind::Sqlite if self.database_url.is_none() => {
                Err("DATABASE_URL is required when BENCHMARK_SOURCE is sqlite".to_string())
            }
            SourceKind::Memory if self.data_path.is_none() => {
                Err("BENCHMARK_DATA_PATH is required when BENCHMARK_SOURCE is memory".to_string())
            }
            _ => Ok(()),
        }
    }
}
