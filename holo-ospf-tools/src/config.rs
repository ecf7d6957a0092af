//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub interface: String,
    pub output: Output,
    pub logging: Logging,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Output {
    pub pretty: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub filter: String,
    pub stderr: LoggingStderr,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingStderr {
    pub enabled: bool,
    #[serde(flatten)]
    pub fmt: LoggingFmt,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFmt {
    pub style: LoggingFmtStyle,
    pub colors: bool,
    pub show_thread_id: bool,
    pub show_source: bool,
}

#[derive(Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    Full,
    Json,
    Pretty,
}

#[derive(Debug)]
pub enum ConfigError {
    Read(String, std::io::Error),
    Parse(String, toml::de::Error),
}

// ===== impl Config =====

impl Config {
    // Loads the configuration from the given file, or returns the default
    // configuration when no file is given.
    pub(crate) fn load(
        config_file: Option<&str>,
    ) -> Result<Config, ConfigError> {
        let Some(config_file) = config_file else {
            return Ok(Config::default());
        };

        let config_str = std::fs::read_to_string(config_file)
            .map_err(|error| ConfigError::Read(config_file.to_owned(), error))?;
        toml::from_str(&config_str)
            .map_err(|error| ConfigError::Parse(config_file.to_owned(), error))
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            interface: "-".to_owned(),
            output: Default::default(),
            logging: Default::default(),
        }
    }
}

// ===== impl Output =====

impl Default for Output {
    fn default() -> Output {
        Output { pretty: true }
    }
}

// ===== impl Logging =====

impl Default for Logging {
    fn default() -> Logging {
        Logging {
            filter: "holo_ospf_lsdb=warn".to_owned(),
            stderr: Default::default(),
        }
    }
}

// ===== impl LoggingStderr =====

impl Default for LoggingStderr {
    fn default() -> LoggingStderr {
        LoggingStderr {
            enabled: true,
            fmt: Default::default(),
        }
    }
}

// ===== impl LoggingFmt =====

impl Default for LoggingFmt {
    fn default() -> LoggingFmt {
        LoggingFmt {
            style: LoggingFmtStyle::Compact,
            colors: false,
            show_thread_id: false,
            show_source: false,
        }
    }
}

// ===== impl ConfigError =====

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(path, ..) => {
                write!(f, "failed to read configuration file {path}")
            }
            ConfigError::Parse(path, ..) => {
                write!(f, "failed to parse configuration file {path}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(_, error) => Some(error),
            ConfigError::Parse(_, error) => Some(error),
        }
    }
}

// ===== unit tests =====
