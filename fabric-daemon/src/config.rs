//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use fabric_server::consts::AGGREGATION_SWITCH_ID;
use fabric_utils::id::DatapathId;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub port_map: String,
    pub isl_map: String,
    pub aggregation_switches: Vec<DatapathId>,
    pub ipc: Ipc,
    pub logging: Logging,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ipc {
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub journald: LoggingJournald,
    pub file: LoggingFile,
    pub stdout: LoggingStdout,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingJournald {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFile {
    pub enabled: bool,
    pub dir: String,
    pub name: String,
    pub rotation: LoggingFileRotation,
    #[serde(flatten)]
    pub fmt: LoggingFmt,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingStdout {
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

#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFileRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

#[derive(Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    Full,
    Json,
    Pretty,
}

// ===== impl Config =====

impl Config {
    const DFLT_FILEPATH: &'static str = "/etc/fabricd.toml";

    pub(crate) fn load(config_file: Option<&str>) -> Config {
        let config_file = config_file.unwrap_or(Config::DFLT_FILEPATH);

        match std::fs::read_to_string(config_file) {
            Ok(config_str) => toml::from_str(&config_str)
                .expect("Failed to parse configuration file"),
            Err(err) => {
                eprintln!("Failed to load configuration file: {err}");
                eprintln!("Falling back to default configuration...");
                Config::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            port_map: "/etc/fabricd/port_map.csv".to_owned(),
            isl_map: "/etc/fabricd/isl_map.csv".to_owned(),
            aggregation_switches: vec![AGGREGATION_SWITCH_ID],
            ipc: Default::default(),
            logging: Default::default(),
        }
    }
}

// ===== impl Ipc =====

impl Default for Ipc {
    fn default() -> Ipc {
        Ipc {
            address: "[::]:6666".to_owned(),
        }
    }
}

// ===== impl LoggingJournald =====

impl Default for LoggingJournald {
    fn default() -> LoggingJournald {
        LoggingJournald { enabled: false }
    }
}

// ===== impl LoggingFile =====

impl Default for LoggingFile {
    fn default() -> LoggingFile {
        LoggingFile {
            enabled: true,
            dir: "/var/log".to_owned(),
            name: "fabricd.log".to_owned(),
            rotation: Default::default(),
            fmt: Default::default(),
        }
    }
}

// ===== impl LoggingStdout =====

impl Default for LoggingStdout {
    fn default() -> LoggingStdout {
        LoggingStdout {
            enabled: false,
            fmt: Default::default(),
        }
    }
}

// ===== impl LoggingFmt =====

impl Default for LoggingFmt {
    fn default() -> LoggingFmt {
        LoggingFmt {
            style: LoggingFmtStyle::Full,
            colors: false,
            show_thread_id: false,
            show_source: false,
        }
    }
}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.ipc.address, "[::]:6666");
        assert_eq!(config.aggregation_switches, vec![AGGREGATION_SWITCH_ID]);
        assert!(config.logging.file.enabled);
        assert!(!config.logging.stdout.enabled);
        assert_eq!(config.logging.file.fmt.style, LoggingFmtStyle::Full);
    }

    #[test]
    fn test_parse() {
        let config: Config = toml::from_str(
            r#"
            port_map = "/tmp/port_map.csv"
            aggregation_switches = ["0x7266767372667673", "0xa"]

            [ipc]
            address = "127.0.0.1:7890"

            [logging.stdout]
            enabled = true
            style = "json"

            [logging.file]
            rotation = "daily"
            "#,
        )
        .unwrap();
        assert_eq!(config.port_map, "/tmp/port_map.csv");
        assert_eq!(config.isl_map, "/etc/fabricd/isl_map.csv");
        assert_eq!(
            config.aggregation_switches,
            vec![AGGREGATION_SWITCH_ID, DatapathId::new(0xa)]
        );
        assert_eq!(config.ipc.address, "127.0.0.1:7890");
        assert!(config.logging.stdout.enabled);
        assert_eq!(config.logging.stdout.fmt.style, LoggingFmtStyle::Json);
        assert_eq!(config.logging.file.rotation, LoggingFileRotation::Daily);
    }

    #[test]
    fn test_unknown_field() {
        assert!(toml::from_str::<Config>("ports = 1").is_err());
    }
}
