use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error_handling::types::ConfigError;

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_channel_port() -> u16 {
    5001
}

fn default_web_port() -> u16 {
    5000
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("screenshots")
}

/// Collector configuration: where to listen and where screenshots land.
///
/// Parsed from a TOML file or from command-line flags (`clap` + `toml`
/// derive); every field has a default so a bare invocation runs a local
/// development collector.
///
/// # Fields Overview
///
/// - `bind_address`: IP address both listeners bind to
/// - `channel_port`: TCP port for the persistent device channel
/// - `web_port`: TCP port for the web interface
/// - `storage_path`: directory receiving the screenshot files (created on
///   first use)
#[derive(Parser, Debug, Clone, Deserialize)]
#[command(name = "lucarne")]
#[command(version = "0.0.1")]
#[command(about = "A real-time device screenshot collector")]
pub struct Config {
    /// Network address to bind the collector to.
    ///
    /// # Command Line
    /// Use `--bind-address <ADDRESS>` to set this value from the CLI
    #[arg(long, default_value = "0.0.0.0")]
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for the persistent device channel.
    ///
    /// # Command Line
    /// Use `--channel-port <PORT>` to set this value from the CLI
    #[arg(long, default_value_t = 5001, env = "LUCARNE_CHANNEL_PORT")]
    #[serde(default = "default_channel_port")]
    pub channel_port: u16,

    /// Port for the web interface (one-shot uploads, catalog, retrieval).
    ///
    /// # Command Line
    /// Use `--web-port <PORT>` to set this value from the CLI; the `PORT`
    /// environment variable is honored for hosted deployments
    #[arg(long, default_value_t = 5000, env = "PORT")]
    #[serde(default = "default_web_port")]
    pub web_port: u16,

    /// File system path for screenshot storage.
    ///
    /// The directory is created on first use if absent.
    ///
    /// # Command Line
    /// Use `--storage-path <PATH>` to set this value from the CLI
    #[arg(long, default_value = "screenshots", env = "LUCARNE_STORAGE_DIR")]
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

impl Config {
    /// Parse configuration from the command line.
    pub fn from_args() -> Self {
        Config::parse()
    }

    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the collector cannot serve with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::BadAddressFormat(self.bind_address.clone()));
        }
        for port in [self.channel_port, self.web_port] {
            if port < 1024 {
                return Err(ConfigError::BadPortsRange(format!(
                    "port {} is reserved (use 1024-65535)",
                    port
                )));
            }
        }
        if self.channel_port == self.web_port {
            return Err(ConfigError::BadPortsRange(format!(
                "channel and web ports must differ (both {})",
                self.channel_port
            )));
        }
        if self.storage_path.exists() && !self.storage_path.is_dir() {
            return Err(ConfigError::StorageDirUnavailable(format!(
                "{} exists and is not a directory",
                self.storage_path.display()
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    fn from_args_under_test(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(args.iter().copied())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            channel_port: default_channel_port(),
            web_port: default_web_port(),
            storage_path: default_storage_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.web_port, 5000);
        assert_eq!(config.channel_port, 5001);
        assert_eq!(config.storage_path, PathBuf::from("screenshots"));
    }

    #[test]
    #[serial]
    fn test_from_args() {
        let config = Config::from_args_under_test(&[
            "lucarne",
            "--bind-address",
            "127.0.0.1",
            "--channel-port",
            "9001",
            "--web-port",
            "9000",
            "--storage-path",
            "/tmp/shots",
        ])
        .unwrap_or_else(|e| panic!("{}", e));

        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.channel_port, 9001);
        assert_eq!(config.web_port, 9000);
        assert_eq!(config.storage_path, PathBuf::from("/tmp/shots"));
    }

    #[test]
    fn test_from_file_with_partial_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address = \"127.0.0.1\"\nweb_port = 8080").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.web_port, 8080);
        // unspecified keys fall back to defaults
        assert_eq!(config.channel_port, 5001);
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        let config = Config {
            bind_address: "not-an-ip".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadAddressFormat(_))
        ));
    }

    #[test]
    fn test_validate_rejects_reserved_and_clashing_ports() {
        let reserved = Config {
            web_port: 80,
            ..Config::default()
        };
        assert!(matches!(
            reserved.validate(),
            Err(ConfigError::BadPortsRange(_))
        ));

        let clashing = Config {
            channel_port: 5000,
            web_port: 5000,
            ..Config::default()
        };
        assert!(matches!(
            clashing.validate(),
            Err(ConfigError::BadPortsRange(_))
        ));
    }

    #[test]
    fn test_validate_rejects_file_as_storage_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Config {
            storage_path: file.path().to_path_buf(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StorageDirUnavailable(_))
        ));
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml = = =").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::TomlError(_))
        ));
        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/lucarne.toml")),
            Err(ConfigError::IoError(_))
        ));
    }
}
