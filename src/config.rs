use crate::constants::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Invalid passive port range {0}-{1}: start must be lower than end")]
    InvalidPassiveRange(u16, u16),

    #[error("Invalid passive port range specification: {0}")]
    InvalidPassiveSpec(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid permission letter '{0}'")]
    InvalidPermission(char),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_host: String,
    pub bind_port: u16,
    pub root_dir: PathBuf,
    pub passive_port_start: u16,
    pub passive_port_end: u16,
    pub masquerade_address: Option<String>, // Public IPv4 announced in PASV replies
    pub permit_foreign_addresses: bool,
    pub idle_timeout_secs: u64,
    pub data_timeout_secs: u64,
    pub upload_buffer_size: usize,
    pub download_buffer_size: usize,
    pub banner: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
    pub password_hash: Option<String>, // bcrypt hash, wins over `password`
    pub permissions: String,
    pub hash_cost: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnonymousConfig {
    pub enabled: bool,
    pub permissions: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub account: AccountConfig,
    pub anonymous: AnonymousConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: String::from(DEFAULT_BIND_HOST),
            bind_port: DEFAULT_BIND_PORT,
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            passive_port_start: DEFAULT_PASSIVE_PORT_START,
            passive_port_end: DEFAULT_PASSIVE_PORT_END,
            masquerade_address: None,
            permit_foreign_addresses: false,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            data_timeout_secs: DEFAULT_DATA_TIMEOUT_SECS,
            upload_buffer_size: DEFAULT_UPLOAD_BUFFER_SIZE,
            download_buffer_size: DEFAULT_DOWNLOAD_BUFFER_SIZE,
            banner: None,
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            username: String::from(DEFAULT_USERNAME),
            password: String::from(DEFAULT_PASSWORD),
            password_hash: None,
            permissions: String::from(DEFAULT_USER_PERMISSIONS),
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for AnonymousConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            permissions: String::from(DEFAULT_ANONYMOUS_PERMISSIONS),
        }
    }
}

impl ServerConfig {
    /// Passive ports as a half-open range, `[start, end)`.
    pub fn passive_ports(&self) -> Range<u16> {
        self.passive_port_start..self.passive_port_end
    }

    pub fn masquerade_ip(&self) -> Result<Option<Ipv4Addr>, ConfigError> {
        match &self.masquerade_address {
            Some(addr) => addr
                .parse::<Ipv4Addr>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidAddress(addr.clone())),
            None => Ok(None),
        }
    }

    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_host
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.bind_host.clone()))
    }

    pub fn user_home(&self, username: &str) -> PathBuf {
        self.root_dir.join(username)
    }

    pub fn anonymous_home(&self) -> PathBuf {
        self.root_dir.join(ANONYMOUS_HOME)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&config_str, &path.display().to_string())
    }

    fn from_toml(config_str: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(config_str).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Rejects configurations the server must refuse to start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        if server.passive_port_start >= server.passive_port_end {
            return Err(ConfigError::InvalidPassiveRange(
                server.passive_port_start,
                server.passive_port_end,
            ));
        }
        server.bind_ip()?;
        server.masquerade_ip()?;

        let username = &self.account.username;
        let username_re = Regex::new(USERNAME_REGEX)
            .map_err(|_| ConfigError::InvalidUsername(username.clone()))?;
        if !username_re.is_match(username) || username.eq_ignore_ascii_case(ANONYMOUS_USERNAME) {
            return Err(ConfigError::InvalidUsername(username.clone()));
        }

        crate::core_auth::Permissions::parse(&self.account.permissions)?;
        crate::core_auth::Permissions::parse(&self.anonymous.permissions)?;
        Ok(())
    }
}

/// Parses the `START-END` passive range notation used on the command line.
pub fn parse_passive_range(spec: &str) -> Result<(u16, u16), ConfigError> {
    let invalid = || ConfigError::InvalidPassiveSpec(spec.to_string());
    let (start, end) = spec.split_once('-').ok_or_else(invalid)?;
    let start = start.trim().parse::<u16>().map_err(|_| invalid())?;
    let end = end.trim().parse::<u16>().map_err(|_| invalid())?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_deployment() {
        let config = Config::default();
        assert_eq!(config.server.bind_port, 21);
        assert_eq!(config.server.passive_ports(), 3000..3010);
        assert_eq!(config.account.username, "user");
        assert_eq!(config.account.permissions, "elradfmw");
        assert!(!config.anonymous.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            bind_port = 2121
            passive_port_start = 40000
            passive_port_end = 40100

            [anonymous]
            enabled = true
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.server.bind_port, 2121);
        assert_eq!(config.server.passive_ports(), 40000..40100);
        assert_eq!(config.server.bind_host, "0.0.0.0");
        assert!(config.anonymous.enabled);
        assert_eq!(config.anonymous.permissions, "elr");
        assert_eq!(config.account.username, "user");
    }

    #[test]
    fn empty_or_reversed_passive_range_is_rejected() {
        let mut config = Config::default();
        config.server.passive_port_start = 3010;
        config.server.passive_port_end = 3010;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPassiveRange(3010, 3010))
        ));

        config.server.passive_port_start = 4000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_usernames_are_rejected() {
        let mut config = Config::default();
        config.account.username = "../root".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUsername(_))));

        config.account.username = "Anonymous".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUsername(_))));
    }

    #[test]
    fn unknown_permission_letter_is_rejected() {
        let mut config = Config::default();
        config.anonymous.permissions = "elrx".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPermission('x'))
        ));
    }

    #[test]
    fn passive_range_spec_parses() {
        assert_eq!(parse_passive_range("3000-3010").unwrap(), (3000, 3010));
        assert!(parse_passive_range("3000").is_err());
        assert!(parse_passive_range("a-b").is_err());
    }

    #[test]
    fn home_directories_are_rooted() {
        let config = Config::default();
        assert_eq!(config.server.user_home("alice"), PathBuf::from("/ftp_root/alice"));
        assert_eq!(config.server.anonymous_home(), PathBuf::from("/ftp_root/nobody"));
    }
}
