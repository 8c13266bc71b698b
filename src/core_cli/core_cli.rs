use crate::config::{parse_passive_range, Config, ConfigError};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments. Anything given here overrides the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "minftpd", about = "A minimal FTP server written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Username of the FTP account
    #[arg(long)]
    pub user: Option<String>,

    /// Password of the FTP account
    #[arg(long)]
    pub password: Option<String>,

    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Control port
    #[arg(long)]
    pub port: Option<u16>,

    /// Passive port range, START-END (END excluded)
    #[arg(long, value_name = "START-END")]
    pub passive: Option<String>,

    /// Allow anonymous logins
    #[arg(long)]
    pub anon: bool,

    /// Directory holding the home directories
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Accept data connections from hosts other than the control peer
    #[arg(long)]
    pub permit_foreign_addresses: bool,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn apply_to(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(user) = &self.user {
            config.account.username = user.clone();
        }
        if let Some(password) = &self.password {
            config.account.password = password.clone();
            config.account.password_hash = None;
        }
        if let Some(host) = &self.host {
            config.server.bind_host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.bind_port = port;
        }
        if let Some(passive) = &self.passive {
            let (start, end) = parse_passive_range(passive)?;
            config.server.passive_port_start = start;
            config.server.passive_port_end = end;
        }
        if let Some(root) = &self.root {
            config.server.root_dir = root.clone();
        }
        if self.anon {
            config.anonymous.enabled = true;
        }
        if self.permit_foreign_addresses {
            config.server.permit_foreign_addresses = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_config() {
        let cli = Cli::parse_from([
            "minftpd",
            "--user",
            "alice",
            "--password",
            "secret",
            "--host",
            "127.0.0.1",
            "--port",
            "2121",
            "--passive",
            "4000-4010",
            "--anon",
        ]);
        let mut config = Config::default();
        config.account.password_hash = Some("stale".to_string());
        cli.apply_to(&mut config).unwrap();

        assert_eq!(config.account.username, "alice");
        assert_eq!(config.account.password, "secret");
        assert!(config.account.password_hash.is_none());
        assert_eq!(config.server.bind_host, "127.0.0.1");
        assert_eq!(config.server.bind_port, 2121);
        assert_eq!(config.server.passive_ports(), 4000..4010);
        assert!(config.anonymous.enabled);
        assert!(!config.server.permit_foreign_addresses);
    }

    #[test]
    fn absent_flags_keep_the_config() {
        let cli = Cli::parse_from(["minftpd"]);
        let mut config = Config::default();
        cli.apply_to(&mut config).unwrap();
        assert_eq!(config.server.bind_port, 21);
        assert_eq!(config.account.username, "user");
        assert!(!config.anonymous.enabled);
    }

    #[test]
    fn malformed_passive_range_is_an_error() {
        let cli = Cli::parse_from(["minftpd", "--passive", "4000"]);
        assert!(cli.apply_to(&mut Config::default()).is_err());
    }
}
