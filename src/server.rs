use crate::config::Config;
use crate::constants::DEFAULT_BANNER;
use crate::core_auth::helper::hash_password;
use crate::core_auth::{Authorizer, Permissions};
use crate::core_fs::FsScoper;
use crate::core_ftpcommand::reply::Reply;
use crate::core_network::network;
use crate::core_network::PassivePortPool;
use anyhow::{Context, Result};
use log::{error, info};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Everything sessions share: read-only configuration and capabilities plus
/// the passive port pool, the only cross-session mutable resource.
#[derive(Debug)]
pub struct ServerContext {
    pub config: Config,
    pub authorizer: Arc<Authorizer>,
    pub scoper: FsScoper,
    pub passive_ports: PassivePortPool,
    pub masquerade_address: Option<Ipv4Addr>,
}

impl ServerContext {
    /// Validates the configuration, creates missing home directories and
    /// registers the accounts.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let server = &config.server;
        let account = &config.account;
        let mut authorizer = Authorizer::new();

        let home = server.user_home(&account.username);
        ensure_dir(&home)?;
        let password_hash = match &account.password_hash {
            Some(hash) => hash.clone(),
            None => hash_password(&account.password, account.hash_cost)
                .context("Failed to hash the account password")?,
        };
        authorizer.add_user(
            &account.username,
            password_hash,
            &home,
            Permissions::parse(&account.permissions)?,
        )?;

        if config.anonymous.enabled {
            let anon_home = server.anonymous_home();
            ensure_dir(&anon_home)?;
            authorizer.add_anonymous(&anon_home, Permissions::parse(&config.anonymous.permissions)?)?;
        }

        let passive_ports = PassivePortPool::new(server.passive_ports())?;
        let masquerade_address = server.masquerade_ip()?;

        Ok(Self {
            authorizer: Arc::new(authorizer),
            scoper: FsScoper::new(),
            passive_ports,
            masquerade_address,
            config,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(self.config.server.bind_ip()?, self.config.server.bind_port))
    }

    pub fn greeting(&self) -> Reply {
        let banner = self.config.server.banner.as_deref().unwrap_or(DEFAULT_BANNER);
        Reply::multiline(220, banner.lines())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.config.server.idle_timeout_secs)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.config.server.data_timeout_secs)
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create home directory: {}", path.display()))?;
        info!("Created home directory {}", path.display());
    }
    Ok(())
}

pub fn log_config(config: &Config) {
    let server = &config.server;
    info!("  Bind address: {}:{}", server.bind_host, server.bind_port);
    info!("  Root directory: {}", server.root_dir.display());
    info!(
        "  Passive ports: {}-{}",
        server.passive_port_start, server.passive_port_end
    );
    if let Some(addr) = &server.masquerade_address {
        info!("  Masquerade address: {}", addr);
    }
    info!("  Permit foreign addresses: {}", server.permit_foreign_addresses);
    info!("  User: {} ({})", config.account.username, config.account.permissions);
    info!("  Anonymous access: {}", config.anonymous.enabled);
}

/// Runs the FTP server with the provided configuration until the listener
/// fails.
pub async fn run(config: Config) -> Result<()> {
    log_config(&config);
    let ctx = Arc::new(ServerContext::from_config(config)?);

    match network::start_server(ctx).await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Server stopped: {:#}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(root: &Path) -> Config {
        let mut config = Config::default();
        config.server.root_dir = root.to_path_buf();
        config.account.username = "alice".to_string();
        config.account.password = "secret".to_string();
        config.account.hash_cost = 4;
        config
    }

    #[test]
    fn homes_are_created_on_startup() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.anonymous.enabled = true;

        let ctx = ServerContext::from_config(config).unwrap();
        assert!(dir.path().join("alice").is_dir());
        assert!(dir.path().join("nobody").is_dir());
        assert!(ctx.authorizer.authenticate("alice", "secret").is_ok());
        assert!(ctx.authorizer.authenticate("anonymous", "x").is_ok());
    }

    #[test]
    fn anonymous_stays_unregistered_when_disabled() {
        let dir = tempdir().unwrap();
        let ctx = ServerContext::from_config(config(dir.path())).unwrap();
        assert!(!ctx.authorizer.has_user("anonymous"));
        assert!(!dir.path().join("nobody").exists());
    }

    #[test]
    fn prehashed_password_is_used_verbatim() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.account.password_hash = Some(hash_password("from-hash", 4).unwrap());
        let ctx = ServerContext::from_config(config).unwrap();
        assert!(ctx.authorizer.authenticate("alice", "from-hash").is_ok());
        assert!(ctx.authorizer.authenticate("alice", "secret").is_err());
    }

    #[test]
    fn invalid_passive_range_prevents_startup() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.server.passive_port_start = 3010;
        config.server.passive_port_end = 3000;
        assert!(ServerContext::from_config(config).is_err());
    }

    #[test]
    fn multi_line_banner_becomes_a_continued_greeting() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.server.banner = Some("Welcome\nBe nice".to_string());
        let ctx = ServerContext::from_config(config).unwrap();
        assert_eq!(ctx.greeting().to_wire(), "220-Welcome\r\n220 Be nice\r\n");
    }
}
