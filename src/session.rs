use crate::core_auth::{Account, AuthError, Permission};
use crate::core_fs::ResolvedPath;
use crate::core_network::DataChannel;
use log::debug;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

#[derive(Debug, Clone)]
pub enum SessionState {
    Unauthenticated,
    AwaitingPassword { username: String },
    Authenticated(Arc<Account>),
    Closed,
}

/// Per-connection state, owned and mutated only by its connection's task.
#[derive(Debug)]
pub struct Session {
    pub state: SessionState,
    pub current_dir: String, // Virtual path, "/" is the account's home
    pub rename_from: Option<ResolvedPath>,
    pub data_channel: Option<DataChannel>,
    pub transfer_type: TransferType,
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
    pub epsv_all: bool,
}

impl Session {
    pub fn new(peer_addr: SocketAddr, local_addr: SocketAddr) -> Self {
        Self {
            state: SessionState::Unauthenticated,
            current_dir: String::from("/"),
            rename_from: None,
            data_channel: None,
            transfer_type: TransferType::Ascii, // RFC 959 default
            peer_addr,
            local_addr,
            epsv_all: false,
        }
    }

    pub fn account(&self) -> Option<&Arc<Account>> {
        match &self.state {
            SessionState::Authenticated(account) => Some(account),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.account().is_some()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }

    /// The logged-in account, provided it holds `perm`.
    pub fn require(&self, perm: Permission) -> Result<Arc<Account>, AuthError> {
        let account = self.account().ok_or(AuthError::NotLoggedIn)?;
        if account.permissions().allows(perm) {
            Ok(Arc::clone(account))
        } else {
            Err(AuthError::PermissionDenied(perm_name(perm)))
        }
    }

    pub fn begin_login(&mut self, username: String) {
        self.reset();
        self.state = SessionState::AwaitingPassword { username };
    }

    pub fn login(&mut self, account: Arc<Account>) {
        self.reset();
        self.state = SessionState::Authenticated(account);
    }

    pub fn logout(&mut self) {
        self.reset();
        self.state = SessionState::Unauthenticated;
    }

    /// Terminal: releases the data channel and any passive port.
    pub fn close(&mut self) {
        self.reset();
        self.state = SessionState::Closed;
    }

    /// Installs the channel for the next transfer, discarding an unused one.
    pub fn set_data_channel(&mut self, channel: DataChannel) {
        self.discard_data_channel();
        self.data_channel = Some(channel);
    }

    pub fn take_data_channel(&mut self) -> Option<DataChannel> {
        self.data_channel.take()
    }

    pub fn discard_data_channel(&mut self) -> bool {
        match self.data_channel.take() {
            Some(channel) => {
                debug!("Discarding unused {} data channel for {}", channel.mode(), self.peer_addr);
                true
            }
            None => false,
        }
    }

    fn reset(&mut self) {
        self.discard_data_channel();
        self.current_dir = String::from("/");
        self.rename_from = None;
    }
}

fn perm_name(perm: Permission) -> &'static str {
    match perm {
        Permission::ChangeDir => "change directory",
        Permission::List => "list",
        Permission::Read => "read",
        Permission::Append => "append",
        Permission::Delete => "delete",
        Permission::Rename => "rename",
        Permission::MakeDir => "make directory",
        Permission::Write => "write",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_auth::helper::hash_password;
    use crate::core_auth::{Authorizer, Permissions};
    use crate::core_network::PassivePortPool;
    use std::net::{IpAddr, Ipv4Addr};
    use tempfile::tempdir;

    fn session() -> Session {
        Session::new(
            "127.0.0.1:50000".parse().unwrap(),
            "127.0.0.1:21".parse().unwrap(),
        )
    }

    fn account(perms: &str) -> (tempfile::TempDir, Arc<Account>) {
        let dir = tempdir().unwrap();
        let mut auth = Authorizer::new();
        auth.add_user(
            "alice",
            hash_password("pw", 4).unwrap(),
            dir.path(),
            Permissions::parse(perms).unwrap(),
        )
        .unwrap();
        let account = auth.authenticate("alice", "pw").unwrap();
        (dir, account)
    }

    #[test]
    fn new_session_is_unauthenticated() {
        let session = session();
        assert!(!session.is_authenticated());
        assert_eq!(session.current_dir, "/");
        assert_eq!(session.transfer_type, TransferType::Ascii);
        assert!(matches!(
            session.require(Permission::List),
            Err(AuthError::NotLoggedIn)
        ));
    }

    #[test]
    fn permission_checks_follow_the_account() {
        let (_dir, account) = account("elr");
        let mut session = session();
        session.login(account);
        assert!(session.require(Permission::Read).is_ok());
        assert!(matches!(
            session.require(Permission::Write),
            Err(AuthError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn close_releases_the_passive_port() {
        let pool = PassivePortPool::new(41400..41401).unwrap();
        let mut session = session();
        let listener = pool
            .prepare_passive(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .unwrap();
        session.set_data_channel(DataChannel::Passive(listener));
        assert_eq!(pool.ports_in_use(), 1);

        session.close();
        assert!(session.is_closed());
        assert!(session.data_channel.is_none());
        assert_eq!(pool.ports_in_use(), 0);
    }

    #[test]
    fn relogin_resets_the_working_directory() {
        let (_dir, account) = account("elradfmw");
        let mut session = session();
        session.login(Arc::clone(&account));
        session.current_dir = "/docs".to_string();
        session.begin_login("alice".to_string());
        assert_eq!(session.current_dir, "/");
        assert!(matches!(session.state, SessionState::AwaitingPassword { .. }));
    }
}
