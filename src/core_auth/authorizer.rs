use crate::constants::ANONYMOUS_USERNAME;
use crate::core_auth::helper::verify_password;
use crate::core_auth::{AuthError, Permissions};
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    Named { password_hash: String },
    /// Any password is accepted.
    Anonymous,
}

/// A registered identity. Immutable once the server is running.
#[derive(Debug, Clone)]
pub struct Account {
    username: String,
    kind: AccountKind,
    home: PathBuf,
    permissions: Permissions,
}

impl Account {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == AccountKind::Anonymous
    }

    /// Canonical home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    fn accepts(&self, password: &str) -> bool {
        match &self.kind {
            AccountKind::Named { password_hash } => verify_password(password, password_hash),
            AccountKind::Anonymous => true,
        }
    }
}

/// Preloaded account table shared read-only by every session.
#[derive(Debug, Default)]
pub struct Authorizer {
    accounts: HashMap<String, Arc<Account>>,
}

impl Authorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named account. `home` must exist.
    pub fn add_user(
        &mut self,
        username: &str,
        password_hash: String,
        home: &Path,
        permissions: Permissions,
    ) -> Result<(), AuthError> {
        let account = Account {
            username: username.to_string(),
            kind: AccountKind::Named { password_hash },
            home: canonical_home(home)?,
            permissions,
        };
        info!("Registered user {} with permissions {}", username, permissions);
        self.accounts.insert(username.to_string(), Arc::new(account));
        Ok(())
    }

    pub fn add_anonymous(&mut self, home: &Path, permissions: Permissions) -> Result<(), AuthError> {
        let account = Account {
            username: ANONYMOUS_USERNAME.to_string(),
            kind: AccountKind::Anonymous,
            home: canonical_home(home)?,
            permissions,
        };
        info!("Anonymous access enabled with permissions {}", permissions);
        self.accounts
            .insert(ANONYMOUS_USERNAME.to_string(), Arc::new(account));
        Ok(())
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.accounts.contains_key(&Self::lookup_key(username))
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<Arc<Account>, AuthError> {
        let account = self
            .accounts
            .get(&Self::lookup_key(username))
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;

        if account.accepts(password) {
            debug!("Authenticated {}", account.username());
            Ok(Arc::clone(account))
        } else {
            Err(AuthError::InvalidCredentials(username.to_string()))
        }
    }

    pub fn permissions(&self, account: &Account) -> Permissions {
        account.permissions()
    }

    pub fn home_directory<'a>(&self, account: &'a Account) -> &'a Path {
        account.home()
    }

    fn lookup_key(username: &str) -> String {
        if username.eq_ignore_ascii_case(ANONYMOUS_USERNAME) {
            ANONYMOUS_USERNAME.to_string()
        } else {
            username.to_string()
        }
    }
}

fn canonical_home(home: &Path) -> Result<PathBuf, AuthError> {
    home.canonicalize().map_err(|source| AuthError::InvalidHome {
        path: home.display().to_string(),
        source,
    })
}
