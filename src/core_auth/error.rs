use crate::core_ftpcommand::reply::Reply;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials for user {0}")]
    InvalidCredentials(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Permission denied: {0}")]
    PermissionDenied(&'static str),

    #[error("Home directory {path} is unusable: {source}")]
    InvalidHome {
        path: String,
        source: std::io::Error,
    },

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl AuthError {
    pub fn to_ftp_response(&self) -> Reply {
        match self {
            // Same text for both so USER probing learns nothing.
            AuthError::InvalidCredentials(_) | AuthError::UnknownUser(_) => {
                Reply::new(530, "Login incorrect.")
            }
            AuthError::NotLoggedIn => Reply::new(530, "Log in with USER and PASS first."),
            AuthError::PermissionDenied(_) => Reply::new(550, "Permission denied."),
            _ => Reply::new(451, "Requested action aborted. Local error in processing."),
        }
    }
}
