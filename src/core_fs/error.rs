use crate::core_ftpcommand::reply::Reply;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path escapes the home directory")]
    Escape,

    #[error("Invalid file name")]
    InvalidName,

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl PathError {
    /// Replies never mention real paths.
    pub fn to_ftp_response(&self) -> Reply {
        match self {
            PathError::Escape => Reply::new(550, "Permission denied: path is outside the home directory."),
            PathError::InvalidName => Reply::new(553, "File name not allowed."),
            PathError::Io(_) => Reply::new(550, "No such file or directory."),
        }
    }
}
