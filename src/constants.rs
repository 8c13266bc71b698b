// src/constants.rs

pub const USERNAME_REGEX: &str = r"^[a-zA-Z0-9_.-]{1,32}$";
pub const ANONYMOUS_USERNAME: &str = "anonymous";
pub const ANONYMOUS_HOME: &str = "nobody";

pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_BIND_PORT: u16 = 21;
pub const DEFAULT_ROOT_DIR: &str = "/ftp_root";
pub const DEFAULT_PASSIVE_PORT_START: u16 = 3000;
pub const DEFAULT_PASSIVE_PORT_END: u16 = 3010;
pub const DEFAULT_USERNAME: &str = "user";
pub const DEFAULT_PASSWORD: &str = "password";

/// pyftpdlib permission letters: full access for the configured account.
pub const DEFAULT_USER_PERMISSIONS: &str = "elradfmw";
pub const DEFAULT_ANONYMOUS_PERMISSIONS: &str = "elr";

pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_DATA_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPLOAD_BUFFER_SIZE: usize = 256 * 1024;
pub const DEFAULT_DOWNLOAD_BUFFER_SIZE: usize = 128 * 1024;

pub const DEFAULT_BANNER: &str = "minftpd ready.";

/// Longest accepted control line, CRLF included.
pub const MAX_COMMAND_LINE: usize = 2048;

/// Active-mode targets below this port are refused.
pub const MIN_ACTIVE_PORT: u16 = 1024;
