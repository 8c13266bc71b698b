use crate::core_ftpcommand::reply::Reply;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataChannelError {
    #[error("No free port left in the passive range")]
    RangeExhausted,

    #[error("Data connection with foreign address {0} refused")]
    ForeignAddress(std::net::IpAddr),

    #[error("Active connection to privileged port {0} refused")]
    PrivilegedPort(u16),

    #[error("PASV requires an IPv4 control connection")]
    PassiveNeedsIpv4,

    #[error("No data channel prepared")]
    NotPrepared,

    #[error("Timed out waiting for the data connection")]
    Timeout,

    #[error("Could not open data connection: {0}")]
    ConnectFailed(std::io::Error),

    #[error("Data connection failed: {0}")]
    IoFailure(std::io::Error),

    #[error("Local file error during transfer: {0}")]
    Storage(std::io::Error),
}

impl DataChannelError {
    pub fn to_ftp_response(&self) -> Reply {
        match self {
            DataChannelError::RangeExhausted => {
                Reply::new(425, "Can't open passive connection: no free port available.")
            }
            DataChannelError::ForeignAddress(_) => {
                Reply::new(425, "Rejected data connection to foreign address.")
            }
            DataChannelError::PrivilegedPort(_) => {
                Reply::new(501, "Can't connect over a privileged port.")
            }
            DataChannelError::PassiveNeedsIpv4 => {
                Reply::new(425, "PASV needs an IPv4 connection; use EPSV instead.")
            }
            DataChannelError::NotPrepared => Reply::new(425, "Use PORT or PASV first."),
            DataChannelError::Timeout | DataChannelError::ConnectFailed(_) => {
                Reply::new(425, "Can't open data connection.")
            }
            DataChannelError::IoFailure(_) => {
                Reply::new(426, "Connection closed; transfer aborted.")
            }
            DataChannelError::Storage(e) if is_out_of_space(e) => {
                Reply::new(452, "Insufficient storage space.")
            }
            DataChannelError::Storage(_) => {
                Reply::new(451, "Requested action aborted. Local error in processing.")
            }
        }
    }
}

fn is_out_of_space(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::StorageFull
}
