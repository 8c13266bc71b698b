use crate::core_ftpcommand::reply::Reply;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty command line")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command line too long")]
    LineTooLong,

    #[error("Syntax error: {0}")]
    Syntax(&'static str),

    #[error("Bad sequence of commands: {0}")]
    BadSequence(&'static str),

    #[error("Parameter not implemented: {0}")]
    ParameterNotImplemented(String),

    #[error("Unsupported network protocol")]
    UnsupportedProtocol,
}

impl ProtocolError {
    pub fn to_ftp_response(&self) -> Reply {
        match self {
            ProtocolError::Empty => Reply::new(500, "Syntax error, command unrecognized."),
            ProtocolError::UnknownCommand(verb) => {
                Reply::new(500, format!("Command \"{}\" not understood.", verb))
            }
            ProtocolError::LineTooLong => Reply::new(500, "Command line too long."),
            ProtocolError::Syntax(msg) => Reply::new(501, *msg),
            ProtocolError::BadSequence(msg) => Reply::new(503, *msg),
            ProtocolError::ParameterNotImplemented(param) => {
                Reply::new(504, format!("Command not implemented for parameter \"{}\".", param))
            }
            ProtocolError::UnsupportedProtocol => {
                Reply::new(522, "Network protocol not supported, use (1,2).")
            }
        }
    }
}
