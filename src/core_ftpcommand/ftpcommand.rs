use crate::core_ftpcommand::error::ProtocolError;
use std::str::FromStr;

#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    PWD,
    CWD,
    CDUP,
    TYPE,
    STRU,
    MODE,
    PASV,
    EPSV,
    PORT,
    EPRT,
    RETR,
    STOR,
    APPE,
    LIST,
    NLST,
    DELE,
    RNFR,
    RNTO,
    MKD,
    RMD,
    SIZE,
    MDTM,
    NOOP,
    SYST,
    FEAT,
    ALLO,
    ABOR,
}

impl FtpCommand {
    /// Commands usable before USER/PASS succeeded.
    pub fn allowed_before_login(self) -> bool {
        matches!(
            self,
            FtpCommand::USER
                | FtpCommand::PASS
                | FtpCommand::QUIT
                | FtpCommand::NOOP
                | FtpCommand::SYST
                | FtpCommand::FEAT
        )
    }
}

impl FromStr for FtpCommand {
    type Err = ProtocolError;

    fn from_str(cmd: &str) -> Result<Self, Self::Err> {
        Ok(match cmd.to_ascii_uppercase().as_str() {
            "USER" => FtpCommand::USER,
            "PASS" => FtpCommand::PASS,
            "QUIT" => FtpCommand::QUIT,
            "PWD" | "XPWD" => FtpCommand::PWD,
            "CWD" | "XCWD" => FtpCommand::CWD,
            "CDUP" | "XCUP" => FtpCommand::CDUP,
            "TYPE" => FtpCommand::TYPE,
            "STRU" => FtpCommand::STRU,
            "MODE" => FtpCommand::MODE,
            "PASV" => FtpCommand::PASV,
            "EPSV" => FtpCommand::EPSV,
            "PORT" => FtpCommand::PORT,
            "EPRT" => FtpCommand::EPRT,
            "RETR" => FtpCommand::RETR,
            "STOR" => FtpCommand::STOR,
            "APPE" => FtpCommand::APPE,
            "LIST" => FtpCommand::LIST,
            "NLST" => FtpCommand::NLST,
            "DELE" => FtpCommand::DELE,
            "RNFR" => FtpCommand::RNFR,
            "RNTO" => FtpCommand::RNTO,
            "MKD" | "XMKD" => FtpCommand::MKD,
            "RMD" | "XRMD" => FtpCommand::RMD,
            "SIZE" => FtpCommand::SIZE,
            "MDTM" => FtpCommand::MDTM,
            "NOOP" => FtpCommand::NOOP,
            "SYST" => FtpCommand::SYST,
            "FEAT" => FtpCommand::FEAT,
            "ALLO" => FtpCommand::ALLO,
            "ABOR" => FtpCommand::ABOR,
            _ => return Err(ProtocolError::UnknownCommand(printable_verb(cmd))),
        })
    }
}

/// The part of an unknown verb that is safe to echo back on the control
/// channel.
fn printable_verb(cmd: &str) -> String {
    cmd.chars()
        .filter(char::is_ascii_alphanumeric)
        .take(16)
        .collect()
}

/// One parsed control line: the verb and its raw argument, spaces kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: FtpCommand,
    pub arg: String,
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let line = line.trim_start();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }
        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb, arg),
            None => (line, ""),
        };
        Ok(Command {
            verb: verb.parse()?,
            arg: arg.to_string(),
        })
    }
}

impl Command {
    /// The line as it may be logged; passwords are masked.
    pub fn loggable(&self) -> String {
        match self.verb {
            FtpCommand::PASS => "PASS ******".to_string(),
            verb if self.arg.is_empty() => format!("{:?}", verb),
            verb => format!("{:?} {}", verb, self.arg),
        }
    }
}
