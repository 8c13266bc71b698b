use crate::core_ftpcommand::error::ProtocolError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};
use crate::session::{Session, TransferType};
use log::info;

/// Handles TYPE. `A` (optionally `A N`) selects ASCII, `I` or `L 8` binary.
pub async fn handle_type_command(
    writer: &mut ControlWriter,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let upper = arg.to_ascii_uppercase();
    let parts: Vec<&str> = upper.split_whitespace().collect();
    let reply = match parts.as_slice() {
        ["A"] | ["A", "N"] => {
            session.transfer_type = TransferType::Ascii;
            Reply::new(200, "Type set to: ASCII.")
        }
        ["I"] | ["L", "8"] => {
            session.transfer_type = TransferType::Binary;
            Reply::new(200, "Type set to: Binary.")
        }
        [] => ProtocolError::Syntax("Syntax error in parameters or arguments.").to_ftp_response(),
        _ => ProtocolError::ParameterNotImplemented(arg.trim().to_string()).to_ftp_response(),
    };
    info!("TYPE {} -> {:?}", arg.trim(), session.transfer_type);
    send_reply(writer, &reply).await
}

/// Handles STRU; only file structure is supported.
pub async fn handle_stru_command(writer: &mut ControlWriter, arg: &str) -> std::io::Result<()> {
    let reply = match arg.trim().to_ascii_uppercase().as_str() {
        "F" => Reply::new(200, "Structure set to: File."),
        "" => ProtocolError::Syntax("Syntax error in parameters or arguments.").to_ftp_response(),
        _ => ProtocolError::ParameterNotImplemented(arg.trim().to_string()).to_ftp_response(),
    };
    send_reply(writer, &reply).await
}

/// Handles MODE; only stream mode is supported.
pub async fn handle_mode_command(writer: &mut ControlWriter, arg: &str) -> std::io::Result<()> {
    let reply = match arg.trim().to_ascii_uppercase().as_str() {
        "S" => Reply::new(200, "Mode set to: Stream."),
        "" => ProtocolError::Syntax("Syntax error in parameters or arguments.").to_ftp_response(),
        _ => ProtocolError::ParameterNotImplemented(arg.trim().to_string()).to_ftp_response(),
    };
    send_reply(writer, &reply).await
}
