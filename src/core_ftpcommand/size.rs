use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{or_reply, required_arg, resolve_path, send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::{Session, TransferType};

/// Handles SIZE. Refused in ASCII mode, where the byte count on the wire
/// differs from the size on disk.
pub async fn handle_size_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let account = or_reply!(writer, session.require(Permission::List));
    let arg = or_reply!(writer, required_arg(arg));
    if session.transfer_type == TransferType::Ascii {
        return send_reply(writer, &Reply::new(550, "SIZE not allowed in ASCII mode.")).await;
    }
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, arg));

    let reply = match tokio::fs::metadata(&resolved.real).await {
        Ok(meta) if meta.is_file() => Reply::new(213, meta.len().to_string()),
        Ok(_) => Reply::new(550, "Not a regular file."),
        Err(_) => Reply::new(550, "No such file."),
    };
    send_reply(writer, &reply).await
}
