use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{
    open_data_connection, or_reply, required_arg, resolve_path, send_reply, stream_payload,
    ControlWriter, TransferKind,
};
use crate::core_network::Payload;
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};
use std::io::ErrorKind;
use tokio::fs::OpenOptions;

/// Handles STOR, and APPE when `append` is set.
///
/// STOR creates or truncates the target; APPE creates or appends to it. The
/// file is only touched once the data connection is up, so a refused
/// transfer leaves it as it was.
pub async fn handle_stor_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
    append: bool,
) -> std::io::Result<()> {
    let (perm, what) = if append {
        (Permission::Append, "APPE")
    } else {
        (Permission::Write, "STOR")
    };
    let account = or_reply!(writer, session.require(perm));
    let arg = or_reply!(writer, required_arg(arg));
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, arg));

    let is_dir = resolved.is_home()
        || tokio::fs::metadata(&resolved.real)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
    if is_dir {
        return send_reply(writer, &Reply::new(550, "Is a directory.")).await;
    }

    let Some(conn) = open_data_connection(writer, ctx, session, what).await? else {
        return Ok(());
    };

    let mut file = match OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(&resolved.real)
        .await
    {
        Ok(file) => file,
        Err(e) => {
            warn!("{}: failed to open {}: {}", what, resolved.virtual_path, e);
            let reply = match e.kind() {
                ErrorKind::NotFound => Reply::new(550, "No such directory."),
                ErrorKind::PermissionDenied => Reply::new(550, "Permission denied."),
                _ => Reply::new(451, "Requested action aborted. Local error in processing."),
            };
            return send_reply(writer, &reply).await;
        }
    };

    info!("{} storing {}", account.username(), resolved.virtual_path);
    stream_payload(
        writer,
        ctx,
        session,
        conn,
        Payload::Incoming(&mut file),
        TransferKind::Upload,
        what,
    )
    .await
}
