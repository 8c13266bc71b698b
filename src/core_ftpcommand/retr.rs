use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{
    or_reply, required_arg, resolve_path, run_transfer, send_reply, ControlWriter, TransferKind,
};
use crate::core_network::Payload;
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};
use tokio::fs::File;

/// Handles the RETR FTP command.
pub async fn handle_retr_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let account = or_reply!(writer, session.require(Permission::Read));
    let arg = or_reply!(writer, required_arg(arg));
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, arg));

    let is_file = tokio::fs::metadata(&resolved.real)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        warn!("RETR: not a regular file: {}", resolved.virtual_path);
        return send_reply(writer, &Reply::new(550, "No such file.")).await;
    }

    let mut file = match File::open(&resolved.real).await {
        Ok(file) => file,
        Err(e) => {
            warn!("RETR: failed to open {}: {}", resolved.virtual_path, e);
            return send_reply(writer, &Reply::new(550, "Failed to open file.")).await;
        }
    };

    info!("{} retrieving {}", account.username(), resolved.virtual_path);
    run_transfer(
        writer,
        ctx,
        session,
        Payload::Outgoing(&mut file),
        TransferKind::Download,
        "RETR",
    )
    .await
}
