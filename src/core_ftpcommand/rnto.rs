use crate::core_auth::Permission;
use crate::core_ftpcommand::error::ProtocolError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{or_reply, required_arg, resolve_path, send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};

/// Handles RNTO. The pending source is consumed whatever the outcome.
pub async fn handle_rnto_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let Some(source) = session.rename_from.take() else {
        let e = ProtocolError::BadSequence("RNFR required first.");
        return send_reply(writer, &e.to_ftp_response()).await;
    };
    let account = or_reply!(writer, session.require(Permission::Rename));
    let arg = or_reply!(writer, required_arg(arg));
    let target = or_reply!(writer, resolve_path(ctx, session, &account, arg));

    if target.is_home() {
        return send_reply(writer, &Reply::new(550, "Can't overwrite home directory.")).await;
    }

    let reply = match tokio::fs::rename(&source.real, &target.real).await {
        Ok(()) => {
            info!("Renamed {} to {}", source.virtual_path, target.virtual_path);
            Reply::new(250, "Renaming ok.")
        }
        Err(e) => {
            warn!(
                "Failed to rename {} to {}: {}",
                source.virtual_path, target.virtual_path, e
            );
            Reply::new(550, "Rename failed.")
        }
    };
    send_reply(writer, &reply).await
}
