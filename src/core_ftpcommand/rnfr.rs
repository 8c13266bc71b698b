use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{or_reply, required_arg, resolve_path, send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::Session;
use log::info;

/// Handles RNFR: remembers an existing source for the following RNTO.
pub async fn handle_rnfr_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let account = or_reply!(writer, session.require(Permission::Rename));
    let arg = or_reply!(writer, required_arg(arg));
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, arg));

    if resolved.is_home() {
        return send_reply(writer, &Reply::new(550, "Can't rename home directory.")).await;
    }
    if tokio::fs::symlink_metadata(&resolved.real).await.is_err() {
        return send_reply(writer, &Reply::new(550, "No such file or directory.")).await;
    }

    info!("Rename source set to {}", resolved.virtual_path);
    session.rename_from = Some(resolved);
    send_reply(writer, &Reply::new(350, "Ready for destination name.")).await
}
