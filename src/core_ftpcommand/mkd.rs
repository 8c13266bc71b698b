use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::{quote_path, Reply};
use crate::core_ftpcommand::utils::{or_reply, required_arg, resolve_path, send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};

/// Handles the MKD FTP command.
pub async fn handle_mkd_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let account = or_reply!(writer, session.require(Permission::MakeDir));
    let arg = or_reply!(writer, required_arg(arg));
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, arg));

    if tokio::fs::symlink_metadata(&resolved.real).await.is_ok() {
        return send_reply(writer, &Reply::new(550, "Directory already exists.")).await;
    }

    let reply = match tokio::fs::create_dir(&resolved.real).await {
        Ok(()) => {
            info!("Created directory {}", resolved.virtual_path);
            Reply::new(
                257,
                format!("{} directory created.", quote_path(&resolved.virtual_path)),
            )
        }
        Err(e) => {
            warn!("Failed to create directory {}: {}", resolved.virtual_path, e);
            Reply::new(550, "Create directory operation failed.")
        }
    };
    send_reply(writer, &reply).await
}
