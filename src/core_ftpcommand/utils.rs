use crate::core_auth::Account;
use crate::core_fs::{PathError, ResolvedPath};
use crate::core_ftpcommand::error::ProtocolError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_network::{transfer, DataChannelError, DataConnection, Payload};
use crate::server::ServerContext;
use crate::session::Session;
use log::{debug, error, info};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Write side of the control connection.
pub type ControlWriter = dyn AsyncWrite + Send + Unpin;

/// Sends a reply to the client.
pub async fn send_reply(writer: &mut ControlWriter, reply: &Reply) -> std::io::Result<()> {
    debug!("-> {}", reply);
    writer.write_all(reply.to_wire().as_bytes()).await?;
    writer.flush().await
}

/// Rejects an empty argument with 501.
pub fn required_arg(arg: &str) -> Result<&str, ProtocolError> {
    if arg.trim().is_empty() {
        Err(ProtocolError::Syntax("Syntax error in parameters or arguments."))
    } else {
        Ok(arg)
    }
}

/// Resolves a client path against the session's working directory inside
/// the account's home.
pub fn resolve_path(
    ctx: &ServerContext,
    session: &Session,
    account: &Account,
    arg: &str,
) -> Result<ResolvedPath, PathError> {
    ctx.scoper.resolve(&session.current_dir, arg, account.home())
}

/// Which buffer size a transfer uses.
#[derive(Debug, Clone, Copy)]
pub enum TransferKind {
    Download,
    Upload,
}

/// Takes the prepared data channel and connects it. On failure the error
/// reply is already sent and `None` comes back.
pub async fn open_data_connection(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    what: &str,
) -> std::io::Result<Option<DataConnection>> {
    let Some(channel) = session.take_data_channel() else {
        send_reply(writer, &DataChannelError::NotPrepared.to_ftp_response()).await?;
        return Ok(None);
    };

    match channel
        .open(
            session.peer_addr.ip(),
            ctx.config.server.permit_foreign_addresses,
            ctx.data_timeout(),
        )
        .await
    {
        Ok(conn) => Ok(Some(conn)),
        Err(e) => {
            error!("Data connection for {} failed: {}", what, e);
            send_reply(writer, &e.to_ftp_response()).await?;
            Ok(None)
        }
    }
}

/// Announces the open connection with 150, streams the payload and answers
/// 226, or the failure reply.
pub async fn stream_payload(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &Session,
    conn: DataConnection,
    payload: Payload<'_>,
    kind: TransferKind,
    what: &str,
) -> std::io::Result<()> {
    send_reply(
        writer,
        &Reply::new(150, format!("Data connection open ({}); transfer starting.", conn.mode())),
    )
    .await?;

    let buffer_size = match kind {
        TransferKind::Download => ctx.config.server.download_buffer_size,
        TransferKind::Upload => ctx.config.server.upload_buffer_size,
    };

    match transfer(conn, payload, session.transfer_type, buffer_size).await {
        Ok(bytes) => {
            info!("{} complete: {} bytes for {}", what, bytes, session.peer_addr);
            send_reply(writer, &Reply::new(226, "Transfer complete.")).await
        }
        Err(e) => {
            error!("{} failed for {}: {}", what, session.peer_addr, e);
            send_reply(writer, &e.to_ftp_response()).await
        }
    }
}

/// Connects the data channel and streams a payload that is already open.
pub async fn run_transfer(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    payload: Payload<'_>,
    kind: TransferKind,
    what: &str,
) -> std::io::Result<()> {
    match open_data_connection(writer, ctx, session, what).await? {
        Some(conn) => stream_payload(writer, ctx, session, conn, payload, kind, what).await,
        None => Ok(()),
    }
}

/// Unwraps a result or answers the client with the error's reply.
macro_rules! or_reply {
    ($writer:expr, $result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => {
                return $crate::core_ftpcommand::utils::send_reply($writer, &e.to_ftp_response())
                    .await
            }
        }
    };
}
pub(crate) use or_reply;
