use crate::constants::MAX_COMMAND_LINE;
use crate::core_ftpcommand::error::ProtocolError;
use crate::core_ftpcommand::ftpcommand::Command;
use crate::core_ftpcommand::handlers::dispatch;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::send_reply;
use crate::server::ServerContext;
use crate::session::Session;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

/// Accepts control connections and runs one task per client.
pub struct FtpListener {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
}

impl FtpListener {
    pub async fn bind(ctx: Arc<ServerContext>) -> Result<Self> {
        let addr = ctx.bind_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind control listener on {}", addr))?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self { listener, ctx })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop. A misbehaving client only ends its own task.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (socket, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };
            info!("New connection from {}", addr);

            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(socket, ctx).await {
                    warn!("Connection error for {}: {:#}", addr, e);
                }
                info!("Connection closed for {}", addr);
            });
        }
    }
}

pub async fn start_server(ctx: Arc<ServerContext>) -> Result<()> {
    FtpListener::bind(ctx).await?.serve().await
}

/// Drives one control connection from greeting to close.
pub async fn handle_connection(socket: TcpStream, ctx: Arc<ServerContext>) -> Result<()> {
    let peer_addr = socket.peer_addr()?;
    let local_addr = socket.local_addr()?;
    let (read_half, mut writer) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new(peer_addr, local_addr);

    send_reply(&mut writer, &ctx.greeting()).await?;

    let mut buf = Vec::new();
    while !session.is_closed() {
        let line = match timeout(ctx.idle_timeout(), read_command_line(&mut reader, &mut buf)).await {
            Ok(line) => line?,
            Err(_) => {
                info!("Idle timeout for {}", peer_addr);
                let reply = Reply::new(421, "Idle timeout, closing control connection.");
                send_reply(&mut writer, &reply).await?;
                break;
            }
        };

        let text = match line {
            Line::Complete(text) => text,
            Line::TooLong => {
                warn!("Oversized command line from {}", peer_addr);
                session.rename_from = None;
                send_reply(&mut writer, &ProtocolError::LineTooLong.to_ftp_response()).await?;
                continue;
            }
            Line::Eof => {
                debug!("{} closed the control connection", peer_addr);
                break;
            }
        };

        match text.parse::<Command>() {
            Ok(command) => {
                info!("{} > {}", peer_addr, command.loggable());
                dispatch(&mut writer, &ctx, &mut session, command).await?;
            }
            Err(e) => {
                warn!("{} sent a bad command: {}", peer_addr, e);
                session.rename_from = None;
                send_reply(&mut writer, &e.to_ftp_response()).await?;
            }
        }
    }

    session.close();
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Complete(String),
    TooLong,
    Eof,
}

/// Reads one control line of at most `MAX_COMMAND_LINE` bytes. The rest of
/// an oversized line is discarded so the next read starts on a fresh command.
async fn read_command_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_COMMAND_LINE as u64;
    buf.clear();
    let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(Line::Eof);
    }

    if !buf.ends_with(b"\n") && n as u64 == limit {
        let mut rest = Vec::new();
        loop {
            rest.clear();
            let n = (&mut *reader).take(limit).read_until(b'\n', &mut rest).await?;
            if n == 0 || rest.ends_with(b"\n") {
                break;
            }
        }
        return Ok(Line::TooLong);
    }

    Ok(Line::Complete(String::from_utf8_lossy(buf).into_owned()))
}
