use crate::core_ftpcommand::error::ProtocolError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::{Session, SessionState};
use log::{error, info, warn};
use std::sync::Arc;

/// Handles the PASS FTP command.
///
/// Password hashing is CPU-bound, so the check runs on the blocking pool.
/// A failed login returns the session to the unauthenticated state but keeps
/// the connection open.
pub async fn handle_pass_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let username = match &session.state {
        SessionState::AwaitingPassword { username } => username.clone(),
        SessionState::Authenticated(_) => {
            let e = ProtocolError::BadSequence("User already logged in.");
            return send_reply(writer, &e.to_ftp_response()).await;
        }
        _ => {
            let e = ProtocolError::BadSequence("Login with USER first.");
            return send_reply(writer, &e.to_ftp_response()).await;
        }
    };

    let authorizer = Arc::clone(&ctx.authorizer);
    let password = arg.to_string();
    let user = username.clone();
    let outcome = tokio::task::spawn_blocking(move || authorizer.authenticate(&user, &password)).await;

    match outcome {
        Ok(Ok(account)) => {
            info!("User {} logged in from {}", account.username(), session.peer_addr);
            let reply = if account.is_anonymous() {
                Reply::new(230, "Anonymous access granted, restrictions apply.")
            } else {
                Reply::new(230, "Login successful.")
            };
            session.login(account);
            send_reply(writer, &reply).await
        }
        Ok(Err(e)) => {
            warn!("Login failed from {}: {}", session.peer_addr, e);
            session.logout();
            send_reply(writer, &e.to_ftp_response()).await
        }
        Err(e) => {
            error!("Authentication task failed: {}", e);
            session.logout();
            send_reply(
                writer,
                &Reply::new(451, "Requested action aborted. Local error in processing."),
            )
            .await
        }
    }
}
