use crate::constants::MIN_ACTIVE_PORT;
use crate::core_ftpcommand::error::ProtocolError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};
use crate::core_network::{DataChannel, DataChannelError};
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Address the server dials once the transfer command arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConnect {
    pub target: SocketAddr,
}

/// Parses the `h1,h2,h3,h4,p1,p2` argument of PORT.
pub fn parse_port_arg(arg: &str) -> Result<SocketAddr, ProtocolError> {
    let parts: Vec<u8> = arg
        .trim()
        .split(',')
        .map(|x| x.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|_| ProtocolError::Syntax("Invalid PORT argument."))?;
    if parts.len() != 6 {
        return Err(ProtocolError::Syntax("Invalid PORT argument."));
    }
    let ip = Ipv4Addr::new(parts[0], parts[1], parts[2], parts[3]);
    let port = (parts[4] as u16) << 8 | parts[5] as u16;
    Ok(SocketAddr::new(IpAddr::V4(ip), port))
}

/// Parses the `<d>proto<d>address<d>port<d>` argument of EPRT (RFC 2428).
pub fn parse_eprt_arg(arg: &str) -> Result<SocketAddr, ProtocolError> {
    let arg = arg.trim();
    let delim = arg
        .chars()
        .next()
        .ok_or(ProtocolError::Syntax("Invalid EPRT argument."))?;
    let fields: Vec<&str> = arg.split(delim).collect();
    // Leading and trailing delimiters leave empty fields at both ends.
    if fields.len() != 5 || !fields[0].is_empty() || !fields[4].is_empty() {
        return Err(ProtocolError::Syntax("Invalid EPRT argument."));
    }
    let ip: IpAddr = match fields[1] {
        "1" => fields[2]
            .parse::<Ipv4Addr>()
            .map(IpAddr::V4)
            .map_err(|_| ProtocolError::Syntax("Invalid EPRT address."))?,
        "2" => fields[2]
            .parse::<Ipv6Addr>()
            .map(IpAddr::V6)
            .map_err(|_| ProtocolError::Syntax("Invalid EPRT address."))?,
        _ => return Err(ProtocolError::UnsupportedProtocol),
    };
    let port = fields[3]
        .parse::<u16>()
        .map_err(|_| ProtocolError::Syntax("Invalid EPRT port."))?;
    Ok(SocketAddr::new(ip, port))
}

fn normalize(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

/// Validates an active-mode target against the control connection's peer.
pub fn prepare_active(
    target: SocketAddr,
    control_peer: IpAddr,
    permit_foreign: bool,
) -> Result<PendingConnect, DataChannelError> {
    if target.port() < MIN_ACTIVE_PORT {
        return Err(DataChannelError::PrivilegedPort(target.port()));
    }
    if !permit_foreign && normalize(target.ip()) != normalize(control_peer) {
        return Err(DataChannelError::ForeignAddress(target.ip()));
    }
    Ok(PendingConnect { target })
}

async fn activate(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    target: SocketAddr,
) -> std::io::Result<()> {
    session.discard_data_channel();
    match prepare_active(
        target,
        session.peer_addr.ip(),
        ctx.config.server.permit_foreign_addresses,
    ) {
        Ok(pending) => {
            info!("Active mode target {} recorded for {}", target, session.peer_addr);
            session.set_data_channel(DataChannel::Active(pending));
            send_reply(writer, &Reply::new(200, "Active data connection target accepted.")).await
        }
        Err(e) => {
            warn!("Refused active target {} from {}: {}", target, session.peer_addr, e);
            send_reply(writer, &e.to_ftp_response()).await
        }
    }
}

/// Handles the PORT (Active Mode) FTP command.
pub async fn handle_port_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    if session.epsv_all {
        return send_reply(writer, &Reply::new(501, "PORT not allowed after EPSV ALL.")).await;
    }
    match parse_port_arg(arg) {
        Ok(target) => activate(writer, ctx, session, target).await,
        Err(e) => send_reply(writer, &e.to_ftp_response()).await,
    }
}

/// Handles EPRT, the address-family-neutral PORT.
pub async fn handle_eprt_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    if session.epsv_all {
        return send_reply(writer, &Reply::new(501, "EPRT not allowed after EPSV ALL.")).await;
    }
    match parse_eprt_arg(arg) {
        Ok(target) => activate(writer, ctx, session, target).await,
        Err(e) => send_reply(writer, &e.to_ftp_response()).await,
    }
}
