use crate::config::ConfigError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};
use crate::core_network::{DataChannel, DataChannelError};
use crate::server::ServerContext;
use crate::session::Session;
use log::{debug, info, warn};
use rand::Rng;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;

/// Hands out passive ports from `[start, end)`, never the same port to two
/// live listeners. Cloning shares the same pool.
#[derive(Debug, Clone)]
pub struct PassivePortPool {
    range: Range<u16>,
    in_use: Arc<Mutex<HashSet<u16>>>,
}

/// Reservation of one pool port, returned to the pool on drop.
#[derive(Debug)]
pub struct PortLease {
    port: u16,
    in_use: Arc<Mutex<HashSet<u16>>>,
}

impl PortLease {
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        let mut in_use = self.in_use.lock().unwrap_or_else(PoisonError::into_inner);
        in_use.remove(&self.port);
        debug!("Released passive port {}", self.port);
    }
}

/// A bound passive listener waiting for exactly one data connection.
#[derive(Debug)]
pub struct PassiveListener {
    listener: TcpListener,
    lease: PortLease,
}

impl PassiveListener {
    pub fn port(&self) -> u16 {
        self.lease.port()
    }

    pub(crate) fn into_parts(self) -> (TcpListener, PortLease) {
        (self.listener, self.lease)
    }
}

impl PassivePortPool {
    pub fn new(range: Range<u16>) -> Result<Self, ConfigError> {
        if range.start >= range.end {
            return Err(ConfigError::InvalidPassiveRange(range.start, range.end));
        }
        Ok(Self {
            range,
            in_use: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub fn range(&self) -> Range<u16> {
        self.range.clone()
    }

    pub fn ports_in_use(&self) -> usize {
        self.in_use
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Binds a listener on `ip` at the first free port of the range, starting
    /// from a random offset. Ports held by other sessions are skipped, as are
    /// ports another process already occupies.
    pub fn prepare_passive(&self, ip: IpAddr) -> Result<PassiveListener, DataChannelError> {
        let len = (self.range.end - self.range.start) as usize;
        let offset = rand::thread_rng().gen_range(0..len);

        let mut in_use = self.in_use.lock().unwrap_or_else(PoisonError::into_inner);
        for i in 0..len {
            let port = self.range.start + ((offset + i) % len) as u16;
            if in_use.contains(&port) {
                continue;
            }
            let listener = match bind_listener(SocketAddr::new(ip, port)) {
                Ok(listener) => listener,
                Err(e) => {
                    debug!("Passive port {} unavailable: {}", port, e);
                    continue;
                }
            };
            in_use.insert(port);
            debug!("Passive listener bound on {}:{}", ip, port);
            return Ok(PassiveListener {
                listener,
                lease: PortLease {
                    port,
                    in_use: Arc::clone(&self.in_use),
                },
            });
        }

        warn!("Passive port range {:?} exhausted", self.range);
        Err(DataChannelError::RangeExhausted)
    }
}

fn bind_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = std::net::TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    TcpListener::from_std(listener)
}

pub fn pasv_reply(ip: Ipv4Addr, port: u16) -> Reply {
    let [a, b, c, d] = ip.octets();
    Reply::new(
        227,
        format!(
            "Entering Passive Mode ({},{},{},{},{},{}).",
            a,
            b,
            c,
            d,
            port >> 8,
            port & 0xff
        ),
    )
}

pub fn epsv_reply(port: u16) -> Reply {
    Reply::new(229, format!("Entering Extended Passive Mode (|||{}|).", port))
}

/// The IPv4 address the client should dial for PASV, if any.
fn advertised_ipv4(ctx: &ServerContext, local: IpAddr) -> Option<Ipv4Addr> {
    if let Some(ip) = ctx.masquerade_address {
        return Some(ip);
    }
    match local {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(ip) => ip.to_ipv4_mapped(),
    }
}

/// Handles PASV: reserves a port, starts listening and advertises it.
pub async fn handle_pasv_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    _arg: &str,
) -> std::io::Result<()> {
    if session.epsv_all {
        return send_reply(writer, &Reply::new(501, "PASV not allowed after EPSV ALL.")).await;
    }

    let local_ip = session.local_addr.ip();
    let Some(advertised) = advertised_ipv4(ctx, local_ip) else {
        return send_reply(writer, &DataChannelError::PassiveNeedsIpv4.to_ftp_response()).await;
    };

    // The previous unused channel gives its port back before we allocate.
    session.discard_data_channel();
    match ctx.passive_ports.prepare_passive(local_ip) {
        Ok(listener) => {
            let port = listener.port();
            session.set_data_channel(DataChannel::Passive(listener));
            info!("PASV ready on port {} for {}", port, session.peer_addr);
            send_reply(writer, &pasv_reply(advertised, port)).await
        }
        Err(e) => send_reply(writer, &e.to_ftp_response()).await,
    }
}

/// Handles EPSV, including `EPSV ALL`.
pub async fn handle_epsv_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let local_ip = session.local_addr.ip();
    match arg.trim() {
        "" => {}
        a if a.eq_ignore_ascii_case("ALL") => {
            session.epsv_all = true;
            return send_reply(writer, &Reply::new(200, "EPSV ALL ok.")).await;
        }
        "1" if local_ip.is_ipv4() => {}
        "2" if local_ip.is_ipv6() => {}
        "1" | "2" => {
            return send_reply(writer, &Reply::new(522, "Network protocol not supported, use (1,2).")).await;
        }
        _ => {
            return send_reply(writer, &Reply::new(501, "Unknown network protocol.")).await;
        }
    }

    session.discard_data_channel();
    match ctx.passive_ports.prepare_passive(local_ip) {
        Ok(listener) => {
            let port = listener.port();
            session.set_data_channel(DataChannel::Passive(listener));
            info!("EPSV ready on port {} for {}", port, session.peer_addr);
            send_reply(writer, &epsv_reply(port)).await
        }
        Err(e) => send_reply(writer, &e.to_ftp_response()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn empty_range_is_refused() {
        assert!(PassivePortPool::new(3010..3010).is_err());
        assert!(PassivePortPool::new(Range { start: 3010, end: 3000 }).is_err());
    }

    #[tokio::test]
    async fn concurrent_leases_get_distinct_ports_in_range() {
        let pool = PassivePortPool::new(41200..41210).unwrap();
        let mut held = Vec::new();
        for _ in 0..5 {
            held.push(pool.prepare_passive(LOCALHOST).unwrap());
        }
        let mut ports: Vec<u16> = held.iter().map(|l| l.port()).collect();
        assert!(ports.iter().all(|p| (41200..41210).contains(p)));
        ports.sort_unstable();
        ports.dedup();
        assert_eq!(ports.len(), 5);
        assert_eq!(pool.ports_in_use(), 5);
    }

    #[tokio::test]
    async fn exhausted_range_reports_an_error() {
        let pool = PassivePortPool::new(41220..41222).unwrap();
        let _first = pool.prepare_passive(LOCALHOST).unwrap();
        let _second = pool.prepare_passive(LOCALHOST).unwrap();
        assert!(matches!(
            pool.prepare_passive(LOCALHOST),
            Err(DataChannelError::RangeExhausted)
        ));
    }

    #[tokio::test]
    async fn dropping_a_listener_releases_its_port() {
        let pool = PassivePortPool::new(41230..41231).unwrap();
        let listener = pool.prepare_passive(LOCALHOST).unwrap();
        assert_eq!(listener.port(), 41230);
        assert!(pool.prepare_passive(LOCALHOST).is_err());

        drop(listener);
        assert_eq!(pool.ports_in_use(), 0);
        let again = pool.prepare_passive(LOCALHOST).unwrap();
        assert_eq!(again.port(), 41230);
    }

    #[tokio::test]
    async fn clones_share_the_reservations() {
        let pool = PassivePortPool::new(41240..41241).unwrap();
        let other_session = pool.clone();
        let _held = pool.prepare_passive(LOCALHOST).unwrap();
        assert!(other_session.prepare_passive(LOCALHOST).is_err());
    }

    #[test]
    fn pasv_reply_encodes_port_bytes() {
        let reply = pasv_reply(Ipv4Addr::new(192, 168, 1, 2), 3005);
        assert_eq!(
            reply.to_wire(),
            "227 Entering Passive Mode (192,168,1,2,11,189).\r\n"
        );
        assert_eq!(epsv_reply(3005).to_wire(), "229 Entering Extended Passive Mode (|||3005|).\r\n");
    }
}
