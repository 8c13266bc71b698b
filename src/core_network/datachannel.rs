use crate::core_network::ascii::{AsciiDecoder, AsciiEncoder};
use crate::core_network::{DataChannelError, PassiveListener, PendingConnect, PortLease};
use crate::session::TransferType;
use log::{debug, warn};
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// The data channel a session has prepared for its next transfer.
#[derive(Debug)]
pub enum DataChannel {
    Passive(PassiveListener),
    Active(PendingConnect),
}

/// An established data connection. A passive lease is held until the
/// connection is dropped.
#[derive(Debug)]
pub struct DataConnection {
    stream: TcpStream,
    mode: &'static str,
    _lease: Option<PortLease>,
}

impl DataConnection {
    pub fn mode(&self) -> &'static str {
        self.mode
    }

    pub fn peer_ip(&self) -> Option<IpAddr> {
        self.stream.peer_addr().ok().map(|a| a.ip())
    }
}

/// What a transfer moves, and in which direction.
pub enum Payload<'a> {
    /// Local bytes sent to the client (RETR, LIST).
    Outgoing(&'a mut (dyn AsyncRead + Send + Unpin)),
    /// Client bytes written locally (STOR, APPE).
    Incoming(&'a mut (dyn AsyncWrite + Send + Unpin)),
}

impl DataChannel {
    pub fn mode(&self) -> &'static str {
        match self {
            DataChannel::Passive(_) => "passive",
            DataChannel::Active(_) => "active",
        }
    }

    /// Accepts (passive) or dials (active) the single connection used by the
    /// next transfer, waiting at most `wait`.
    pub async fn open(
        self,
        control_peer: IpAddr,
        permit_foreign: bool,
        wait: Duration,
    ) -> Result<DataConnection, DataChannelError> {
        match self {
            DataChannel::Passive(listener) => {
                let (listener, lease) = listener.into_parts();
                let accept = async {
                    loop {
                        let (stream, addr) = match listener.accept().await {
                            Ok(accepted) => accepted,
                            Err(e) => return Err(DataChannelError::ConnectFailed(e)),
                        };
                        if permit_foreign || same_host(addr.ip(), control_peer) {
                            debug!("Accepted data connection from {}", addr);
                            return Ok(stream);
                        }
                        warn!(
                            "Dropped data connection from foreign address {} (control peer {})",
                            addr, control_peer
                        );
                    }
                };
                let stream = timeout(wait, accept)
                    .await
                    .map_err(|_| DataChannelError::Timeout)??;
                Ok(DataConnection {
                    stream,
                    mode: "passive",
                    _lease: Some(lease),
                })
            }
            DataChannel::Active(pending) => {
                let stream = timeout(wait, TcpStream::connect(pending.target))
                    .await
                    .map_err(|_| DataChannelError::Timeout)?
                    .map_err(DataChannelError::ConnectFailed)?;
                debug!("Connected to active target {}", pending.target);
                Ok(DataConnection {
                    stream,
                    mode: "active",
                    _lease: None,
                })
            }
        }
    }
}

fn same_host(a: IpAddr, b: IpAddr) -> bool {
    let unmap = |ip: IpAddr| match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    };
    unmap(a) == unmap(b)
}

/// Streams `payload` over the connection, then closes the data connection.
/// Returns the number of payload-side bytes moved.
pub async fn transfer(
    conn: DataConnection,
    payload: Payload<'_>,
    transfer_type: TransferType,
    buffer_size: usize,
) -> Result<u64, DataChannelError> {
    let DataConnection { mut stream, _lease, .. } = conn;
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut converted = Vec::new();
    let mut total: u64 = 0;

    match payload {
        Payload::Outgoing(reader) => {
            let mut encoder = AsciiEncoder::default();
            loop {
                let n = reader
                    .read(&mut buffer)
                    .await
                    .map_err(DataChannelError::Storage)?;
                if n == 0 {
                    break;
                }
                total += n as u64;
                let chunk = match transfer_type {
                    TransferType::Binary => &buffer[..n],
                    TransferType::Ascii => {
                        converted.clear();
                        encoder.encode(&buffer[..n], &mut converted);
                        &converted[..]
                    }
                };
                stream
                    .write_all(chunk)
                    .await
                    .map_err(DataChannelError::IoFailure)?;
            }
            stream.flush().await.map_err(DataChannelError::IoFailure)?;
        }
        Payload::Incoming(writer) => {
            let mut decoder = AsciiDecoder::default();
            loop {
                let n = stream
                    .read(&mut buffer)
                    .await
                    .map_err(DataChannelError::IoFailure)?;
                if n == 0 {
                    break;
                }
                let chunk = match transfer_type {
                    TransferType::Binary => &buffer[..n],
                    TransferType::Ascii => {
                        converted.clear();
                        decoder.decode(&buffer[..n], &mut converted);
                        &converted[..]
                    }
                };
                total += chunk.len() as u64;
                writer
                    .write_all(chunk)
                    .await
                    .map_err(DataChannelError::Storage)?;
            }
            if transfer_type == TransferType::Ascii {
                converted.clear();
                decoder.finish(&mut converted);
                total += converted.len() as u64;
                writer
                    .write_all(&converted)
                    .await
                    .map_err(DataChannelError::Storage)?;
            }
            writer.flush().await.map_err(DataChannelError::Storage)?;
        }
    }

    // The peer may already be gone after sending its last byte.
    if let Err(e) = stream.shutdown().await {
        debug!("Data connection shutdown: {}", e);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_network::PassivePortPool;
    use std::io::Cursor;
    use std::net::{Ipv4Addr, SocketAddr};
    use tokio::net::TcpListener;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn passive_download_sends_payload_and_closes() {
        let pool = PassivePortPool::new(41300..41310).unwrap();
        let listener = pool.prepare_passive(LOCALHOST).unwrap();
        let port = listener.port();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(SocketAddr::new(LOCALHOST, port)).await.unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            received
        });

        let conn = DataChannel::Passive(listener)
            .open(LOCALHOST, false, WAIT)
            .await
            .unwrap();
        let mut source = Cursor::new(b"hello\nworld\n".to_vec());
        let sent = transfer(conn, Payload::Outgoing(&mut source), TransferType::Binary, 4)
            .await
            .unwrap();

        assert_eq!(sent, 12);
        assert_eq!(client.await.unwrap(), b"hello\nworld\n");
        assert_eq!(pool.ports_in_use(), 0);
    }

    #[tokio::test]
    async fn ascii_upload_strips_carriage_returns() {
        let pool = PassivePortPool::new(41310..41320).unwrap();
        let listener = pool.prepare_passive(LOCALHOST).unwrap();
        let port = listener.port();

        tokio::spawn(async move {
            let mut stream = TcpStream::connect(SocketAddr::new(LOCALHOST, port)).await.unwrap();
            stream.write_all(b"one\r\ntwo\r\n").await.unwrap();
        });

        let conn = DataChannel::Passive(listener)
            .open(LOCALHOST, false, WAIT)
            .await
            .unwrap();
        let mut sink = Cursor::new(Vec::new());
        let received = transfer(conn, Payload::Incoming(&mut sink), TransferType::Ascii, 3)
            .await
            .unwrap();

        assert_eq!(received, 8);
        assert_eq!(sink.into_inner(), b"one\ntwo\n");
    }

    #[tokio::test]
    async fn active_channel_dials_the_client() {
        let client = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let target = client.local_addr().unwrap();

        let accept = tokio::spawn(async move {
            let (mut stream, _) = client.accept().await.unwrap();
            stream.write_all(b"payload").await.unwrap();
        });

        let conn = DataChannel::Active(PendingConnect { target })
            .open(LOCALHOST, false, WAIT)
            .await
            .unwrap();
        let mut sink = Cursor::new(Vec::new());
        transfer(conn, Payload::Incoming(&mut sink), TransferType::Binary, 1024)
            .await
            .unwrap();
        accept.await.unwrap();
        assert_eq!(sink.into_inner(), b"payload");
    }

    #[tokio::test]
    async fn passive_accept_times_out() {
        let pool = PassivePortPool::new(41320..41330).unwrap();
        let listener = pool.prepare_passive(LOCALHOST).unwrap();
        let result = DataChannel::Passive(listener)
            .open(LOCALHOST, false, Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(DataChannelError::Timeout)));
        assert_eq!(pool.ports_in_use(), 0);
    }
}
