#![allow(dead_code)]

use minftpd::config::Config;
use minftpd::core_network::network::FtpListener;
use minftpd::server::ServerContext;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

pub const USER: &str = "alice";
pub const PASSWORD: &str = "secret";

/// A server on 127.0.0.1 with a throwaway root directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
}

impl TestServer {
    /// `passive_start` must be unique per test; each server gets ten ports.
    pub async fn start(passive_start: u16) -> Self {
        Self::start_with(passive_start, |_| {}).await
    }

    pub async fn start_with(passive_start: u16, tweak: impl FnOnce(&mut Config)) -> Self {
        let root = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.bind_host = "127.0.0.1".to_string();
        config.server.bind_port = 0;
        config.server.root_dir = root.path().to_path_buf();
        config.server.passive_port_start = passive_start;
        config.server.passive_port_end = passive_start + 10;
        config.server.data_timeout_secs = 5;
        config.account.username = USER.to_string();
        config.account.password = PASSWORD.to_string();
        config.account.hash_cost = 4;
        tweak(&mut config);

        let ctx = Arc::new(ServerContext::from_config(config).unwrap());
        let listener = FtpListener::bind(ctx).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(listener.serve());
        Self { addr, root }
    }

    pub fn home(&self) -> PathBuf {
        self.root.path().join(USER)
    }

    pub async fn connect(&self) -> Client {
        Client::connect(self.addr).await
    }

    /// A client that already went through USER/PASS.
    pub async fn login(&self) -> Client {
        let mut client = self.connect().await;
        assert_eq!(client.cmd(&format!("USER {}", USER)).await.0, 331);
        assert_eq!(client.cmd(&format!("PASS {}", PASSWORD)).await.0, 230);
        client
    }
}

pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    pub greeting: (u16, String),
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer,
            greeting: (0, String::new()),
        };
        client.greeting = client.reply().await;
        client
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    /// Reads one full reply; the text keeps every line, CRLF separated.
    pub async fn reply(&mut self) -> (u16, String) {
        let mut text = String::new();
        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await.unwrap();
            assert!(n > 0, "control connection closed, got so far: {:?}", text);
            text.push_str(&line);
            let bytes = line.as_bytes();
            if bytes.len() >= 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b' ' {
                let code = line[..3].parse().unwrap();
                return (code, text);
            }
        }
    }

    pub async fn cmd(&mut self, line: &str) -> (u16, String) {
        self.send(line).await;
        self.reply().await
    }

    /// True once the server has closed the control connection.
    pub async fn is_closed(&mut self) -> bool {
        let mut buf = [0u8; 1];
        matches!(self.reader.read(&mut buf).await, Ok(0) | Err(_))
    }

    /// Sends PASV and connects to the advertised port.
    pub async fn pasv(&mut self) -> (u16, TcpStream) {
        let (code, text) = self.cmd("PASV").await;
        assert_eq!(code, 227, "{}", text);
        let port = parse_pasv_port(&text);
        (port, TcpStream::connect(("127.0.0.1", port)).await.unwrap())
    }

    /// PASV, then `command`, returning everything sent on the data channel.
    pub async fn download(&mut self, command: &str) -> (u16, Vec<u8>) {
        let (_, mut data) = self.pasv().await;
        let (code, text) = self.cmd(command).await;
        if code != 150 {
            return (code, text.into_bytes());
        }
        let mut body = Vec::new();
        data.read_to_end(&mut body).await.unwrap();
        (self.reply().await.0, body)
    }

    /// PASV, then `command`, sending `body` on the data channel.
    pub async fn upload(&mut self, command: &str, body: &[u8]) -> u16 {
        let (_, mut data) = self.pasv().await;
        let (code, _) = self.cmd(command).await;
        if code != 150 {
            return code;
        }
        data.write_all(body).await.unwrap();
        data.shutdown().await.unwrap();
        drop(data);
        self.reply().await.0
    }
}

pub fn parse_pasv_port(text: &str) -> u16 {
    let start = text.find('(').unwrap() + 1;
    let end = text.find(')').unwrap();
    let fields: Vec<u16> = text[start..end]
        .split(',')
        .map(|f| f.trim().parse().unwrap())
        .collect();
    assert_eq!(fields.len(), 6);
    fields[4] * 256 + fields[5]
}
