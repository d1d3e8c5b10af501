//! Scripted SW16 device for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;
use sw16_setup::core::protocol::checksum::sum8_checksum;
use sw16_setup::ConnectionTarget;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Delimiter byte terminating every frame
pub const DELIMITER: u8 = 0xDD;

/// Status query the prober is expected to send
pub const STATUS_QUERY: [u8; 20] = [
    0xAA, 0x1E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x0B, 0xDD,
];

/// What the device does once it has read a request
#[derive(Debug, Clone)]
pub enum Reply {
    /// Send `body` followed by the delimiter, then wait for the client to hang up
    Frame(Vec<u8>),
    /// Send raw bytes, then keep the connection open
    Raw(Vec<u8>),
    /// Send raw bytes, then close the connection
    Truncated(Vec<u8>),
    /// Never answer
    Silent,
    /// Close without answering
    Close,
}

/// What the device observed
#[derive(Debug, Default)]
pub struct DeviceLog {
    /// Bytes received up to and including the first delimiter
    pub request: Vec<u8>,
    /// Whether the client closed its end after the exchange
    pub client_closed: bool,
}

/// A one-shot device listening on loopback
pub struct FakeDevice {
    addr: SocketAddr,
    handle: JoinHandle<DeviceLog>,
}

impl FakeDevice {
    /// Bind to an ephemeral port and serve a single connection
    pub async fn spawn(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut log = DeviceLog::default();
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut byte = [0u8; 1];
            while stream.read(&mut byte).await.unwrap_or(0) == 1 {
                log.request.push(byte[0]);
                if byte[0] == DELIMITER {
                    break;
                }
            }

            match reply {
                Reply::Frame(mut body) => {
                    body.push(DELIMITER);
                    stream.write_all(&body).await.unwrap();
                }
                Reply::Raw(bytes) => stream.write_all(&bytes).await.unwrap(),
                Reply::Truncated(bytes) => {
                    stream.write_all(&bytes).await.unwrap();
                    return log;
                }
                Reply::Silent => {}
                Reply::Close => return log,
            }

            let mut sink = [0u8; 64];
            let closed = tokio::time::timeout(Duration::from_secs(5), async {
                loop {
                    match stream.read(&mut sink).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => continue,
                    }
                }
            })
            .await;
            log.client_closed = closed.is_ok();
            log
        });

        Self { addr, handle }
    }

    /// Target pointing at this device
    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget::new(self.addr.ip().to_string(), self.addr.port())
    }

    /// Wait for the device task and return what it saw
    pub async fn finish(self) -> DeviceLog {
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("device task hung")
            .expect("device task panicked")
    }
}

/// A loopback port with nothing listening on it
pub async fn refused_target() -> ConnectionTarget {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    ConnectionTarget::new("127.0.0.1", port)
}

/// Well-formed 19-byte status body
pub fn status_body() -> Vec<u8> {
    let mut body = vec![0xCC];
    body.extend_from_slice(&[0x0C, 0x01, 0x02, 0x02, 0x01, 0x02, 0x02, 0x02, 0x02]);
    body.extend_from_slice(&[0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02]);
    let checksum = sum8_checksum(&body[1..]);
    body.push(checksum);
    body
}
