//! TCP (telnet port) connection to the controller

use std::io;
use tokio::net::TcpStream;
use tracing::info;

use super::StreamTransport;
use crate::config::ConnectionConfig;
use crate::error::{DriverError, DriverResult};

/// Open a TCP connection and drain the connect preamble.
///
/// Both the connect and the preamble read are bounded by
/// `config.connect_timeout()`.
pub async fn connect_tcp(config: &ConnectionConfig) -> DriverResult<StreamTransport<TcpStream>> {
    let target = config.target();
    let limit = config.connect_timeout();

    let connect = async {
        let stream = TcpStream::connect((config.host.as_str(), config.port))
            .await
            .map_err(|source| DriverError::Connection {
                target: target.clone(),
                source,
            })?;
        // Commands are tiny and latency-bound.
        stream.set_nodelay(true)?;

        let mut transport = StreamTransport::new(stream, target.clone());
        transport.handshake(config.handshake_bytes).await?;
        Ok::<_, DriverError>(transport)
    };

    let transport = tokio::time::timeout(limit, connect)
        .await
        .map_err(|_| DriverError::Connection {
            target: target.clone(),
            source: io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect and handshake did not finish within {:?}", limit),
            ),
        })??;

    info!(endpoint = %target, "Connected to controller");
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Transport;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_drains_preamble() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"\xff\xfd\x03\xff\xfb\x01").await.unwrap();
            socket.write_all(b"0\r\n").await.unwrap();
            socket
        });

        let mut config = ConnectionConfig::for_host("127.0.0.1");
        config.port = port;
        let mut transport = connect_tcp(&config).await.unwrap();

        assert_eq!(transport.describe(), format!("127.0.0.1:{}", port));
        assert_eq!(transport.read_line().await.unwrap(), "0");
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut config = ConnectionConfig::for_host("127.0.0.1");
        config.port = port;
        let err = connect_tcp(&config).await.err().unwrap();
        assert!(matches!(err, DriverError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_missing_preamble_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            drop(socket);
        });

        let mut config = ConnectionConfig::for_host("127.0.0.1");
        config.port = port;
        config.connect_timeout_ms = 100;
        let err = connect_tcp(&config).await.err().unwrap();
        assert!(matches!(err, DriverError::Connection { .. }));
        server.abort();
    }
}
