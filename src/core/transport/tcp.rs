//! TCP open/close

use super::ConnectionTarget;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

/// Connection open errors
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Deadline elapsed before the connection was established
    #[error("connection to {0} timed out")]
    Timeout(String),

    /// Transport rejected the connection (refused, unreachable, resolution)
    #[error("connection to {target} failed: {source}")]
    Io {
        /// Target that was dialled
        target: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Open a TCP connection to `target`, giving up at `deadline`
pub async fn connect(
    target: &ConnectionTarget,
    deadline: Instant,
) -> Result<TcpStream, ConnectError> {
    if Instant::now() >= deadline {
        return Err(ConnectError::Timeout(target.key()));
    }

    let stream = tokio::time::timeout_at(
        deadline,
        TcpStream::connect((target.host(), target.port())),
    )
    .await
    .map_err(|_| ConnectError::Timeout(target.key()))?
    .map_err(|source| ConnectError::Io {
        target: target.key(),
        source,
    })?;

    // Status frames are tiny; don't let Nagle hold them back
    if let Err(e) = stream.set_nodelay(true) {
        debug!(target = %target, error = %e, "failed to set TCP_NODELAY");
    }

    debug!(target = %target, "connection opened");
    Ok(stream)
}

/// Shut down and release a connection
///
/// Errors are logged and swallowed: the peer may already be gone.
pub async fn close(mut stream: TcpStream) {
    if let Err(e) = stream.shutdown().await {
        debug!(error = %e, "connection shutdown failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let target = ConnectionTarget::new("127.0.0.1", port);

        let stream = connect(&target, Instant::now() + Duration::from_secs(2))
            .await
            .unwrap();
        close(stream).await;
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = ConnectionTarget::new("127.0.0.1", port);
        let result = connect(&target, Instant::now() + Duration::from_secs(2)).await;
        assert!(matches!(result, Err(ConnectError::Io { .. })));
    }

    #[tokio::test]
    async fn test_connect_past_deadline() {
        let target = ConnectionTarget::new("127.0.0.1", 9);
        let result = connect(&target, Instant::now()).await;
        assert!(matches!(result, Err(ConnectError::Timeout(key)) if key == "127.0.0.1:9"));
    }

    #[tokio::test]
    async fn test_connect_past_deadline_skips_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let target = ConnectionTarget::new("127.0.0.1", port);

        let deadline = Instant::now() - Duration::from_millis(10);
        let result = connect(&target, deadline).await;
        assert!(matches!(result, Err(ConnectError::Timeout(_))));
    }
}
