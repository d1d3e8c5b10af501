//! Connection prober
//!
//! Runs the validation handshake against a device: open a TCP connection,
//! send a status query, read one delimiter-terminated frame, ask the frame
//! codec whether it is valid, close the connection. Every way this can end
//! is folded into a [`ProbeOutcome`]; nothing is returned as an error and
//! nothing is retried.

use crate::core::protocol::{
    DelimiterFramer, FrameCodec, FrameError, MAX_FRAME_LEN, STATUS_QUERY_OPCODE,
};
use crate::core::transport::{self, ConnectError, ConnectionTarget};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::any::Any;
use std::fmt;
use std::io::ErrorKind;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{timeout_at, Instant};
use tokio_util::codec::Framed;
use tracing::debug;

// Roughly 30 years.
const FAR_FUTURE_SECS: u64 = 86_400 * 365 * 30;

/// Result of a single probe attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Device answered with a valid frame
    Success,
    /// A frame arrived but failed the integrity check
    ProtocolMismatch,
    /// Deadline elapsed before the handshake completed
    Timeout,
    /// Connection refused, unreachable, reset or closed early
    TransportError(String),
    /// Anything the handshake does not anticipate
    UnexpectedError(String),
}

impl ProbeOutcome {
    /// Whether the device passed validation
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Stable machine-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ProtocolMismatch => "protocol_mismatch",
            Self::Timeout => "timeout",
            Self::TransportError(_) => "transport_error",
            Self::UnexpectedError(_) => "unexpected_error",
        }
    }

    /// Diagnostic detail, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::TransportError(detail) | Self::UnexpectedError(detail) => Some(detail),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.label(), detail),
            None => write!(f, "{}", self.label()),
        }
    }
}

/// Something that can validate a device at a network address
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Probe: Send + Sync {
    /// Run one handshake against `target`, bounded by `timeout`
    async fn probe(&self, target: &ConnectionTarget, timeout: Duration) -> ProbeOutcome;
}

/// TCP prober driving a [`FrameCodec`]
#[derive(Debug, Clone)]
pub struct ConnectionProber<C> {
    codec: C,
    max_frame_len: usize,
}

impl<C: FrameCodec> ConnectionProber<C> {
    /// Create a prober using `codec`
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            max_frame_len: MAX_FRAME_LEN,
        }
    }

    /// Set the longest response body read before giving up on a delimiter
    #[must_use]
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Get the codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Write the status query and judge the first frame that comes back
    async fn exchange<S>(
        &self,
        framed: &mut Framed<S, DelimiterFramer>,
        deadline: Instant,
    ) -> ProbeOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let encoded = catch_unwind(AssertUnwindSafe(|| self.codec.encode(STATUS_QUERY_OPCODE)));
        let request = match encoded {
            Ok(request) => request,
            Err(panic) => {
                return ProbeOutcome::UnexpectedError(format!(
                    "frame codec panicked while encoding: {}",
                    panic_message(panic.as_ref())
                ))
            }
        };

        match timeout_at(deadline, framed.send(request)).await {
            Err(_) => return ProbeOutcome::Timeout,
            Ok(Err(e)) => return outcome_for_frame_error(e),
            Ok(Ok(())) => {}
        }

        let body = match timeout_at(deadline, framed.next()).await {
            Err(_) => return ProbeOutcome::Timeout,
            Ok(None) => {
                return ProbeOutcome::TransportError(
                    "connection closed before frame delimiter".to_string(),
                )
            }
            Ok(Some(Err(e))) => return outcome_for_frame_error(e),
            Ok(Some(Ok(body))) => body,
        };

        let valid = match catch_unwind(AssertUnwindSafe(|| self.codec.is_valid(&body))) {
            Ok(valid) => valid,
            Err(panic) => {
                return ProbeOutcome::UnexpectedError(format!(
                    "frame codec panicked while validating: {}",
                    panic_message(panic.as_ref())
                ))
            }
        };
        debug!(response = %hex::encode(&body), valid, "probe response");

        if valid {
            ProbeOutcome::Success
        } else {
            ProbeOutcome::ProtocolMismatch
        }
    }
}

#[async_trait]
impl<C: FrameCodec> Probe for ConnectionProber<C> {
    async fn probe(&self, target: &ConnectionTarget, timeout: Duration) -> ProbeOutcome {
        let deadline = deadline_after(timeout);

        let stream = match transport::connect(target, deadline).await {
            Ok(stream) => stream,
            Err(ConnectError::Timeout(_)) => {
                debug!(target = %target, "probe timed out while connecting");
                return ProbeOutcome::Timeout;
            }
            Err(ConnectError::Io { target: addr, source }) => {
                return outcome_for_io_error(
                    source.kind(),
                    format!("connection to {addr} failed: {source}"),
                );
            }
        };

        let mut framed = Framed::new(stream, DelimiterFramer::new().max_length(self.max_frame_len));
        let outcome = self.exchange(&mut framed, deadline).await;
        transport::close(framed.into_inner()).await;

        debug!(target = %target, outcome = %outcome, "probe finished");
        outcome
    }
}

/// Deadline `timeout` from now, saturating far in the future
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS))
}

fn outcome_for_frame_error(err: FrameError) -> ProbeOutcome {
    match err {
        FrameError::Io(e) => {
            let kind = e.kind();
            outcome_for_io_error(kind, e.to_string())
        }
        FrameError::Oversized { .. } => ProbeOutcome::ProtocolMismatch,
        FrameError::Incomplete { .. } => ProbeOutcome::TransportError(err.to_string()),
    }
}

fn outcome_for_io_error(kind: ErrorKind, detail: String) -> ProbeOutcome {
    match kind {
        ErrorKind::TimedOut => ProbeOutcome::Timeout,
        // Not transport faults: something is wrong on our side
        ErrorKind::InvalidInput | ErrorKind::Unsupported | ErrorKind::OutOfMemory => {
            ProbeOutcome::UnexpectedError(detail)
        }
        _ => ProbeOutcome::TransportError(detail),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
