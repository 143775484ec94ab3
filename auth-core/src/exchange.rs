//! One request/reply cycle over a datagram channel: send, wait with timeout, retry, classify.
//!
//! The host owns the socket and implements [`DatagramChannel`]; this module owns the
//! retry policy. Per call the states are
//! `Sending -> AwaitingReply -> {reply | timeout -> Sending | exhausted | channel fault}`.

use std::future::Future;
use std::io;
use std::time::Duration;

use crate::server_error::ServerError;
use crate::wire;

pub const DEFAULT_ATTEMPTS: u32 = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6);
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 4096;

/// Connected, message-oriented endpoint supplied by the host.
///
/// A timed-out send or receive must surface as `io::ErrorKind::TimedOut` or
/// `io::ErrorKind::WouldBlock`. Any other error is treated as a fatal channel fault.
/// Dropping the channel closes it.
pub trait DatagramChannel {
    /// Send one datagram.
    fn send(&mut self, payload: &[u8]) -> impl Future<Output = io::Result<()>>;

    /// Receive one datagram into `buf`, waiting at most `timeout`. Returns its length.
    fn recv(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> impl Future<Output = io::Result<usize>>;
}

/// Retry policy for a single exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Total sends before giving up.
    pub attempts: u32,
    /// How long each attempt waits for a reply.
    pub timeout: Duration,
    /// Receive buffer ceiling; longer datagrams are truncated by the transport.
    pub recv_buffer_size: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

/// Terminal failure of an exchange.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// Send/receive failed for a reason other than a timeout. Not retried.
    #[error("could not send and/or receive data: {0}")]
    Channel(#[source] io::Error),
    /// Every attempt timed out (or the server sent an empty datagram).
    #[error("no response from the server after {attempts} attempt(s)")]
    NoResponse { attempts: u32 },
    /// The server answered with the 4-byte error layout.
    #[error("auth server returned an error {0}")]
    Server(ServerError),
}

/// Send `request` and return the first reply, retrying on timeout up to `config.attempts` times.
///
/// Each attempt re-sends the same bytes; the first datagram received wins and no
/// further replies are awaited. A reply in the error layout becomes
/// [`ExchangeError::Server`] instead of being returned.
pub async fn perform<C: DatagramChannel>(
    channel: &mut C,
    request: &[u8],
    config: &ExchangeConfig,
) -> Result<Vec<u8>, ExchangeError> {
    let mut buf = vec![0u8; config.recv_buffer_size];
    let mut attempt = 0;
    while attempt < config.attempts {
        attempt += 1;
        let received = match channel.send(request).await {
            Ok(()) => channel.recv(&mut buf, config.timeout).await,
            Err(e) => Err(e),
        };
        match received {
            Ok(0) => return Err(ExchangeError::NoResponse { attempts: attempt }),
            Ok(len) => return classify(&buf[..len]),
            Err(e) if is_timeout(&e) => continue,
            Err(e) => return Err(ExchangeError::Channel(e)),
        }
    }
    Err(ExchangeError::NoResponse { attempts: attempt })
}

fn classify(reply: &[u8]) -> Result<Vec<u8>, ExchangeError> {
    match wire::try_decode_error(reply) {
        Some(err) => Err(ExchangeError::Server(ServerError::from_code(err.code))),
        None => Ok(reply.to_vec()),
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// What the scripted peer does on one attempt.
    #[derive(Debug, Clone)]
    pub(crate) enum Step {
        Reply(Vec<u8>),
        Timeout,
        Fail(io::ErrorKind),
        SendFail(io::ErrorKind),
    }

    /// In-memory channel replaying a fixed script, one step per send.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedChannel {
        script: VecDeque<Step>,
        pending: Option<Step>,
        pub(crate) sent: Vec<Vec<u8>>,
        pub(crate) timeouts_seen: Vec<Duration>,
    }

    impl ScriptedChannel {
        pub(crate) fn new(script: impl IntoIterator<Item = Step>) -> Self {
            Self {
                script: script.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl DatagramChannel for ScriptedChannel {
        async fn send(&mut self, payload: &[u8]) -> io::Result<()> {
            let step = self.script.pop_front().unwrap_or(Step::Timeout);
            if let Step::SendFail(kind) = step {
                return Err(io::Error::from(kind));
            }
            self.sent.push(payload.to_vec());
            self.pending = Some(step);
            Ok(())
        }

        async fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
            self.timeouts_seen.push(timeout);
            match self.pending.take() {
                Some(Step::Reply(bytes)) => {
                    let len = bytes.len().min(buf.len());
                    buf[..len].copy_from_slice(&bytes[..len]);
                    Ok(len)
                }
                Some(Step::Fail(kind)) => Err(io::Error::from(kind)),
                _ => Err(io::Error::from(io::ErrorKind::TimedOut)),
            }
        }
    }

    fn config(attempts: u32) -> ExchangeConfig {
        ExchangeConfig {
            attempts,
            timeout: Duration::from_millis(10),
            ..ExchangeConfig::default()
        }
    }

    #[test]
    fn default_policy() {
        let c = ExchangeConfig::default();
        assert_eq!(c.attempts, 5);
        assert_eq!(c.timeout, Duration::from_secs(6));
        assert_eq!(c.recv_buffer_size, 4096);
    }

    #[tokio::test]
    async fn first_reply_wins() {
        let mut ch = ScriptedChannel::new([Step::Reply(vec![1; 82]), Step::Reply(vec![2; 82])]);
        let reply = perform(&mut ch, b"req", &config(5)).await.unwrap();
        assert_eq!(reply, vec![1; 82]);
        assert_eq!(ch.sent.len(), 1);
        assert_eq!(ch.timeouts_seen, vec![Duration::from_millis(10)]);
    }

    #[tokio::test]
    async fn retries_after_timeouts() {
        let mut ch = ScriptedChannel::new([Step::Timeout, Step::Timeout, Step::Reply(vec![7; 83])]);
        let reply = perform(&mut ch, b"req", &config(5)).await.unwrap();
        assert_eq!(reply.len(), 83);
        assert_eq!(ch.sent, vec![b"req".to_vec(); 3]);
    }

    #[tokio::test]
    async fn exhausts_after_exactly_max_attempts() {
        let mut ch = ScriptedChannel::new(std::iter::repeat(Step::Timeout).take(10));
        let err = perform(&mut ch, b"req", &config(4)).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NoResponse { attempts: 4 }));
        assert_eq!(ch.sent.len(), 4);
    }

    #[tokio::test]
    async fn would_block_counts_as_timeout() {
        let mut ch = ScriptedChannel::new([
            Step::Fail(io::ErrorKind::WouldBlock),
            Step::Reply(vec![0; 82]),
        ]);
        assert!(perform(&mut ch, b"req", &config(2)).await.is_ok());
        assert_eq!(ch.sent.len(), 2);
    }

    #[tokio::test]
    async fn channel_fault_aborts_immediately() {
        let mut ch = ScriptedChannel::new([
            Step::Timeout,
            Step::Fail(io::ErrorKind::ConnectionRefused),
            Step::Reply(vec![0; 82]),
        ]);
        let err = perform(&mut ch, b"req", &config(5)).await.unwrap_err();
        match err {
            ExchangeError::Channel(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionRefused),
            other => panic!("expected channel fault, got {other:?}"),
        }
        assert_eq!(ch.sent.len(), 2);
    }

    #[tokio::test]
    async fn send_fault_aborts_immediately() {
        let mut ch = ScriptedChannel::new([Step::SendFail(io::ErrorKind::PermissionDenied)]);
        let err = perform(&mut ch, b"req", &config(5)).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Channel(_)));
        assert!(ch.sent.is_empty());
    }

    #[tokio::test]
    async fn error_reply_is_surfaced() {
        let mut ch = ScriptedChannel::new([Step::Reply(vec![0x01, 0x00, 0x00, 0x03])]);
        let err = perform(&mut ch, b"req", &config(5)).await.unwrap_err();
        match err {
            ExchangeError::Server(e) => {
                assert_eq!(e.code, 3);
                assert_eq!(e.message, "INVALID_PARAMETER");
            }
            other => panic!("expected server error, got {other:?}"),
        }
        assert_eq!(ch.sent.len(), 1);
    }

    #[tokio::test]
    async fn four_bytes_of_another_type_pass_through() {
        let mut ch = ScriptedChannel::new([Step::Reply(vec![0x00, 0x02, 0x00, 0x03])]);
        let reply = perform(&mut ch, b"req", &config(1)).await.unwrap();
        assert_eq!(reply, vec![0x00, 0x02, 0x00, 0x03]);
    }

    #[tokio::test]
    async fn empty_datagram_is_no_response() {
        let mut ch = ScriptedChannel::new([Step::Timeout, Step::Reply(vec![])]);
        let err = perform(&mut ch, b"req", &config(5)).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NoResponse { attempts: 2 }));
    }

    #[tokio::test]
    async fn zero_attempts_sends_nothing() {
        let mut ch = ScriptedChannel::new([Step::Reply(vec![0; 82])]);
        let err = perform(&mut ch, b"req", &config(0)).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NoResponse { attempts: 0 }));
        assert!(ch.sent.is_empty());
    }

    #[tokio::test]
    async fn reply_truncated_to_buffer() {
        let mut ch = ScriptedChannel::new([Step::Reply(vec![9; 100])]);
        let cfg = ExchangeConfig {
            recv_buffer_size: 16,
            ..config(1)
        };
        assert_eq!(perform(&mut ch, b"req", &cfg).await.unwrap().len(), 16);
    }
}
