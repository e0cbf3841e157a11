//! Transport layer abstraction.
//!
//! A transport delivers one [`ServerMessage`] to one server and returns its
//! [`ServerReply`]. Timeouts are applied by the caller, so implementations may
//! block on I/O for as long as the socket allows.

use crate::codec::{read_frame, write_frame};
use crate::config::ServerEndpoint;
use crate::error::NetResult;
use crate::protocol::{ServerMessage, ServerReply};
use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::trace;

/// Delivers messages to a monitoring server.
#[async_trait]
pub trait ServerTransport: Send + Sync {
    /// Connects to `server`, sends `message`, and waits for the reply.
    async fn exchange(
        &self,
        server: &ServerEndpoint,
        message: &ServerMessage,
    ) -> NetResult<ServerReply>;
}

/// TCP transport: one short-lived connection per exchange.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

#[async_trait]
impl ServerTransport for TcpTransport {
    async fn exchange(
        &self,
        server: &ServerEndpoint,
        message: &ServerMessage,
    ) -> NetResult<ServerReply> {
        let mut stream = TcpStream::connect((server.host.as_str(), server.port)).await?;
        trace!("connected to {} for {}", server, message.kind());
        write_frame(&mut stream, message).await?;
        let reply: ServerReply = read_frame(&mut stream).await?;
        Ok(reply)
    }
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use crate::error::NetError;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// How the mock answers messages sent to a given host.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub enum MockBehavior {
        /// Reply with `Ack`.
        #[default]
        Accept,
        /// Fail as if the connection was refused.
        Refuse,
        /// Reply with `Reject`.
        Reject(String),
        /// Never answer; the caller's timeout has to fire.
        Hang,
    }

    #[derive(Debug, Default)]
    struct MockState {
        behaviors: HashMap<String, MockBehavior>,
        attempts: Vec<(ServerEndpoint, ServerMessage)>,
    }

    /// Records every exchange and answers according to per-host behavior.
    #[derive(Debug, Clone, Default)]
    pub struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        /// Creates a mock that accepts everything.
        pub fn new() -> Self {
            Self::default()
        }

        /// Sets how messages to `host` are answered.
        pub fn set_behavior(&self, host: impl Into<String>, behavior: MockBehavior) {
            self.state
                .lock()
                .unwrap()
                .behaviors
                .insert(host.into(), behavior);
        }

        /// All exchanges attempted so far, in order.
        pub fn attempts(&self) -> Vec<(ServerEndpoint, ServerMessage)> {
            self.state.lock().unwrap().attempts.clone()
        }

        /// Hosts contacted so far, in order.
        pub fn attempted_hosts(&self) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .attempts
                .iter()
                .map(|(server, _)| server.host.clone())
                .collect()
        }

        /// Number of attempts carrying a message of the given kind.
        pub fn count(&self, kind: &str) -> usize {
            self.state
                .lock()
                .unwrap()
                .attempts
                .iter()
                .filter(|(_, message)| message.kind() == kind)
                .count()
        }

        /// Forgets recorded attempts, keeping behaviors.
        pub fn clear(&self) {
            self.state.lock().unwrap().attempts.clear();
        }
    }

    #[async_trait]
    impl ServerTransport for MockTransport {
        async fn exchange(
            &self,
            server: &ServerEndpoint,
            message: &ServerMessage,
        ) -> NetResult<ServerReply> {
            let behavior = {
                let mut state = self.state.lock().unwrap();
                state.attempts.push((server.clone(), message.clone()));
                state
                    .behaviors
                    .get(&server.host)
                    .cloned()
                    .unwrap_or_default()
            };

            match behavior {
                MockBehavior::Accept => Ok(ServerReply::Ack),
                MockBehavior::Refuse => Err(NetError::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("connection to {server} refused"),
                ))),
                MockBehavior::Reject(reason) => Ok(ServerReply::reject(reason)),
                MockBehavior::Hang => std::future::pending().await,
            }
        }
    }
}
