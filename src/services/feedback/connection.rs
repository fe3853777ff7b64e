use crate::domain::App;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),
    #[error("Invalid credentials: {0}")]
    Credentials(String),
    #[error("Invalid host: {0}")]
    InvalidHost(String),
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Connection is not open")]
    NotConnected,
}

/// A byte stream to the feedback service.
#[async_trait]
pub trait Connection: Send + std::fmt::Debug {
    /// Opens the connection.
    ///
    /// # Errors
    /// Returns a `TransportError` if the handshake fails.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Reads up to `len` bytes, returning fewer only when the peer has stopped sending.
    ///
    /// # Errors
    /// Returns a `TransportError` if the socket fails or the read times out.
    async fn read(&mut self, len: usize) -> Result<Vec<u8>, TransportError>;

    /// Closes the connection. Closing a connection that never opened is a no-op.
    ///
    /// # Errors
    /// Returns a `TransportError` if the shutdown fails.
    async fn close(&mut self) -> Result<(), TransportError>;
}

pub trait ConnectionFactory: Send + Sync + std::fmt::Debug {
    /// Builds an unopened connection to `host:port` authenticated as `app`.
    fn connection(&self, app: &App, host: &str, port: u16) -> Box<dyn Connection>;
}
