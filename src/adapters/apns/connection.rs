use crate::config::FeedbackConfig;
use crate::domain::App;
use crate::services::feedback::connection::{Connection, ConnectionFactory, TransportError};
use async_trait::async_trait;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

/// Builds TLS connections authenticated with each app's client certificate.
#[derive(Debug, Clone)]
pub struct TlsConnectionFactory {
    roots: Arc<RootCertStore>,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl TlsConnectionFactory {
    #[must_use]
    pub fn new(roots: RootCertStore, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self { roots: Arc::new(roots), connect_timeout, read_timeout }
    }

    /// Loads the trusted CA bundle named in the configuration.
    ///
    /// # Errors
    /// Returns a `TransportError` if the bundle cannot be read or holds no usable certificates.
    pub fn from_config(config: &FeedbackConfig) -> Result<Self, TransportError> {
        let pem = std::fs::read(&config.ca_bundle_path)?;
        let certs = rustls_pemfile::certs(&mut pem.as_slice()).collect::<Result<Vec<_>, _>>()?;

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(certs);
        if added == 0 {
            return Err(TransportError::Credentials(format!(
                "no usable CA certificates in {}",
                config.ca_bundle_path.display()
            )));
        }
        tracing::debug!(added, ignored, path = %config.ca_bundle_path.display(), "Loaded CA bundle");

        Ok(Self::new(
            roots,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.read_timeout_secs),
        ))
    }
}

impl ConnectionFactory for TlsConnectionFactory {
    fn connection(&self, app: &App, host: &str, port: u16) -> Box<dyn Connection> {
        Box::new(TlsConnection {
            roots: Arc::clone(&self.roots),
            certificate: app.certificate.clone(),
            host: host.to_string(),
            port,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            stream: None,
        })
    }
}

pub struct TlsConnection {
    roots: Arc<RootCertStore>,
    certificate: String,
    host: String,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
    stream: Option<TlsStream<TcpStream>>,
}

impl std::fmt::Debug for TlsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connected", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connection for TlsConnection {
    #[tracing::instrument(level = "debug", skip(self), fields(host = %self.host, port = self.port), err)]
    async fn connect(&mut self) -> Result<(), TransportError> {
        let config = client_config(Arc::clone(&self.roots), &self.certificate)?;
        let connector = TlsConnector::from(Arc::new(config));
        let server_name =
            ServerName::try_from(self.host.clone()).map_err(|_| TransportError::InvalidHost(self.host.clone()))?;

        let stream = tokio::time::timeout(self.connect_timeout, async {
            let tcp = TcpStream::connect((self.host.as_str(), self.port)).await?;
            Ok::<_, std::io::Error>(connector.connect(server_name, tcp).await?)
        })
        .await
        .map_err(|_| TransportError::Timeout(self.connect_timeout))??;

        self.stream = Some(stream);
        Ok(())
    }

    async fn read(&mut self, len: usize) -> Result<Vec<u8>, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        read_up_to(stream, len, self.read_timeout).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

/// Builds a client config presenting the certificate chain and key found in `pem`.
fn client_config(roots: Arc<RootCertStore>, pem: &str) -> Result<ClientConfig, TransportError> {
    if pem.contains("ENCRYPTED PRIVATE KEY") || pem.contains("Proc-Type: 4,ENCRYPTED") {
        return Err(TransportError::Credentials("encrypted private keys are not supported".to_string()));
    }

    let chain = rustls_pemfile::certs(&mut pem.as_bytes()).collect::<Result<Vec<_>, _>>()?;
    if chain.is_empty() {
        return Err(TransportError::Credentials("no certificate found".to_string()));
    }
    let key = rustls_pemfile::private_key(&mut pem.as_bytes())?
        .ok_or_else(|| TransportError::Credentials("no private key found".to_string()))?;

    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_client_auth_cert(chain, key)?;

    Ok(config)
}

/// Reads until `len` bytes have arrived or the peer stops sending.
///
/// A TLS stream cut without `close_notify` counts as end of stream.
pub(crate) async fn read_up_to<R>(reader: &mut R, len: usize, read_timeout: Duration) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; len];
    let mut filled = 0;

    while filled < len {
        let res = tokio::time::timeout(read_timeout, reader.read(&mut buf[filled..]))
            .await
            .map_err(|_| TransportError::Timeout(read_timeout))?;

        match res {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }

    buf.truncate(filled);
    Ok(buf)
}
