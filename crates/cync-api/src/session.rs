//! Transport for the persistent TCP/TLS gateway connection to
//! `cm.gelighting.com`: connect-with-fallback, the login handshake, and the
//! login-frame derivation. This module owns bytes on the wire; it knows
//! nothing about topology, rooms, or retries — that orchestration lives in
//! `cync-core`.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};

pub const GATEWAY_HOST: &str = "cm.gelighting.com";
pub const GATEWAY_TLS_PORT: u16 = 23779;
pub const GATEWAY_PLAIN_PORT: u16 = 23778;

/// Which of the three connect strategies succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Tls,
    TlsDangerAcceptInvalid,
    Plaintext,
}

/// A connected gateway socket, already past the login handshake.
pub enum GatewayStream {
    Tls(TlsStream<TcpStream>),
    Plain(TcpStream),
}

impl GatewayStream {
    pub async fn read_some(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let mut scratch = [0u8; 4096];
        let n = match self {
            GatewayStream::Tls(s) => s.read(&mut scratch).await?,
            GatewayStream::Plain(s) => s.read(&mut scratch).await?,
        };
        buf.extend_from_slice(&scratch[..n]);
        Ok(n)
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            GatewayStream::Tls(s) => s.write_all(bytes).await?,
            GatewayStream::Plain(s) => s.write_all(bytes).await?,
        }
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        match self {
            GatewayStream::Tls(s) => s.shutdown().await?,
            GatewayStream::Plain(s) => s.shutdown().await?,
        }
        Ok(())
    }

    /// Split into independent read/write halves so a reader loop and a
    /// single-writer queue-drain loop can run as separate tasks without
    /// contending for one `&mut GatewayStream` (spec §4.3/§5: reads and
    /// writes suspend independently; only the write side needs to be a
    /// single producer-drained queue).
    #[must_use]
    pub fn into_split(self) -> (GatewayReadHalf, GatewayWriteHalf) {
        match self {
            GatewayStream::Tls(s) => {
                let (r, w) = tokio::io::split(s);
                (GatewayReadHalf::Tls(r), GatewayWriteHalf::Tls(w))
            }
            GatewayStream::Plain(s) => {
                let (r, w) = tokio::io::split(s);
                (GatewayReadHalf::Plain(r), GatewayWriteHalf::Plain(w))
            }
        }
    }
}

pub enum GatewayReadHalf {
    Tls(tokio::io::ReadHalf<TlsStream<TcpStream>>),
    Plain(tokio::io::ReadHalf<TcpStream>),
}

impl GatewayReadHalf {
    pub async fn read_some(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let mut scratch = [0u8; 4096];
        let n = match self {
            GatewayReadHalf::Tls(s) => s.read(&mut scratch).await?,
            GatewayReadHalf::Plain(s) => s.read(&mut scratch).await?,
        };
        buf.extend_from_slice(&scratch[..n]);
        Ok(n)
    }
}

pub enum GatewayWriteHalf {
    Tls(tokio::io::WriteHalf<TlsStream<TcpStream>>),
    Plain(tokio::io::WriteHalf<TcpStream>),
}

impl GatewayWriteHalf {
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            GatewayWriteHalf::Tls(s) => s.write_all(bytes).await?,
            GatewayWriteHalf::Plain(s) => s.write_all(bytes).await?,
        }
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        match self {
            GatewayWriteHalf::Tls(s) => s.shutdown().await?,
            GatewayWriteHalf::Plain(s) => s.shutdown().await?,
        }
        Ok(())
    }
}

/// Derive the binary login frame from the REST-recovered `user_id` and
/// `authorize` token (spec §4.1):
/// `0x13 00 00 00 | len(10+authorize) | 0x03 | user_id:u32be | len(authorize):u16be
///  | authorize bytes | 00 00 B4`
#[must_use]
pub fn derive_login_frame(user_id: u32, authorize: &SecretString) -> Vec<u8> {
    let authorize = authorize.expose_secret().as_bytes();
    let mut frame = Vec::with_capacity(14 + authorize.len());
    frame.extend_from_slice(&[0x13, 0x00, 0x00, 0x00]);
    frame.push((10 + authorize.len()) as u8);
    frame.push(0x03);
    frame.extend_from_slice(&user_id.to_be_bytes());
    frame.extend_from_slice(&(authorize.len() as u16).to_be_bytes());
    frame.extend_from_slice(authorize);
    frame.extend_from_slice(&[0x00, 0x00, 0xB4]);
    frame
}

/// Attempt TLS with default verification; on failure retry once with
/// verification disabled; on failure fall back to plaintext. A failure of
/// all three is reported to the caller, who backs off 5s and retries (spec
/// §4.3/§5).
///
/// `allow_fallback=false` treats a verified-TLS failure as terminal instead
/// of trying the two weaker strategies (`cync-core`'s
/// `GatewayTlsPolicy::RequireVerified`).
#[instrument(skip(login_frame))]
pub async fn connect_with_fallback(
    login_frame: &[u8],
    allow_fallback: bool,
) -> Result<(GatewayStream, TransportKind)> {
    match connect_tls(false).await {
        Ok(mut stream) => {
            login(&mut stream, login_frame).await?;
            return Ok((GatewayStream::Tls(stream), TransportKind::Tls));
        }
        Err(err) if allow_fallback => {
            warn!(error = %err, "TLS connect with verification failed, retrying without");
        }
        Err(err) => return Err(err),
    }

    match connect_tls(true).await {
        Ok(mut stream) => {
            login(&mut stream, login_frame).await?;
            return Ok((GatewayStream::Tls(stream), TransportKind::TlsDangerAcceptInvalid));
        }
        Err(err) => warn!(error = %err, "TLS connect without verification failed, falling back to plaintext"),
    }

    let mut stream = TcpStream::connect((GATEWAY_HOST, GATEWAY_PLAIN_PORT)).await?;
    login(&mut stream, login_frame).await?;
    Ok((GatewayStream::Plain(stream), TransportKind::Plaintext))
}

async fn connect_tls(danger_accept_invalid: bool) -> Result<TlsStream<TcpStream>> {
    let tcp = TcpStream::connect((GATEWAY_HOST, GATEWAY_TLS_PORT)).await?;
    let config = if danger_accept_invalid {
        danger_accept_invalid_config()
    } else {
        verified_config()
    };
    let connector = TlsConnector::from(Arc::new(config));
    let server_name = rustls_pki_types::ServerName::try_from(GATEWAY_HOST.to_owned())
        .map_err(|e| Error::TlsHandshake(e.to_string()))?;
    connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| Error::TlsHandshake(e.to_string()))
}

fn verified_config() -> rustls::ClientConfig {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth()
}

fn danger_accept_invalid_config() -> rustls::ClientConfig {
    rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoVerification))
        .with_no_client_auth()
}

/// Accepts any server certificate. Only reachable as the second of three
/// connect attempts (spec §4.3), never the first.
#[derive(Debug)]
struct NoVerification;

impl rustls::client::danger::ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls_pki_types::CertificateDer<'_>,
        _intermediates: &[rustls_pki_types::CertificateDer<'_>],
        _server_name: &rustls_pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls_pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls_pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls_pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

async fn login<S>(stream: &mut S, login_frame: &[u8]) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(login_frame).await?;
    let mut ack = [0u8; 1];
    let n = tokio::time::timeout(Duration::from_secs(10), stream.read(&mut ack))
        .await
        .map_err(|_| Error::ConnectTimeout)??;
    if n == 0 {
        return Err(Error::PeerClosed);
    }
    debug!("gateway login handshake acknowledged");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_a_login_frame_derivation() {
        let frame = derive_login_frame(0x0102_0304, &SecretString::from("ABCDE".to_string()));
        let expected = [
            0x13, 0x00, 0x00, 0x00, 0x0F, 0x03, 0x01, 0x02, 0x03, 0x04, 0x00, 0x05, 0x41, 0x42,
            0x43, 0x44, 0x45, 0x00, 0x00, 0xB4,
        ];
        assert_eq!(frame, expected);
    }
}
