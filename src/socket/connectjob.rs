use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::socket::client::SocketType;
use boring::ssl::{SslConnector, SslMethod, SslVerifyMode, SslVersion};
use std::net::IpAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use url::{Host, Url};

/// Manages the connection process: DNS -> TCP -> SSL.
/// Roughly equivalent to net::ConnectJob.
#[derive(Debug, Clone, Default)]
pub struct ConnectJob {
    connect_timeout: Option<Duration>,
}

impl ConnectJob {
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        Self { connect_timeout }
    }

    /// Open a connection to the URL's host, wrapped in TLS for `https`.
    ///
    /// The timeout covers DNS, TCP and the TLS handshake together.
    pub async fn connect(&self, url: &Url) -> Result<SocketType, NetError> {
        match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, Self::connect_inner(url))
                .await
                .map_err(|_| {
                    tracing::debug!(url = %url, ?limit, "connect timed out");
                    NetError::ConnectionTimedOut
                })?,
            None => Self::connect_inner(url).await,
        }
    }

    async fn connect_inner(url: &Url) -> Result<SocketType, NetError> {
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(NetError::InvalidUrl),
        };
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;

        // 1. DNS Resolution
        let addrs = tokio::net::lookup_host((host.as_str(), port))
            .await
            .dns_context(&host)?;

        // 2. TCP Connect, first address that answers
        let mut last_error = NetError::NameNotResolved;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect(addr).await.connection_context(&host, port) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_error = e,
            }
        }
        let stream = stream.ok_or(last_error)?;
        tracing::debug!(host = %host, port, "TCP connected");

        // 3. SSL Handshake (if https)
        match url.scheme() {
            "http" => Ok(SocketType::Tcp(stream)),
            "https" => Self::tls_handshake(&host, stream).await,
            _ => Err(NetError::UnknownUrlScheme),
        }
    }

    async fn tls_handshake(host: &str, stream: TcpStream) -> Result<SocketType, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        builder
            .set_min_proto_version(Some(SslVersion::TLS1_2))
            .map_err(|_| NetError::SslProtocolError)?;
        // Only HTTP/1.1 is spoken on these connections.
        builder
            .set_alpn_protos(b"\x08http/1.1")
            .map_err(|_| NetError::SslProtocolError)?;
        builder.set_verify(SslVerifyMode::PEER);

        let mut config = builder
            .build()
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        // RFC 6066: SNI MUST NOT carry a literal IP address.
        if host.parse::<IpAddr>().is_ok() {
            config.set_use_server_name_indication(false);
        }

        let tls_stream = tokio_boring::connect(config, host, stream)
            .await
            .map_err(|e| {
                tracing::debug!(host = %host, error = ?e, "SSL handshake failed");
                NetError::SslProtocolError
            })?;
        Ok(SocketType::Ssl(tls_stream))
    }
}
