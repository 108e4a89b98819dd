//! Printer adapters for sending encoded tickets
//!
//! Supports:
//! - HTTP printers (raw body POSTed to the device, PUT as fallback)
//! - Network printers (raw TCP, port 9100)
//!
//! Every send is a single attempt bounded by one timeout. Nothing here
//! retries; the caller owns that policy.

use std::error::Error as _;
use std::io::ErrorKind;
use std::net::Ipv6Addr;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

use crate::error::TransportFailure;

/// Default raw TCP port for thermal printers
pub const DEFAULT_RAW_PORT: u16 = 9100;

/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The device acknowledged the job
    Delivered,
    /// The bytes were accepted but the device gives no acknowledgement
    Unconfirmed,
    Failed(TransportFailure),
}

impl DeliveryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DeliveryOutcome::Failed(_))
    }

    /// Operator-facing description
    pub fn describe(&self) -> String {
        match self {
            DeliveryOutcome::Delivered => "printed".to_string(),
            DeliveryOutcome::Unconfirmed => "sent, not confirmed".to_string(),
            DeliveryOutcome::Failed(reason) => format!("failed: {}", reason),
        }
    }
}

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw encoded data to the printer
    async fn send(&self, data: &[u8]) -> DeliveryOutcome;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Where a connection string points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `http://` or `https://` device URL
    Http(String),
    /// Raw socket, from `tcp://host:port`, `host:port` or bare `host`
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Parse a printer connection string
    pub fn parse(connection: &str) -> Result<Self, TransportFailure> {
        let connection = connection.trim();
        if connection.is_empty() {
            return Err(TransportFailure::InvalidAddress("empty address".to_string()));
        }

        if connection.starts_with("http://") || connection.starts_with("https://") {
            reqwest::Url::parse(connection)
                .map_err(|e| TransportFailure::InvalidAddress(format!("{}: {}", connection, e)))?;
            return Ok(Endpoint::Http(connection.to_string()));
        }

        let rest = connection.strip_prefix("tcp://").unwrap_or(connection);
        let invalid = || TransportFailure::InvalidAddress(connection.to_string());
        if rest.contains('/') {
            return Err(invalid());
        }

        // IPv6 literals need brackets: `[::1]` or `[::1]:9100`
        if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, after) = bracketed.split_once(']').ok_or_else(invalid)?;
            if host.is_empty() || host.parse::<Ipv6Addr>().is_err() {
                return Err(invalid());
            }
            let port = match after {
                "" => DEFAULT_RAW_PORT,
                _ => after
                    .strip_prefix(':')
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(invalid)?,
            };
            return Ok(Endpoint::Tcp {
                host: host.to_string(),
                port,
            });
        }
        if rest.matches(':').count() > 1 {
            return Err(invalid());
        }

        match rest.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port = port.parse().map_err(|_| invalid())?;
                Ok(Endpoint::Tcp {
                    host: host.to_string(),
                    port,
                })
            }
            Some(_) => Err(invalid()),
            None => Ok(Endpoint::Tcp {
                host: rest.to_string(),
                port: DEFAULT_RAW_PORT,
            }),
        }
    }
}

/// Send data to whatever the connection string points at
#[instrument(skip(data), fields(data_len = data.len()))]
pub async fn deliver(data: &[u8], connection: &str, timeout: Duration) -> DeliveryOutcome {
    match Endpoint::parse(connection) {
        Ok(Endpoint::Http(url)) => HttpPrinter::new(url).with_timeout(timeout).send(data).await,
        Ok(Endpoint::Tcp { host, port }) => {
            NetworkPrinter::new(host, port)
                .with_timeout(timeout)
                .send(data)
                .await
        }
        Err(reason) => {
            warn!(error = %reason, "Invalid printer address");
            DeliveryOutcome::Failed(reason)
        }
    }
}

/// Check reachability of whatever the connection string points at
pub async fn probe(connection: &str) -> bool {
    match Endpoint::parse(connection) {
        Ok(Endpoint::Http(url)) => HttpPrinter::new(url).is_online().await,
        Ok(Endpoint::Tcp { host, port }) => NetworkPrinter::new(host, port).is_online().await,
        Err(_) => false,
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn classify_io(e: &std::io::Error) -> TransportFailure {
    match e.kind() {
        ErrorKind::ConnectionRefused => TransportFailure::ConnectionRefused(e.to_string()),
        _ => TransportFailure::Network(e.to_string()),
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// Printer reached through an HTTP endpoint on the device
#[derive(Debug, Clone)]
pub struct HttpPrinter {
    url: String,
    timeout: Duration,
}

impl HttpPrinter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the attempt timeout (covers the PUT fallback too)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post_then_put(
        &self,
        client: &reqwest::Client,
        data: &[u8],
    ) -> Result<DeliveryOutcome, reqwest::Error> {
        let response = client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await?;

        let response = match response.status() {
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                info!(status = %response.status(), "POST rejected, falling back to PUT");
                client
                    .put(&self.url)
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(data.to_vec())
                    .send()
                    .await?
            }
            _ => response,
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(DeliveryOutcome::Failed(TransportFailure::UnexpectedStatus(
                status.as_u16(),
            )));
        }

        let body = response.text().await.unwrap_or_default();
        if is_acknowledgement(&body) {
            Ok(DeliveryOutcome::Delivered)
        } else {
            Ok(DeliveryOutcome::Unconfirmed)
        }
    }

    fn classify(&self, e: &reqwest::Error) -> TransportFailure {
        if e.is_timeout() {
            return TransportFailure::Timeout(millis(self.timeout));
        }
        let mut source = std::error::Error::source(e);
        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<std::io::Error>() {
                return classify_io(io);
            }
            source = err.source();
        }
        TransportFailure::Network(e.to_string())
    }
}

/// Whether a 2xx response body is a job acknowledgement
///
/// Recognises the ePOS-Print `success="true"` attribute and a JSON
/// `"success": true` field. Empty or opaque bodies are not acknowledgements.
fn is_acknowledgement(body: &str) -> bool {
    let compact: String = body
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.contains("success=\"true\"") || compact.contains("\"success\":true")
}

impl Printer for HttpPrinter {
    #[instrument(skip(self, data), fields(url = %self.url, data_len = data.len()))]
    async fn send(&self, data: &[u8]) -> DeliveryOutcome {
        let client = match reqwest::Client::builder().timeout(self.timeout).build() {
            Ok(c) => c,
            Err(e) => return DeliveryOutcome::Failed(TransportFailure::Network(e.to_string())),
        };

        let started = Instant::now();
        let outcome =
            match tokio::time::timeout(self.timeout, self.post_then_put(&client, data)).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => DeliveryOutcome::Failed(self.classify(&e)),
                Err(_) => DeliveryOutcome::Failed(TransportFailure::Timeout(millis(self.timeout))),
            };

        match &outcome {
            DeliveryOutcome::Failed(reason) => {
                warn!(error = %reason, elapsed_ms = millis(started.elapsed()), "HTTP print failed")
            }
            other => info!(outcome = %other.describe(), "HTTP print sent"),
        }
        outcome
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn is_online(&self) -> bool {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
        {
            Ok(c) => c,
            Err(_) => return false,
        };
        // Any answer at all means something is listening
        match client.head(&self.url).send().await {
            Ok(_) => {
                info!("Printer online");
                true
            }
            Err(e) => {
                warn!(error = %e, "Printer offline");
                false
            }
        }
    }
}

// ============================================================================
// Raw TCP
// ============================================================================

/// Network printer (raw TCP, usually port 9100)
///
/// Raw printing has no response channel, so a completed write is only ever
/// `Unconfirmed`.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NetworkPrinter {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    async fn write(&self, data: &[u8]) -> Result<(), TransportFailure> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| classify_io(&e))?;

        info!("Connected, sending {} bytes", data.len());
        stream.write_all(data).await.map_err(|e| classify_io(&e))?;
        stream.flush().await.map_err(|e| classify_io(&e))?;
        stream.shutdown().await.map_err(|e| classify_io(&e))?;
        Ok(())
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(self, data), fields(addr = %self.addr(), data_len = data.len()))]
    async fn send(&self, data: &[u8]) -> DeliveryOutcome {
        match tokio::time::timeout(self.timeout, self.write(data)).await {
            Ok(Ok(())) => {
                info!("Print job written");
                DeliveryOutcome::Unconfirmed
            }
            Ok(Err(reason)) => {
                warn!(error = %reason, "Raw print failed");
                DeliveryOutcome::Failed(reason)
            }
            Err(_) => {
                warn!("Raw print timeout");
                DeliveryOutcome::Failed(TransportFailure::Timeout(millis(self.timeout)))
            }
        }
    }

    #[instrument(skip(self), fields(addr = %self.addr()))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(
            check_timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        {
            Ok(Ok(_)) => {
                info!("Printer online");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http() {
        assert_eq!(
            Endpoint::parse("http://192.168.1.50/cgi-bin/print").unwrap(),
            Endpoint::Http("http://192.168.1.50/cgi-bin/print".to_string())
        );
    }

    #[test]
    fn test_parse_tcp_forms() {
        assert_eq!(
            Endpoint::parse("tcp://192.168.1.100:9101").unwrap(),
            Endpoint::Tcp {
                host: "192.168.1.100".to_string(),
                port: 9101
            }
        );
        assert_eq!(
            Endpoint::parse("kitchen-printer.local").unwrap(),
            Endpoint::Tcp {
                host: "kitchen-printer.local".to_string(),
                port: DEFAULT_RAW_PORT
            }
        );
    }

    #[test]
    fn test_parse_ipv6() {
        assert_eq!(
            Endpoint::parse("[::1]:9101").unwrap(),
            Endpoint::Tcp {
                host: "::1".to_string(),
                port: 9101
            }
        );
        assert_eq!(
            Endpoint::parse("tcp://[fe80::10]").unwrap(),
            Endpoint::Tcp {
                host: "fe80::10".to_string(),
                port: DEFAULT_RAW_PORT
            }
        );
        assert!(Endpoint::parse("::1").is_err());
        assert!(Endpoint::parse("fe80::10:9100").is_err());
        assert!(Endpoint::parse("[::1").is_err());
        assert!(Endpoint::parse("[::1]9100").is_err());
        assert!(Endpoint::parse("[printer]:9100").is_err());

        assert_eq!(NetworkPrinter::new("::1", 9100).addr(), "[::1]:9100");
    }

    #[test]
    fn test_invalid_addr() {
        assert!(Endpoint::parse("").is_err());
        assert!(Endpoint::parse("192.168.1.100:notaport").is_err());
        assert!(Endpoint::parse(":9100").is_err());
        assert!(Endpoint::parse("http://").is_err());
    }

    #[test]
    fn test_acknowledgement_detection() {
        assert!(is_acknowledgement(
            r#"<response success="true" code="" status="251658262"/>"#
        ));
        assert!(is_acknowledgement(r#"{ "success" : true }"#));
        assert!(!is_acknowledgement(""));
        assert!(!is_acknowledgement("OK"));
        assert!(!is_acknowledgement(r#"{"success":false}"#));
    }

    #[test]
    fn test_outcome_describe() {
        assert_eq!(DeliveryOutcome::Unconfirmed.describe(), "sent, not confirmed");
        assert_eq!(
            DeliveryOutcome::Failed(TransportFailure::Timeout(10000)).describe(),
            "failed: timeout after 10000 ms"
        );
    }
}
