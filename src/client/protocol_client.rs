// Transport client: one outbound connection per message.

use std::io::ErrorKind;
use std::net::SocketAddr;

use log::{debug, error, info, trace, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::{AppError, Result};
use crate::protocol::packet_parser::write_frame;
use crate::utils::{Logger, RetryPolicy};

#[derive(Debug, Clone)]
pub struct ProtocolClient {
    retry: RetryPolicy,
    logger: Logger,
}

impl ProtocolClient {
    pub fn new(retry: RetryPolicy, logger: Logger) -> Self {
        Self { retry, logger }
    }

    /// Connects to `ip_address:port`, writes one length-prefixed frame and
    /// closes the connection. Returns the number of bytes handed to the
    /// transport, prefix included.
    ///
    /// A refused connect is retried with backoff until the peer listens (or
    /// the retry policy gives up). Any other connect error abandons the send.
    pub async fn send_to(&self, ip_address: &str, port: u16, message: &[u8]) -> Result<usize> {
        let target = self.logger.target();
        debug!(target: target, "Sending message to {}:{}", ip_address, port);

        let endpoints: Vec<SocketAddr> = tokio::net::lookup_host((ip_address, port))
            .await
            .map_err(|e| {
                error!(target: target, "Could not resolve {}:{}: {}", ip_address, port, e);
                AppError::NetworkError(format!("Failed to resolve {}:{}: {}", ip_address, port, e))
            })?
            .collect();
        if endpoints.is_empty() {
            return Err(AppError::NetworkError(format!(
                "No address found for {}:{}",
                ip_address, port
            )));
        }

        let mut stream = self.connect(&endpoints).await?;

        trace!(target: target, "Message prefix: {}", message.len());
        let sent = write_frame(&mut stream, message).await?;
        if let Err(e) = stream.shutdown().await {
            debug!(target: target, "Shutdown after send failed: {}", e);
        }

        info!(target: target, "Message sent to {}:{} ({} bytes)", ip_address, port, sent);
        Ok(sent)
    }

    async fn connect(&self, endpoints: &[SocketAddr]) -> Result<TcpStream> {
        let target = self.logger.target();
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            match Self::connect_any(endpoints).await {
                Ok(stream) => {
                    if attempt > 1 {
                        debug!(target: target, "Connected after {} attempts", attempt);
                    }
                    return Ok(stream);
                }
                Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                    if !self.retry.allows(attempt) {
                        warn!(target: target, "Giving up on {:?} after {} refused attempts", endpoints, attempt);
                        return Err(AppError::ConnectionRefused(format!(
                            "{:?} refused {} connection attempts",
                            endpoints, attempt
                        )));
                    }
                    let delay = self.retry.backoff(attempt);
                    trace!(target: target, "Connection refused, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(target: target, "Error while connecting: {}", e);
                    return Err(AppError::NetworkError(format!(
                        "Failed to connect to {:?}: {}",
                        endpoints, e
                    )));
                }
            }
        }
    }

    /// Tries every resolved endpoint once. The error of the last endpoint is
    /// reported.
    async fn connect_any(endpoints: &[SocketAddr]) -> std::io::Result<TcpStream> {
        let mut last_err = None;
        for addr in endpoints {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| std::io::Error::new(ErrorKind::NotFound, "no endpoint")))
    }
}
