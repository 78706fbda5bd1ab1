// Transport server: accepts one connection at a time and reads exactly one
// framed message from it.

use std::net::SocketAddr;

use log::{debug, error, trace, warn};
use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;
use crate::protocol::message_types::WireMessage;
use crate::protocol::packet_parser::{read_frame, PacketParser};
use crate::utils::Logger;

pub struct ProtocolServer {
    listener: TcpListener,
    logger: Logger,
}

impl ProtocolServer {
    pub async fn bind(ip_address: &str, port: u16, logger: Logger) -> Result<Self> {
        let listener = TcpListener::bind((ip_address, port)).await?;
        debug!(target: logger.target(), "Listening on {}", listener.local_addr()?);
        Ok(Self { listener, logger })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Blocks until a complete, decodable message arrives. Connections that
    /// end early or carry undecodable bytes are logged and dropped.
    pub async fn receive(&self) -> WireMessage {
        loop {
            match self.try_receive().await {
                Ok(message) => return message,
                Err(e) => warn!(target: self.logger.target(), "Dropping inbound message: {}", e),
            }
        }
    }

    /// Accepts one connection and reads one message from it. The connection
    /// is closed before returning, whatever the outcome.
    pub async fn try_receive(&self) -> Result<WireMessage> {
        let (mut sock, peer) = match self.listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(target: self.logger.target(), "Accept failed: {}", e);
                return Err(e.into());
            }
        };
        debug!(target: self.logger.target(), "Somebody connected from {}", peer);
        self.read_message(&mut sock).await
    }

    async fn read_message(&self, sock: &mut TcpStream) -> Result<WireMessage> {
        let payload = read_frame(sock).await?;
        trace!(target: self.logger.target(), "Got frame of {} bytes", payload.len());
        let message = PacketParser::parse_message(&payload)?;
        trace!(target: self.logger.target(), "Parsed {} from {}", message.kind(), message.origin_id());
        Ok(message)
    }
}
