use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, instrument};

use crate::config::{ClientConfig, ServerConfig, TransportConfig};
use crate::core::codec::{Frame, MatchMakerCodec};
use crate::core::size::warm_size_cache;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::{Message, MessageType};
use crate::utils::metrics::CodecMetrics;

/// A framed matchmaking connection over any byte stream.
///
/// Sends are bounded by `send_timeout`, receives by `receive_timeout`.
pub struct Connection<S> {
    framed: Framed<S, MatchMakerCodec>,
    send_timeout: Duration,
    receive_timeout: Duration,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, codec: MatchMakerCodec, send_timeout: Duration, receive_timeout: Duration) -> Self {
        Self {
            framed: Framed::new(stream, codec),
            send_timeout,
            receive_timeout,
        }
    }

    /// Client side of an established stream.
    pub fn client(stream: S, config: &ClientConfig, transport: &TransportConfig, metrics: Arc<CodecMetrics>) -> Self {
        Self::new(
            stream,
            MatchMakerCodec::from_config(transport, metrics),
            config.operation_timeout,
            config.response_timeout,
        )
    }

    /// Server side of an accepted stream. Receives wait up to the idle timeout.
    pub fn server(stream: S, config: &ServerConfig, transport: &TransportConfig, metrics: Arc<CodecMetrics>) -> Self {
        Self::new(
            stream,
            MatchMakerCodec::from_config(transport, metrics),
            config.operation_timeout,
            config.idle_timeout,
        )
    }

    pub fn metrics(&self) -> &Arc<CodecMetrics> {
        self.framed.codec().metrics()
    }

    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }

    pub async fn send<M: Message>(&mut self, message: &M) -> Result<()> {
        self.send_frame(Frame::from_message(message)?).await
    }

    pub async fn send_frame(&mut self, frame: Frame) -> Result<()> {
        tokio::time::timeout(self.send_timeout, self.framed.send(frame))
            .await
            .map_err(|_| ProtocolError::Timeout)?
    }

    /// Wait for the next frame. A closed stream yields `ConnectionClosed`.
    pub async fn receive_frame(&mut self) -> Result<Frame> {
        match tokio::time::timeout(self.receive_timeout, self.framed.next()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => Err(ProtocolError::ConnectionClosed),
            Err(_) => Err(ProtocolError::Timeout),
        }
    }

    /// Receive a message that must be of type `M`.
    pub async fn receive<M: Message>(&mut self) -> Result<M> {
        let frame = self.receive_frame().await?;
        if frame.message_type != M::TYPE {
            debug!(expected = ?M::TYPE, received = ?frame.message_type, "Unexpected message");
        }
        frame.decode_body()
    }

    /// Send a request and wait for its reply.
    pub async fn request<Req: Message, Rep: Message>(&mut self, request: &Req) -> Result<Rep> {
        self.send(request).await?;
        self.receive().await
    }
}

impl Connection<TcpStream> {
    /// Connect to the configured matchmaking server.
    #[instrument(skip_all, fields(address = %config.address))]
    pub async fn connect(config: &ClientConfig, transport: &TransportConfig, metrics: Arc<CodecMetrics>) -> Result<Self> {
        if transport.warm_size_cache {
            warm_size_cache(&MessageType::all_body_descriptors())?;
        }

        let stream = tokio::time::timeout(config.connection_timeout, TcpStream::connect(&config.address))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        stream.set_nodelay(true)?;
        info!("Connected to matchmaking server");

        Ok(Self::client(stream, config, transport, metrics))
    }
}
