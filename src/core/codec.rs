//! # Frame Codec
//!
//! Tokio codec that frames matchmaking messages over a byte stream.
//!
//! ## Wire Format
//! ```text
//! [MessageType(1)] [Body(N)]
//! ```
//! `N` is not on the wire: it is the serialized size of the body schema for
//! that message type. The decoder waits until the whole body is buffered.

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

use crate::config::{TransportConfig, MAX_FRAME_SIZE};
use crate::core::reader::deserialize;
use crate::core::size::size_of;
use crate::core::writer::serialize;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::{Message, MessageHeader, MessageType};
use crate::utils::metrics::CodecMetrics;

/// A message type tag plus its raw, exactly-sized body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub message_type: MessageType,
    pub body: Bytes,
}

impl Frame {
    /// Serialize a message into a frame.
    pub fn from_message<M: Message>(message: &M) -> Result<Self> {
        Ok(Self {
            message_type: M::TYPE,
            body: Bytes::from(serialize(message)?),
        })
    }

    /// Deserialize the body as `M`, which must match the frame's type tag.
    pub fn decode_body<M: Message>(&self) -> Result<M> {
        if self.message_type != M::TYPE {
            return Err(ProtocolError::UnexpectedMessage);
        }
        deserialize(&self.body)
    }
}

/// Encoder/decoder for [`Frame`]s.
#[derive(Debug, Clone)]
pub struct MatchMakerCodec {
    max_frame_size: usize,
    metrics: Arc<CodecMetrics>,
}

impl Default for MatchMakerCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchMakerCodec {
    pub fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            metrics: Arc::new(CodecMetrics::new()),
        }
    }

    pub fn from_config(config: &TransportConfig, metrics: Arc<CodecMetrics>) -> Self {
        Self {
            max_frame_size: config.max_frame_size,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<CodecMetrics> {
        &self.metrics
    }

    fn reject(&self, err: ProtocolError) -> ProtocolError {
        self.metrics.codec_error();
        warn!(error = %err, "Rejected frame");
        err
    }
}

impl Decoder for MatchMakerCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let header_size = size_of::<MessageHeader>()?;
        if src.len() < header_size {
            return Ok(None);
        }

        let header: MessageHeader = deserialize(&src[..header_size])?;
        let message_type = MessageType::from_u8(header.message_type)
            .ok_or_else(|| self.reject(ProtocolError::UnknownMessageType(header.message_type)))?;

        let body_size = message_type.body_size()?;
        let frame_size = header_size + body_size;
        if frame_size > self.max_frame_size {
            return Err(self.reject(ProtocolError::OversizedFrame(frame_size)));
        }

        if src.len() < frame_size {
            src.reserve(frame_size - src.len());
            return Ok(None);
        }

        src.advance(header_size);
        let body = src.split_to(body_size).freeze();
        self.metrics.frame_decoded(frame_size as u64);
        trace!(?message_type, body_size, "Decoded frame");

        Ok(Some(Frame { message_type, body }))
    }
}

impl Encoder<Frame> for MatchMakerCodec {
    type Error = ProtocolError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        let expected = frame.message_type.body_size()?;
        if frame.body.len() != expected {
            return Err(self.reject(ProtocolError::SizeMismatch {
                type_name: frame.message_type.body_descriptor().name(),
                expected,
                actual: frame.body.len(),
            }));
        }

        let header = serialize(&MessageHeader::new(frame.message_type))?;
        let frame_size = header.len() + frame.body.len();
        if frame_size > self.max_frame_size {
            return Err(self.reject(ProtocolError::OversizedFrame(frame_size)));
        }

        dst.reserve(frame_size);
        dst.put_slice(&header);
        dst.put_slice(&frame.body);
        self.metrics.frame_encoded(frame_size as u64);
        trace!(message_type = ?frame.message_type, frame_size, "Encoded frame");
        Ok(())
    }
}
