use crate::core::codec::Frame;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::message::{Message, MessageType};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type HandlerFn = dyn Fn(&Frame) -> Result<Frame> + Send + Sync + 'static;

/// Routes request frames to typed handlers by message type.
///
/// A handler receives the deserialized request body and returns the reply
/// message, which is serialized back into a frame.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<MessageType, Box<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register the handler for `Req`, replacing any previous one.
    pub fn register<Req, Rep, F>(&self, handler: F) -> Result<()>
    where
        Req: Message,
        Rep: Message,
        F: Fn(Req) -> Result<Rep> + Send + Sync + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string()))?;

        let wrapped = move |frame: &Frame| -> Result<Frame> {
            let request = frame.decode_body::<Req>()?;
            let reply = handler(request)?;
            Frame::from_message(&reply)
        };
        handlers.insert(Req::TYPE, Box::new(wrapped));
        debug!(message_type = ?Req::TYPE, reply_type = ?Rep::TYPE, "Registered handler");
        Ok(())
    }

    pub fn dispatch(&self, frame: &Frame) -> Result<Frame> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string()))?;

        handlers
            .get(&frame.message_type)
            .ok_or(ProtocolError::UnexpectedMessage)
            .and_then(|handler| handler(frame))
    }

    pub fn is_registered(&self, message_type: MessageType) -> Result<bool> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string()))?;
        Ok(handlers.contains_key(&message_type))
    }
}
