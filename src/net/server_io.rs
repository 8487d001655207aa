use std::io;

use log::{debug, warn};
use thiserror::Error;

use crate::{
    ext::ReadWrite,
    irc::{ClientMessage, Message},
    net::frames::FrameBuffer,
};

// the size of the receive buffer to allocate, in bytes.
const BUFFER_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum MessagePollErr {
    #[error("the connection was closed")]
    Closed,
    #[error("polling was unsuccessful after {} retries", .0)]
    TooManyRetries(u8),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// the read and write half of the connection. reads are reassembled into frames
/// and decoded; writes are already-formatted client messages.
pub struct ServerIo {
    connection: Box<dyn ReadWrite + Send>,
    buffer: Box<[u8; BUFFER_SIZE]>,
    frames: FrameBuffer,
}

impl ServerIo {
    pub fn new(connection: Box<dyn ReadWrite + Send>) -> Self {
        Self {
            connection,
            buffer: Box::new([0_u8; BUFFER_SIZE]),
            frames: FrameBuffer::new(),
        }
    }

    pub fn write(&mut self, msg: &ClientMessage) -> io::Result<()> {
        debug!("<- {}", msg);
        self.connection.write_all(msg.irc_str().as_bytes())?;
        self.connection.flush()
    }

    /// blocks for the next chunk and returns every complete message in it.
    /// malformed frames are logged and dropped; only transport failures are
    /// returned, and they are terminal.
    pub fn recv(&mut self) -> Result<Vec<Message>, MessagePollErr> {
        const MAX_RETRIES: u8 = 5;
        let mut retry_count = 0;

        let count = loop {
            match self.connection.read(&mut *self.buffer) {
                Ok(count) => {
                    // TCP streams return Ok(0) when they have been gracefully
                    // closed by the other side
                    if count == 0 {
                        return Err(MessagePollErr::Closed);
                    }
                    break count;
                }
                Err(e) => {
                    if e.kind() != io::ErrorKind::Interrupted {
                        return Err(e.into());
                    } else if retry_count > MAX_RETRIES {
                        return Err(MessagePollErr::TooManyRetries(retry_count));
                    } else {
                        // retry on Interrupted
                        retry_count += 1;
                        continue;
                    }
                }
            }
        };

        let frames = self.frames.feed(&self.buffer[..count]).unwrap_or_default();

        let mut msgs = Vec::new();
        for frame in frames {
            debug!("-> {:?}", frame);
            match Message::parse(frame.as_str()) {
                Ok(msg) => msgs.push(msg),
                // a bad frame only costs us that one frame
                Err(e) => warn!("error parsing message: {}: {:?}", e, frame),
            }
        }

        Ok(msgs)
    }
}
