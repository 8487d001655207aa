use std::{io, net::TcpStream};

use log::warn;
use thiserror::Error;

use crate::{
    handlers::Handler,
    irc::ClientMessage,
    net::server_io::{MessagePollErr, ServerIo},
    state::ClientState,
    triggers::Triggers,
};

#[derive(Debug, Error)]
pub enum ExitReason {
    #[error(transparent)]
    Poll(#[from] MessagePollErr),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: String,
    pub nick: String,
    pub realname: String,
    pub password: String,
    /// joined automatically once the end-of-MOTD banner arrives
    pub channel: String,
}

/// connects, registers, and runs the ingestion loop until the transport fails.
/// there is exactly one reader and one writer; all state mutation happens on this
/// path, strictly in arrival order.
pub fn start(config: &Config) -> Result<(), ExitReason> {
    let stream = TcpStream::connect(config.addr.as_str())?;
    let mut connection = ServerIo::new(Box::new(stream));

    let mut state = ClientState::new(config.nick.as_str());
    let handler = Handler::new(Triggers::standard(), config.channel.as_str());

    connection.write(&ClientMessage::Pass(config.password.clone()))?;
    connection.write(&ClientMessage::Nick(config.nick.clone()))?;
    connection.write(&ClientMessage::User {
        username: config.nick.clone(),
        realname: config.realname.clone(),
    })?;

    loop {
        // a read failure is terminal for the loop; everything below it is local to
        // the one message that caused it
        let msgs = connection.recv()?;

        for msg in msgs {
            match handler.handle(&mut state, &msg) {
                Ok(sends) => {
                    // reactive sends (PONG and friends) go out before the next
                    // message is even looked at
                    for out in sends {
                        connection.write(&out)?;
                    }
                }
                Err(e) => {
                    warn!("error handling message: {}: {:?}", e, msg.raw);
                    continue;
                }
            }
        }
    }
}
