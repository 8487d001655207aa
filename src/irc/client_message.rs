use core::fmt::Display;

/// an outbound message built by the client. formatting only, the sender is
/// responsible for the actual write.
// not every command has a caller yet
#[allow(unused)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Pass(String),
    Nick(String),
    User {
        username: String,
        realname: String,
    },
    Join(String),
    Part(String),
    Pong(String),
    Privmsg {
        target: String,
        msg: String,
    },
    Kick {
        channel: String,
        user: String,
        comment: String,
    },
    Mode {
        target: String,
        mode: String,
    },
    Quit,
    /// send the given text directly, for commands without a nicer interface
    Raw(String),
}

impl ClientMessage {
    /// renders the command as a wire line, including the trailing CRLF.
    pub fn irc_str(&self) -> String {
        let mut s = match self {
            ClientMessage::Pass(pass) => format!("PASS {}", pass),
            ClientMessage::Nick(nick) => format!("NICK {}", nick),
            ClientMessage::User { username, realname } => {
                format!("USER {} 0 * :{}", username, realname)
            }
            ClientMessage::Join(channel) => format!("JOIN {}", channel),
            ClientMessage::Part(channel) => format!("PART {}", channel),
            ClientMessage::Pong(token) => format!("PONG {}", token),
            ClientMessage::Privmsg { target, msg } => format!("PRIVMSG {} :{}", target, msg),
            ClientMessage::Kick {
                channel,
                user,
                comment,
            } => format!("KICK {} {} :{}", channel, user, comment),
            ClientMessage::Mode { target, mode } => format!("MODE {} {}", target, mode),
            ClientMessage::Quit => String::from("QUIT"),
            ClientMessage::Raw(text) => text.clone(),
        };
        s.push_str("\r\n");
        s
    }
}

impl Display for ClientMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.irc_str();
        // no CRLF in log output
        write!(f, "{}", &s[..s.len() - 2])
    }
}
