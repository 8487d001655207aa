use chrono::{DateTime, Utc};

use crate::irc::Source;

/// sigils a server may prepend to a nick in a names reply (owner, protected, op,
/// halfop, voice)
pub const MEMBERSHIP_PREFIXES: &[char] = &['~', '&', '@', '%', '+'];

/// a protocol participant. roster bookkeeping compares by nick only, since
/// membership events do not always carry the user and host parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserIdentity {
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl UserIdentity {
    pub fn from_nick(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            ..Self::default()
        }
    }
}

impl From<&Source> for UserIdentity {
    fn from(source: &Source) -> Self {
        Self {
            nick: source.nick.clone(),
            user: source.user.clone(),
            host: source.host.clone(),
        }
    }
}

/// everything the client tracks about one channel it knows of. created on first
/// reference from any channel-scoped event, deleted only when the client itself
/// parts or is kicked.
#[derive(Debug)]
pub struct Channel {
    name: String,
    /// the mode string as last reported by the server, opaque to the client
    pub modes: String,
    pub topic: String,
    pub topic_change_time: Option<DateTime<Utc>>,
    pub topic_change_by: String,
    /// channel message history, append-only
    pub messages: Vec<String>,
    /// the roster, in arrival order. nicks are unique by convention but duplicates
    /// may transiently occur; the names sync below is what corrects them.
    pub users: Vec<UserIdentity>,
    /// armed when the next RPL_NAMREPLY must replace the roster instead of
    /// appending to it
    pub should_reset_names: bool,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modes: String::new(),
            topic: String::new(),
            topic_change_time: None,
            topic_change_by: String::new(),
            messages: Vec::new(),
            users: Vec::new(),
            should_reset_names: false,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn add_message(&mut self, msg: impl Into<String>) {
        self.messages.push(msg.into());
    }

    pub fn add_user(&mut self, user: UserIdentity) {
        self.users.push(user);
    }

    /// removes the first roster entry with the given nick. exactly one entry is
    /// removed per event even if duplicates exist.
    pub fn remove_user(&mut self, nick: &str) -> bool {
        match self.users.iter().position(|u| u.nick == nick) {
            Some(idx) => {
                self.users.remove(idx);
                true
            }
            None => false,
        }
    }

    /// rewrites every roster entry matching `old` to carry the new nick.
    pub fn rename_user(&mut self, old: &str, new: &str) {
        for user in self.users.iter_mut().filter(|u| u.nick == old) {
            user.nick = new.to_string();
        }
    }

    pub fn nicks(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(|u| u.nick.as_str())
    }
}
