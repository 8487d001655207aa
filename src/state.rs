use core::fmt;

use indexmap::IndexMap;
use log::warn;

use crate::channel::{Channel, UserIdentity};

/// the client-visible session model. single-owner: the only writer is the dispatch
/// path driven by the ingestion loop, so no interior locking lives here. anything
/// that shares this with another thread wraps the whole handle-and-mutate step in
/// one mutex.
pub struct ClientState {
    /// our own identity as confirmed by the server. the nick requested at
    /// registration until RPL_UMODEIS says otherwise.
    pub me: UserIdentity,
    pub user_modes: String,
    /// the message-of-the-day banner, accumulated across the MOTD reply sequence
    pub motd: Vec<String>,
    channels: IndexMap<String, Channel>,
}

impl ClientState {
    pub fn new(requested_nick: impl Into<String>) -> Self {
        Self {
            me: UserIdentity::from_nick(requested_nick),
            user_modes: String::new(),
            motd: Vec::new(),
            channels: IndexMap::new(),
        }
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// looks up a channel, creating an empty record when the server references one
    /// we have no entry for. idempotent; the creation case is an anomaly worth
    /// reporting but never fatal.
    pub fn channel_entry(&mut self, name: &str) -> &mut Channel {
        if !self.channels.contains_key(name) {
            warn!("channel not found, creating: {}", name);
        }
        self.channels
            .entry(name.to_string())
            .or_insert_with(|| Channel::new(name))
    }

    /// inserts a channel record without the not-found warning. used by JOIN, where
    /// first reference is the expected case.
    pub fn ensure_channel(&mut self, name: &str) -> &mut Channel {
        self.channels
            .entry(name.to_string())
            .or_insert_with(|| Channel::new(name))
    }

    /// drops the channel record entirely. only the client leaving (part or kick)
    /// takes this path.
    pub fn remove_channel(&mut self, name: &str) -> Option<Channel> {
        self.channels.shift_remove(name)
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels.values_mut()
    }
}

impl fmt::Debug for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientState")
            .field("me", &self.me)
            .field("user_modes", &self.user_modes)
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
