use chrono::{DateTime, Utc};
use log::{info, warn};
use thiserror::Error;

use crate::{
    channel::{UserIdentity, MEMBERSHIP_PREFIXES},
    irc::{ClientMessage, Message, Source},
    state::ClientState,
    triggers::Triggers,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandleErr {
    /// no handler for this command. reported to the caller, never fatal to the
    /// ingestion loop.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{0} message had no source")]
    MissingSource(&'static str),
    #[error("{0} message is missing argument {1}")]
    MissingArg(&'static str, usize),
    #[error("could not parse unix timestamp: {0}")]
    BadTimestamp(String),
}

/// the protocol events the client acts on. resolving a command name into this
/// closed set means the dispatch match below is checked for exhaustiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Welcome,
    MotdStart,
    Motd,
    EndOfMotd,
    UmodeIs,
    Ping,
    Join,
    NamesReply,
    EndOfNames,
    Privmsg,
    Topic,
    TopicReply,
    NoTopic,
    TopicWhoTime,
    Part,
    Quit,
    Nick,
    Mode,
    Kick,
}

impl Event {
    fn from_name(name: &str) -> Option<Event> {
        let event = match name {
            "RPL_WELCOME" => Event::Welcome,
            "RPL_MOTDSTART" => Event::MotdStart,
            "RPL_MOTD" => Event::Motd,
            "RPL_ENDOFMOTD" => Event::EndOfMotd,
            "RPL_UMODEIS" => Event::UmodeIs,
            "PING" => Event::Ping,
            "JOIN" => Event::Join,
            "RPL_NAMREPLY" => Event::NamesReply,
            "RPL_ENDOFNAMES" => Event::EndOfNames,
            "PRIVMSG" => Event::Privmsg,
            "TOPIC" => Event::Topic,
            "RPL_TOPIC" => Event::TopicReply,
            "RPL_NOTOPIC" => Event::NoTopic,
            "RPL_TOPICWHOTIME" => Event::TopicWhoTime,
            "PART" => Event::Part,
            "QUIT" => Event::Quit,
            "NICK" => Event::Nick,
            "MODE" => Event::Mode,
            "KICK" => Event::Kick,
            _ => return None,
        };
        Some(event)
    }
}

/// dispatches decoded messages into session state mutations. handlers never write
/// to the connection themselves; they return the messages to send so the caller
/// owns the single write path.
pub struct Handler {
    triggers: Triggers,
    /// the channel to join once the end-of-MOTD banner arrives
    autojoin: String,
}

impl Handler {
    pub fn new(triggers: Triggers, autojoin: impl Into<String>) -> Self {
        Self {
            triggers,
            autojoin: autojoin.into(),
        }
    }

    /// applies one message to the session state, returning the outbound messages
    /// it provoked. every error here is local to this one message.
    pub fn handle(
        &self,
        state: &mut ClientState,
        msg: &Message,
    ) -> Result<Vec<ClientMessage>, HandleErr> {
        let name = msg.command_name();
        let Some(event) = Event::from_name(name) else {
            return Err(HandleErr::UnknownCommand(name.to_string()));
        };

        match event {
            Event::Welcome => {
                info!("WELCOME");
                Ok(vec![])
            }
            Event::MotdStart => {
                state.motd.clear();
                Ok(vec![])
            }
            Event::Motd => {
                state.motd.push(motd_line(msg));
                Ok(vec![])
            }
            Event::EndOfMotd => Ok(vec![ClientMessage::Join(self.autojoin.clone())]),
            Event::UmodeIs => {
                let nick = arg(msg, "RPL_UMODEIS", 0)?;
                state.me = UserIdentity::from_nick(nick);
                state.user_modes = arg(msg, "RPL_UMODEIS", 1)?.to_string();
                Ok(vec![])
            }
            Event::Ping => {
                let token = arg(msg, "PING", 0)?;
                Ok(vec![ClientMessage::Pong(token.to_string())])
            }
            Event::Join => self.handle_join(state, msg),
            Event::NamesReply => self.handle_names_reply(state, msg),
            Event::EndOfNames => {
                let name = arg(msg, "RPL_ENDOFNAMES", 1)?.to_string();
                // re-arm the reset for the next names sequence; the terminator
                // itself carries no membership data
                state.channel_entry(&name).should_reset_names = true;
                Ok(vec![])
            }
            Event::Privmsg => self.handle_privmsg(state, msg),
            Event::Topic => {
                let name = target(msg, "TOPIC")?.to_string();
                let topic = msg.trailing.clone().unwrap_or_default();
                set_topic(state, &name, topic, Utc::now());
                Ok(vec![])
            }
            Event::TopicReply => {
                let name = arg(msg, "RPL_TOPIC", 1)?.to_string();
                let topic = msg.trailing.clone().unwrap_or_default();
                set_topic(state, &name, topic, Utc::now());
                Ok(vec![])
            }
            Event::NoTopic => {
                let name = arg(msg, "RPL_NOTOPIC", 1)?.to_string();
                set_topic(state, &name, String::new(), Utc::now());
                Ok(vec![])
            }
            Event::TopicWhoTime => self.handle_topic_who_time(state, msg),
            Event::Part => self.handle_part(state, msg),
            Event::Quit => {
                let source = source(msg, "QUIT")?;
                let nick = source.nick.clone();
                // users can be in several channels at once. channels are never
                // deleted here, even if they end up empty
                for channel in state.channels_mut() {
                    channel.remove_user(&nick);
                }
                Ok(vec![])
            }
            Event::Nick => self.handle_nick(state, msg),
            Event::Mode => self.handle_mode(state, msg),
            Event::Kick => self.handle_kick(state, msg),
        }
    }

    fn handle_join(
        &self,
        state: &mut ClientState,
        msg: &Message,
    ) -> Result<Vec<ClientMessage>, HandleErr> {
        let source = source(msg, "JOIN")?;
        let user = UserIdentity::from(source);
        let name = target(msg, "JOIN")?.to_string();

        let ours = user.nick == state.me.nick;
        if state.channel(&name).is_none() && !ours {
            warn!("channel not found: {}", name);
        }

        let channel = state.ensure_channel(&name);
        channel.add_user(user);
        // a fresh names sequence follows a join; make its first reply replace
        // whatever roster we have
        channel.should_reset_names = true;

        if ours {
            info!("joined channel {}", name);
        }
        Ok(vec![])
    }

    fn handle_names_reply(
        &self,
        state: &mut ClientState,
        msg: &Message,
    ) -> Result<Vec<ClientMessage>, HandleErr> {
        // 353 args: <client> <symbol> <channel> :nick nick ...
        let name = arg(msg, "RPL_NAMREPLY", 2)?.to_string();
        let channel = state.channel_entry(&name);

        if channel.should_reset_names {
            channel.users.clear();
            channel.should_reset_names = false;
        }

        let names = msg.trailing.as_deref().unwrap_or_default();
        for nick in names.split_whitespace() {
            let nick = nick.trim_start_matches(MEMBERSHIP_PREFIXES);
            channel.add_user(UserIdentity::from_nick(nick));
        }
        Ok(vec![])
    }

    fn handle_privmsg(
        &self,
        state: &mut ClientState,
        msg: &Message,
    ) -> Result<Vec<ClientMessage>, HandleErr> {
        let target = target(msg, "PRIVMSG")?.to_string();
        if !target.starts_with('#') {
            // private message, nothing to track
            return Ok(vec![]);
        }

        let from = msg.source.as_ref().map(|s| s.nick.clone()).unwrap_or_default();
        let body = msg.trailing.clone().unwrap_or_default();

        let channel = state.channel_entry(&target);
        channel.add_message(msg.raw.clone());
        info!("message in {} from {}: {}", target, from, body);

        let mut out = Vec::new();
        if let Some(word) = body.split_whitespace().next() {
            if let Some(reply) = self.triggers.reply_for(word, channel) {
                out.push(ClientMessage::Privmsg { target, msg: reply });
            }
        }
        Ok(out)
    }

    fn handle_topic_who_time(
        &self,
        state: &mut ClientState,
        msg: &Message,
    ) -> Result<Vec<ClientMessage>, HandleErr> {
        // 333 args: <client> <channel> <nick> <setat>
        let name = arg(msg, "RPL_TOPICWHOTIME", 1)?.to_string();
        let who = arg(msg, "RPL_TOPICWHOTIME", 2)?.to_string();
        let stamp = arg(msg, "RPL_TOPICWHOTIME", 3)?;

        let seconds: i64 = stamp
            .parse()
            .map_err(|_| HandleErr::BadTimestamp(stamp.to_string()))?;
        let time: DateTime<Utc> = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| HandleErr::BadTimestamp(stamp.to_string()))?;

        // authoritative over the wall-clock stamp guessed when the topic arrived
        let channel = state.channel_entry(&name);
        channel.topic_change_time = Some(time);
        channel.topic_change_by = who;
        Ok(vec![])
    }

    fn handle_part(
        &self,
        state: &mut ClientState,
        msg: &Message,
    ) -> Result<Vec<ClientMessage>, HandleErr> {
        let source = source(msg, "PART")?;
        let nick = source.nick.clone();
        let name = target(msg, "PART")?.to_string();

        state.channel_entry(&name).remove_user(&nick);

        if nick == state.me.nick {
            info!("left channel {}", name);
            state.remove_channel(&name);
        }
        Ok(vec![])
    }

    fn handle_nick(
        &self,
        state: &mut ClientState,
        msg: &Message,
    ) -> Result<Vec<ClientMessage>, HandleErr> {
        let source = source(msg, "NICK")?;
        let old = source.nick.clone();
        let new = arg(msg, "NICK", 0)?.to_string();

        for channel in state.channels_mut() {
            channel.rename_user(&old, &new);
        }
        if old == state.me.nick {
            state.me.nick = new;
        }
        Ok(vec![])
    }

    fn handle_mode(
        &self,
        state: &mut ClientState,
        msg: &Message,
    ) -> Result<Vec<ClientMessage>, HandleErr> {
        let target = target(msg, "MODE")?.to_string();
        if !target.starts_with('#') {
            // user mode change, no channel state involved
            return Ok(vec![]);
        }

        let modes = msg.args.get(1..).unwrap_or_default().join(" ");
        state.channel_entry(&target).modes = modes;
        Ok(vec![])
    }

    fn handle_kick(
        &self,
        state: &mut ClientState,
        msg: &Message,
    ) -> Result<Vec<ClientMessage>, HandleErr> {
        let name = target(msg, "KICK")?.to_string();
        let kicked = arg(msg, "KICK", 1)?.to_string();

        state.channel_entry(&name).remove_user(&kicked);

        if kicked == state.me.nick {
            info!("kicked from channel {}", name);
            state.remove_channel(&name);
        }
        Ok(vec![])
    }
}

fn source<'a>(msg: &'a Message, what: &'static str) -> Result<&'a Source, HandleErr> {
    msg.source.as_ref().ok_or(HandleErr::MissingSource(what))
}

fn arg<'a>(msg: &'a Message, what: &'static str, idx: usize) -> Result<&'a str, HandleErr> {
    msg.args
        .get(idx)
        .map(String::as_str)
        .ok_or(HandleErr::MissingArg(what, idx))
}

/// the extracted target, falling back to the first argument for servers that send
/// it as a trailing parameter (`JOIN :#chan`).
fn target<'a>(msg: &'a Message, what: &'static str) -> Result<&'a str, HandleErr> {
    msg.target
        .as_deref()
        .or_else(|| msg.args.first().map(String::as_str))
        .ok_or(HandleErr::MissingArg(what, 0))
}

/// RPL_MOTD carries the banner line as the trailing parameter; be lenient about
/// servers that tokenize it.
fn motd_line(msg: &Message) -> String {
    match &msg.trailing {
        Some(line) => line.clone(),
        None => msg.args.get(1..).unwrap_or_default().join(" "),
    }
}

fn set_topic(state: &mut ClientState, name: &str, topic: String, now: DateTime<Utc>) {
    let channel = state.channel_entry(name);
    channel.topic = topic;
    channel.topic_change_time = Some(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn handler() -> Handler {
        Handler::new(Triggers::standard(), "#gral.irc")
    }

    fn apply(handler: &Handler, state: &mut ClientState, line: &str) -> Vec<ClientMessage> {
        let msg = Message::parse(line).unwrap();
        handler.handle(state, &msg).unwrap()
    }

    #[test]
    fn ping_replies_pong() {
        let mut state = ClientState::new("me");
        let out = apply(&handler(), &mut state, "PING :abc123");
        assert_eq!(out, vec![ClientMessage::Pong(String::from("abc123"))]);
    }

    #[test]
    fn motd_accumulates_and_end_joins() {
        let handler = handler();
        let mut state = ClientState::new("me");
        state.motd.push(String::from("stale"));

        apply(&handler, &mut state, ":srv 375 me :- srv MOTD -");
        apply(&handler, &mut state, ":srv 372 me :- line one");
        apply(&handler, &mut state, ":srv 372 me :- line two");
        assert_eq!(state.motd, vec!["- srv MOTD -", "- line one", "- line two"]);

        let out = apply(&handler, &mut state, ":srv 376 me :End of /MOTD");
        assert_eq!(out, vec![ClientMessage::Join(String::from("#gral.irc"))]);
    }

    #[test]
    fn umodeis_captures_identity() {
        let mut state = ClientState::new("requested");
        apply(&handler(), &mut state, ":srv 221 me-actual +iw");
        assert_eq!(state.me.nick, "me-actual");
        assert_eq!(state.user_modes, "+iw");
    }

    #[test]
    fn third_party_join_creates_channel() {
        let mut state = ClientState::new("me");
        apply(&handler(), &mut state, ":alice!al@h JOIN #chat");

        let channel = state.channel("#chat").unwrap();
        assert_eq!(channel.topic, "");
        assert_eq!(channel.nicks().collect::<Vec<_>>(), vec!["alice"]);
        assert!(channel.should_reset_names);
    }

    #[test]
    fn names_sequence_replaces_then_appends() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":me!u@h JOIN #x");

        apply(&handler, &mut state, ":srv 353 me = #x :alice @bob");
        apply(&handler, &mut state, ":srv 353 me = #x :carol");
        let channel = state.channel("#x").unwrap();
        assert_eq!(
            channel.nicks().collect::<Vec<_>>(),
            vec!["alice", "bob", "carol"]
        );

        // end of names re-arms the reset for the next sequence
        apply(&handler, &mut state, ":srv 366 me #x :End of /NAMES");
        apply(&handler, &mut state, ":srv 353 me = #x :dave");
        let channel = state.channel("#x").unwrap();
        assert_eq!(channel.nicks().collect::<Vec<_>>(), vec!["dave"]);
    }

    #[test]
    fn own_part_deletes_channel_other_part_does_not() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":me!u@h JOIN #chat");
        apply(&handler, &mut state, ":alice!al@h JOIN #chat");

        apply(&handler, &mut state, ":alice!al@h PART #chat :bye");
        let channel = state.channel("#chat").unwrap();
        assert_eq!(channel.nicks().collect::<Vec<_>>(), vec!["me"]);

        apply(&handler, &mut state, ":me!u@h PART #chat");
        assert!(state.channel("#chat").is_none());
    }

    #[test]
    fn kick_of_self_deletes_channel() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":me!u@h JOIN #chat");
        apply(&handler, &mut state, ":op!o@h KICK #chat me :begone");
        assert!(state.channel("#chat").is_none());
    }

    #[test]
    fn kick_of_other_removes_one_entry() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":me!u@h JOIN #chat");
        apply(&handler, &mut state, ":alice!al@h JOIN #chat");
        apply(&handler, &mut state, ":op!o@h KICK #chat alice :begone");

        let channel = state.channel("#chat").unwrap();
        assert_eq!(channel.nicks().collect::<Vec<_>>(), vec!["me"]);
    }

    #[test]
    fn quit_sweeps_every_roster_but_deletes_nothing() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":alice!al@h JOIN #one");
        apply(&handler, &mut state, ":alice!al@h JOIN #two");

        apply(&handler, &mut state, ":alice!al@h QUIT :gone");
        assert!(state.channel("#one").unwrap().users.is_empty());
        assert!(state.channel("#two").unwrap().users.is_empty());
        assert!(state.channel("#one").is_some());
    }

    #[test]
    fn nick_change_updates_all_rosters_and_self() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":me!u@h JOIN #one");
        apply(&handler, &mut state, ":me!u@h JOIN #two");

        apply(&handler, &mut state, ":me!u@h NICK :me2");
        assert_eq!(
            state.channel("#one").unwrap().nicks().collect::<Vec<_>>(),
            vec!["me2"]
        );
        assert_eq!(
            state.channel("#two").unwrap().nicks().collect::<Vec<_>>(),
            vec!["me2"]
        );
        assert_eq!(state.me.nick, "me2");
    }

    #[test]
    fn nick_change_for_other_leaves_self_alone() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":alice!al@h JOIN #one");
        apply(&handler, &mut state, ":alice!al@h NICK alicia");

        assert_eq!(
            state.channel("#one").unwrap().nicks().collect::<Vec<_>>(),
            vec!["alicia"]
        );
        assert_eq!(state.me.nick, "me");
    }

    #[test]
    fn channel_mode_overwrites_user_mode_is_noop() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":me!u@h JOIN #chat");

        apply(&handler, &mut state, ":srv MODE #chat +nt");
        assert_eq!(state.channel("#chat").unwrap().modes, "+nt");

        apply(&handler, &mut state, ":srv MODE me +i");
        assert_eq!(state.channel("#chat").unwrap().modes, "+nt");
    }

    #[test]
    fn topic_reply_stamps_now_and_whotime_overrides() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":me!u@h JOIN #chat");

        apply(&handler, &mut state, ":srv 332 me #chat :general chatter");
        let channel = state.channel("#chat").unwrap();
        assert_eq!(channel.topic, "general chatter");
        assert!(channel.topic_change_time.is_some());

        apply(&handler, &mut state, ":srv 333 me #chat alice 1700000000");
        let channel = state.channel("#chat").unwrap();
        assert_eq!(channel.topic_change_by, "alice");
        assert_eq!(
            channel.topic_change_time,
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
    }

    #[test]
    fn no_topic_clears_but_still_stamps() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":me!u@h JOIN #chat");
        apply(&handler, &mut state, ":srv 332 me #chat :old");

        apply(&handler, &mut state, ":srv 331 me #chat :No topic is set");
        let channel = state.channel("#chat").unwrap();
        assert_eq!(channel.topic, "");
        assert!(channel.topic_change_time.is_some());
    }

    #[test]
    fn channel_privmsg_records_history_and_answers_triggers() {
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":me!u@h JOIN #chat");
        apply(&handler, &mut state, ":alice!al@h JOIN #chat");
        apply(&handler, &mut state, ":srv 332 me #chat :general chatter");

        let out = apply(&handler, &mut state, ":alice!al@h PRIVMSG #chat :hi all");
        assert!(out.is_empty());
        assert_eq!(
            state.channel("#chat").unwrap().messages,
            vec![":alice!al@h PRIVMSG #chat :hi all"]
        );

        let out = apply(&handler, &mut state, ":alice!al@h PRIVMSG #chat :!topic");
        assert_eq!(
            out,
            vec![ClientMessage::Privmsg {
                target: String::from("#chat"),
                msg: String::from("Topic: general chatter"),
            }]
        );
    }

    #[test]
    fn direct_privmsg_is_ignored() {
        let handler = handler();
        let mut state = ClientState::new("me");
        let out = apply(&handler, &mut state, ":alice!al@h PRIVMSG me :psst");
        assert!(out.is_empty());
        assert!(state.channel("me").is_none());
    }

    #[test]
    fn unknown_command_is_reported() {
        let handler = handler();
        let mut state = ClientState::new("me");
        let msg = Message::parse(":srv 999 me :mystery").unwrap();
        assert_eq!(
            handler.handle(&mut state, &msg),
            Err(HandleErr::UnknownCommand(String::from("999")))
        );
    }

    #[test]
    fn event_names_missing_state_is_recovered() {
        // a topic reply for a channel we never joined creates a placeholder
        let handler = handler();
        let mut state = ClientState::new("me");
        apply(&handler, &mut state, ":srv 332 me #ghost :spooky");
        assert_eq!(state.channel("#ghost").unwrap().topic, "spooky");
    }
}
