use std::collections::HashMap;

use thiserror::Error;

use crate::{
    ext::StrExt as _,
    irc::{names, Source},
};

/// commands whose first parameter addresses a channel or user.
const TARGETED_COMMANDS: &[&str] = &[
    "PRIVMSG", "NOTICE", "JOIN", "PART", "MODE", "TOPIC", "INVITE", "KICK",
];

/// one decoded protocol line. constructed once per frame and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// the original line as received, delimiter already stripped
    pub raw: String,
    /// IRCv3 message tags. a tag without a value maps to the empty string.
    pub tags: HashMap<String, String>,
    pub source: Option<Source>,
    /// the upper-cased command verb or three-digit numeric, never empty
    pub command: String,
    /// the first parameter, for commands that address a channel or user
    pub target: Option<String>,
    /// all parameters in order. the trailing parameter, if any, is the last element.
    pub args: Vec<String>,
    /// the free-text final parameter, kept separately in untokenized form
    pub trailing: Option<String>,
}

impl Message {
    /// parses a single frame. the frame must contain exactly one message; trailing
    /// CR/LF remnants are stripped defensively in case a raw line is passed in.
    pub fn parse(frame: &str) -> Result<Self, MessageParseErr> {
        if frame.is_empty() {
            return Err(MessageParseErr::EmptyMessage);
        }

        let raw = frame.to_string();
        let mut s = frame.trim_end_matches(['\r', '\n']);

        // optional tags section
        let mut tags = HashMap::new();
        if let Some((_, rest)) = s.split_prefix('@') {
            // no space after the tags means the command is missing
            let Some((tag_str, rest)) = rest.split_once(' ') else {
                return Err(MessageParseErr::MissingCommand);
            };
            s = rest;

            for tag in tag_str.split(';') {
                match tag.split_once('=') {
                    Some((key, value)) => tags.insert(key.to_string(), value.to_string()),
                    None => tags.insert(tag.to_string(), String::new()),
                };
            }
        }

        // optional source section
        let source = if let Some((_, rest)) = s.split_prefix(':') {
            let Some((source, rest)) = rest.split_once(' ') else {
                return Err(MessageParseErr::MissingCommand);
            };
            s = rest;
            Some(Source::parse(source))
        } else {
            None
        };

        // the trailing parameter begins at the first ` :` and is never tokenized
        let (head, trailing) = match s.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing.to_string())),
            None => (s, None),
        };

        let mut fields = head.split_whitespace();
        let Some(command) = fields.next() else {
            return Err(MessageParseErr::MissingCommand);
        };
        let command = command.to_uppercase();

        let mut args: Vec<String> = fields.map(str::to_string).collect();

        let target = if TARGETED_COMMANDS.contains(&command.as_str()) {
            args.first().cloned()
        } else {
            None
        };

        // also append the trailing parameter so handlers can index args uniformly
        if let Some(trailing) = &trailing {
            args.push(trailing.clone());
        }

        Ok(Message {
            raw,
            tags,
            source,
            command,
            target,
            args,
            trailing,
        })
    }

    /// the symbolic name for this message's command, resolved lazily against the
    /// registry. the raw command token stays untouched on the message itself.
    pub fn command_name(&self) -> &str {
        names::symbolic(self.command.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageParseErr {
    #[error("empty message")]
    EmptyMessage,
    #[error("message is missing a command")]
    MissingCommand,
}
