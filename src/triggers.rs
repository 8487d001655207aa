use crate::channel::Channel;

/// one channel trigger: a literal first-word token and the reply it produces from
/// the channel it was typed in.
pub struct Trigger {
    pub word: &'static str,
    pub respond: fn(&Channel) -> String,
}

/// the table of reactive channel triggers the message handler consults. injectable
/// so the set can be swapped out without touching dispatch.
pub struct Triggers {
    triggers: Vec<Trigger>,
}

impl Triggers {
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self { triggers }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// the built-in trigger set: `!topic` and `!users`.
    pub fn standard() -> Self {
        Self::new(vec![
            Trigger {
                word: "!topic",
                respond: |channel| format!("Topic: {}", channel.topic),
            },
            Trigger {
                word: "!users",
                respond: |channel| {
                    format!("Users: {}", channel.nicks().collect::<Vec<_>>().join(", "))
                },
            },
        ])
    }

    /// the reply for a message whose first word is `word`, if any trigger matches.
    pub fn reply_for(&self, word: &str, channel: &Channel) -> Option<String> {
        self.triggers
            .iter()
            .find(|t| t.word == word)
            .map(|t| (t.respond)(channel))
    }
}
