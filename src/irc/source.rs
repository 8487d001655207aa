use core::fmt::Display;

/// the sender prefix of a message, decomposed into its parts. `user` and `host` are
/// empty when the prefix does not carry them, which is common for server prefixes
/// and some membership events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Source {
    pub raw: String,
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl Source {
    /// parses a `nick!user@host` prefix. a prefix without `!` may still be
    /// `nick@host`, and one with neither separator is just a nick.
    pub fn parse(s: &str) -> Source {
        let mut source = Source {
            raw: s.to_string(),
            ..Source::default()
        };

        match s.split_once('!') {
            Some((nick, rest)) => {
                source.nick = nick.to_string();
                match rest.split_once('@') {
                    Some((user, host)) => {
                        source.user = user.to_string();
                        source.host = host.to_string();
                    }
                    None => source.user = rest.to_string(),
                }
            }
            None => match s.split_once('@') {
                Some((nick, host)) => {
                    source.nick = nick.to_string();
                    source.host = host.to_string();
                }
                None => source.nick = s.to_string(),
            },
        }

        source
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_prefix() {
        let source = Source::parse("alice!al@host.example");
        assert_eq!(source.nick, "alice");
        assert_eq!(source.user, "al");
        assert_eq!(source.host, "host.example");
        assert_eq!(source.raw, "alice!al@host.example");
    }

    #[test]
    fn nick_and_host_only() {
        let source = Source::parse("alice@host.example");
        assert_eq!(source.nick, "alice");
        assert_eq!(source.user, "");
        assert_eq!(source.host, "host.example");
    }

    #[test]
    fn bare_nick() {
        let source = Source::parse("irc.example.net");
        assert_eq!(source.nick, "irc.example.net");
        assert_eq!(source.user, "");
        assert_eq!(source.host, "");
    }
}
