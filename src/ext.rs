use std::io;

pub trait StrExt {
    fn split_prefix(&self, c: char) -> Option<(char, &str)>;
}

impl StrExt for str {
    fn split_prefix(&self, c: char) -> Option<(char, &str)> {
        if self.starts_with(c) {
            Some((c, &self[1..]))
        } else {
            None
        }
    }
}

/// the stream the client talks through. connection setup is the caller's problem,
/// the client only ever reads and writes.
pub trait ReadWrite: io::Read + io::Write {}

impl<T: io::Read + io::Write> ReadWrite for T {}
