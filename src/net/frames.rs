use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameErr {
    /// fed an empty chunk while holding no leftover bytes. expected at stream start,
    /// callers treat it as "nothing to process".
    #[error("empty input")]
    EmptyInput,
}

/// reassembles CRLF-delimited frames from a stream that arrives in arbitrarily
/// sized chunks. the only state is the unconsumed tail of the previous chunk.
#[derive(Default)]
pub struct FrameBuffer {
    rest: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self { rest: Vec::new() }
    }

    /// appends `chunk` to the held remainder and splits out every complete frame, in
    /// arrival order. bytes after the last CRLF are held until the next call and are
    /// never returned as a frame. a zero-length span between two consecutive
    /// delimiters is dropped.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, FrameErr> {
        if chunk.is_empty() && self.rest.is_empty() {
            return Err(FrameErr::EmptyInput);
        }

        self.rest.extend_from_slice(chunk);

        let mut frames = Vec::new();
        // working at the byte level means a CRLF split across two chunks needs no
        // special handling, the CR just sits in `rest` until its LF shows up
        while let Some(idx) = self.rest.windows(2).position(|w| w == b"\r\n") {
            if idx > 0 {
                frames.push(String::from_utf8_lossy(&self.rest[..idx]).into_owned());
            }
            self.rest.drain(..idx + 2);
        }

        Ok(frames)
    }

    /// the bytes held over for the next call.
    pub fn pending(&self) -> &[u8] {
        self.rest.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_stream_in_one_chunk() {
        let mut buf = FrameBuffer::new();
        let frames = buf.feed(b"A\r\nB\r\nC").unwrap();
        assert_eq!(frames, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(buf.pending(), b"C");
    }

    #[test]
    fn chunking_does_not_change_frames() {
        let mut buf = FrameBuffer::new();
        let mut frames = buf.feed(b"A\r").unwrap();
        assert!(frames.is_empty());
        frames.extend(buf.feed(b"\nB\r\nC").unwrap());
        assert_eq!(frames, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(buf.pending(), b"C");
    }

    #[test]
    fn crlf_split_across_chunk_boundary() {
        let mut buf = FrameBuffer::new();
        assert!(buf.feed(b"PING tok\r").unwrap().is_empty());
        assert_eq!(buf.feed(b"\n").unwrap(), vec!["PING tok".to_string()]);
        assert_eq!(buf.pending(), b"");
    }

    #[test]
    fn empty_chunk_without_remainder_is_empty_input() {
        let mut buf = FrameBuffer::new();
        assert_eq!(buf.feed(b""), Err(FrameErr::EmptyInput));
    }

    #[test]
    fn empty_chunk_with_remainder_is_fine() {
        let mut buf = FrameBuffer::new();
        assert!(buf.feed(b"partial").unwrap().is_empty());
        assert!(buf.feed(b"").unwrap().is_empty());
        assert_eq!(buf.pending(), b"partial");
    }

    #[test]
    fn empty_frames_are_dropped() {
        let mut buf = FrameBuffer::new();
        let frames = buf.feed(b"A\r\n\r\n\r\nB\r\n").unwrap();
        assert_eq!(frames, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn chunk_without_delimiter_grows_remainder() {
        let mut buf = FrameBuffer::new();
        assert!(buf.feed(b"abc").unwrap().is_empty());
        assert!(buf.feed(b"def").unwrap().is_empty());
        assert_eq!(buf.pending(), b"abcdef");
        assert_eq!(buf.feed(b"\r\n").unwrap(), vec!["abcdef".to_string()]);
    }
}
