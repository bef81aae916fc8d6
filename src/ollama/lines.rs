use crate::{Error, Result};
use bytes::{Bytes, BytesMut};

pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Cuts a chunked byte stream into lines.
///
/// Chunk boundaries from the network do not line up with line boundaries, so
/// at most one partial line, of at most `max_line_bytes`, is carried between
/// calls to [`push`](Self::push). Lines end at `\n`; one trailing `\r` is
/// stripped, but a bare `\r` is not a terminator (Ollama escapes control
/// characters inside its JSON lines). Empty lines are dropped.
#[derive(Debug)]
pub struct LineSplitter {
    buffer: BytesMut,
    scanned: usize,
    max_line_bytes: usize,
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl LineSplitter {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            max_line_bytes: max_line_bytes.max(1),
        }
    }

    /// Feeds one chunk and returns every line it completed, in order.
    ///
    /// Fails once a line, complete or still partial, grows past the limit.
    /// The splitter is spent after that.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            let mut line = self.buffer.split_to(end + 1);
            line.truncate(end);
            self.scanned = 0;

            if let Some(line) = non_empty(line) {
                if line.len() > self.max_line_bytes {
                    return Err(self.overflow());
                }
                lines.push(line);
            }
        }

        if self.buffer.len() > self.max_line_bytes {
            return Err(self.overflow());
        }
        self.scanned = self.buffer.len();

        Ok(lines)
    }

    fn overflow(&mut self) -> Error {
        self.buffer = BytesMut::new();
        self.scanned = 0;
        Error::LineTooLong {
            limit: self.max_line_bytes,
        }
    }

    /// Flushes the trailing line of a stream that did not end with a newline.
    pub fn finish(&mut self) -> Option<Bytes> {
        self.scanned = 0;
        non_empty(self.buffer.split())
    }
}

fn non_empty(mut line: BytesMut) -> Option<Bytes> {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    (!line.is_empty()).then(|| line.freeze())
}
