use std::{
    cmp::{max, min},
    io::{self, BufReader, Read},
    ops,
};

use super::{Error, Input};


/// The initial size of the buffer in bytes.
const START_BUFFER_SIZE: usize = 1024;

/// The maximum size the internal buffer can grow to. Each "piece" of
/// information in a file (a header line, a value) is usually very small. The
/// internal buffer is only used to offer a byte slice for parsing one such
/// entity, so if a parser requests more than this, either the file is
/// degenerated or the parser has a bug.
const MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;


/// A parse buffer on top of an `io::Read` source that implements `Input`.
pub(crate) struct Buffer<R: Read> {
    buf: Vec<u8>,
    reader: BufReader<R>,
    start: usize,
    end: usize,
    consumed_total: usize,
}

impl<R: Read> Buffer<R> {
    pub(crate) fn new(reader: R) -> Result<Self, Error> {
        let mut out = Self {
            buf: vec![0; START_BUFFER_SIZE],
            reader: BufReader::new(reader),
            start: 0,
            end: 0,
            consumed_total: 0,
        };

        // Read once to prefill the buffer.
        out.fill_buf_by(1)?;

        Ok(out)
    }

    fn cap(&self) -> usize {
        self.buf.len()
    }

    /// Tries to read `additional` new bytes into the buffer, starting at
    /// `self.end`, growing or compacting the buffer as necessary. Returns
    /// `false` if the reader was exhausted before that many bytes could be
    /// read.
    fn fill_buf_by(&mut self, additional: usize) -> Result<bool, Error> {
        let len = self.end - self.start;
        let space_after = self.cap() - self.end;
        let space_before = self.start;

        // If we still have enough buffer space left at the end, we can just
        // read new data. If not, we either move the data to the beginning of
        // the buffer or grow the buffer. We don't move data that takes up
        // half the buffer or more: alternating small and large reads would
        // otherwise copy the same bytes over and over.
        if space_after < additional {
            if space_after + space_before >= additional && len < self.cap() / 2 {
                self.buf.copy_within(self.start..self.end, 0);
            } else {
                if len + additional > MAX_BUFFER_SIZE {
                    return Err(Error::LookAheadTooBig);
                }

                // At least our current length + `additional`, but no less
                // than twice the current buffer size.
                let new_len = min(
                    max(len + additional, self.cap() * 2),
                    MAX_BUFFER_SIZE,
                );

                let mut new = Vec::with_capacity(new_len);
                new.extend_from_slice(&self.buf[self.start..self.end]);
                new.resize(new_len, 0);
                self.buf = new;
            }

            // In both cases, the data starts at the very beginning now.
            self.end -= self.start;
            self.start = 0;
        }

        // Read new data until we have read `additional` many bytes. We ignore
        // `Interrupted` errors and just continue.
        let mut bytes_read = 0;
        while bytes_read < additional {
            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    bytes_read += n;
                    self.end += n;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(true)
    }
}

impl<R: Read> ops::Deref for Buffer<R> {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.buf[self.start..self.end]
    }
}

impl<R: Read> Input for Buffer<R> {
    fn prepare(&mut self, num_bytes: usize) -> Result<(), Error> {
        self.saturating_prepare(num_bytes)?;
        if self.len() < num_bytes {
            return Err(Error::UnexpectedEof(self.consumed_total + self.len()));
        }

        Ok(())
    }

    fn saturating_prepare(&mut self, num_bytes: usize) -> Result<(), Error> {
        if self.len() < num_bytes {
            let diff = num_bytes - self.len();
            self.fill_buf_by(diff)?;
        }

        Ok(())
    }

    fn consume(&mut self, num_bytes: usize) {
        assert!(self.start + num_bytes <= self.end);

        self.start += num_bytes;
        self.consumed_total += num_bytes;

        // If we consumed all the data, we set both indices to 0.
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
    }

    fn offset(&self) -> usize {
        self.consumed_total
    }
}
