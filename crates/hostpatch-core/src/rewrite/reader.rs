//! Positional line reader sharing a handle with an in-place writer
//!
//! The reader keeps its own disk offset and seeks before every fill, so the
//! writer is free to move the handle's position between reads. Bytes are
//! only taken from disk once; everything at or past [`LineReader::disk_position`]
//! is still unread on disk and must not be overwritten.

use std::io::{self, SeekFrom};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Size of a single read from the backing store
const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Default)]
pub(crate) struct LineReader {
    /// Bytes read from disk but not yet handed out as lines
    buf: Vec<u8>,
    /// Start of the unconsumed region of `buf`
    start: usize,
    /// Next offset to read from the backing store
    disk_pos: u64,
    /// The backing store returned end-of-file
    eof: bool,
}

impl LineReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Offset of the first byte not yet pulled from the backing store
    pub(crate) fn disk_position(&self) -> u64 {
        self.disk_pos
    }

    /// Next line including its trailing newline (none on a final unterminated line)
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    pub(crate) async fn next_line<F>(&mut self, file: &mut F) -> io::Result<Option<Vec<u8>>>
    where
        F: AsyncRead + AsyncSeek + Unpin,
    {
        // Bytes of the unconsumed region already known to hold no newline
        let mut scanned = 0;

        loop {
            let pending = &self.buf[self.start..];
            if let Some(i) = pending[scanned..].iter().position(|&b| b == b'\n') {
                let end = self.start + scanned + i + 1;
                let line = self.buf[self.start..end].to_vec();
                self.start = end;
                return Ok(Some(line));
            }
            scanned = pending.len();

            if self.eof {
                if pending.is_empty() {
                    return Ok(None);
                }
                let line = pending.to_vec();
                self.start = self.buf.len();
                return Ok(Some(line));
            }

            self.fill(file).await?;
        }
    }

    /// Pull bytes from disk until everything below `offset` is in memory
    ///
    /// Stops early at end-of-file.
    pub(crate) async fn read_ahead_to<F>(&mut self, file: &mut F, offset: u64) -> io::Result<()>
    where
        F: AsyncRead + AsyncSeek + Unpin,
    {
        while !self.eof && self.disk_pos < offset {
            self.fill(file).await?;
        }
        Ok(())
    }

    async fn fill<F>(&mut self, file: &mut F) -> io::Result<()>
    where
        F: AsyncRead + AsyncSeek + Unpin,
    {
        self.buf.drain(..self.start);
        self.start = 0;

        let filled = self.buf.len();
        self.buf.resize(filled + READ_CHUNK, 0);

        let read = read_at(file, self.disk_pos, &mut self.buf[filled..]).await;

        match read {
            Ok(n) => {
                self.buf.truncate(filled + n);
                if n == 0 {
                    self.eof = true;
                } else {
                    self.disk_pos += n as u64;
                }
                Ok(())
            }
            Err(e) => {
                self.buf.truncate(filled);
                Err(e)
            }
        }
    }
}

async fn read_at<F>(file: &mut F, offset: u64, buf: &mut [u8]) -> io::Result<usize>
where
    F: AsyncRead + AsyncSeek + Unpin,
{
    file.seek(SeekFrom::Start(offset)).await?;
    loop {
        match file.read(buf).await {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
