// # Rewrite Target Trait
//
// The rewriter reads and writes the same handle at independent offsets and
// finally cuts it to its new length. Anything that can seek, read, write and
// truncate can be rewritten in place.

use async_trait::async_trait;
use std::io::{self, Cursor};
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite, AsyncWriteExt};

/// A seekable read/write handle that can be truncated
#[async_trait]
pub trait RewriteTarget: AsyncRead + AsyncWrite + AsyncSeek + Unpin + Send {
    /// Truncate (or extend) the backing store to exactly `len` bytes
    async fn truncate(&mut self, len: u64) -> io::Result<()>;
}

#[async_trait]
impl RewriteTarget for tokio::fs::File {
    async fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.flush().await?;
        self.set_len(len).await
    }
}

/// In-memory target, used by tests and embedders
#[async_trait]
impl RewriteTarget for Cursor<Vec<u8>> {
    async fn truncate(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length exceeds usize"))?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}
