//! Streaming, in-place line rewriter
//!
//! The rewriter scans a target file line by line, asks the liveness oracle
//! about every line that carries a tracked service label, and replaces the
//! address of stale lines without ever holding the whole file in memory.
//!
//! ## Cursor Model
//!
//! ```text
//!            write cursor           reader disk position
//!                 │                          │
//!  ┌──────────────▼──────────┬───────────────▼──────────────┐
//!  │ emitted (final content) │ buffered lines │ unread bytes │
//!  └─────────────────────────┴────────────────┴──────────────┘
//! ```
//!
//! 1. The next line is always buffered before the current one is emitted
//! 2. Once any line changed, every following line is re-written at the cursor
//! 3. A write that would end past the reader's disk position first pulls the
//!    covered bytes into memory, so the writer never overtakes the reader
//! 4. After the last line a changed file is truncated to the cursor

mod matcher;
mod reader;

pub use matcher::{AddressPattern, DEFAULT_ADDRESS_PATTERN, ServiceMatchSet};

use std::borrow::Cow;
use std::io::{self, SeekFrom};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, trace};

use crate::traits::{LivenessOracle, ProbeObserver, RewriteTarget};
use reader::LineReader;

/// What to look for and what to write during a single pass
#[derive(Debug, Clone, Copy)]
pub struct RewriteRules<'a> {
    /// Labels that make a line eligible
    pub services: &'a ServiceMatchSet,
    /// Shape of the address inside an eligible line
    pub pattern: &'a AddressPattern,
    /// Replacement for stale addresses
    pub new_address: &'a str,
    /// Virtual host the oracle validates addresses against
    pub virtual_host: &'a str,
}

/// In-place rewriter bound to a liveness oracle
///
/// # Example
///
/// ```rust,no_run
/// use hostpatch_core::{AddressPattern, RewriteRules, Rewriter, ServiceMatchSet};
/// # use hostpatch_core::LivenessOracle;
/// # async fn run(oracle: &dyn LivenessOracle) -> Result<(), Box<dyn std::error::Error>> {
/// let services = ServiceMatchSet::new(["consul"])?;
/// let pattern = AddressPattern::dotted_quad();
/// let rules = RewriteRules {
///     services: &services,
///     pattern: &pattern,
///     new_address: "10.0.0.2",
///     virtual_host: "consul.example.com",
/// };
///
/// let mut file = tokio::fs::OpenOptions::new()
///     .read(true)
///     .write(true)
///     .open("hosts")
///     .await?;
/// let changed = Rewriter::new(oracle).rewrite(&mut file, &rules).await?;
/// # let _ = changed;
/// # Ok(())
/// # }
/// ```
pub struct Rewriter<'a> {
    oracle: &'a dyn LivenessOracle,
    observer: &'a dyn ProbeObserver,
}

impl<'a> Rewriter<'a> {
    /// Create a rewriter that reports no probe progress
    pub fn new(oracle: &'a dyn LivenessOracle) -> Self {
        Self {
            oracle,
            observer: &(),
        }
    }

    /// Report probe progress to `observer`
    pub fn with_observer(mut self, observer: &'a dyn ProbeObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Rewrite `file` in place
    ///
    /// `file` must be open for reading and writing. It is read from offset 0
    /// regardless of its current position.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: at least one line was replaced
    /// - `Ok(false)`: the content is unchanged (an empty file is never touched)
    /// - `Err(io::Error)`: a read, write or truncate failed; the pass is aborted
    pub async fn rewrite<F>(&self, file: &mut F, rules: &RewriteRules<'_>) -> io::Result<bool>
    where
        F: RewriteTarget,
    {
        let mut reader = LineReader::new();

        let Some(mut current) = reader.next_line(file).await? else {
            debug!("Target is empty, nothing to rewrite");
            return Ok(false);
        };

        let mut cursor: u64 = 0;
        let mut changed = false;

        loop {
            // Buffer the next line before anything is written for this one
            let next = reader.next_line(file).await?;

            let emitted = match self.replacement_for(&current, rules).await {
                Some(line) => {
                    changed = true;
                    Cow::Owned(line)
                }
                None => Cow::Borrowed(current.as_slice()),
            };

            // Until the first replacement every byte is already in place
            if changed {
                let end = cursor + emitted.len() as u64;
                reader.read_ahead_to(file, end).await?;
                write_at(file, cursor, &emitted).await?;
            }
            cursor += emitted.len() as u64;

            match next {
                Some(line) => current = line,
                None => break,
            }
        }

        if changed {
            file.truncate(cursor).await?;
        }
        trace!(
            "Rewrite pass finished: {} bytes read, {} bytes kept (changed: {})",
            reader.disk_position(),
            cursor,
            changed
        );

        Ok(changed)
    }

    /// Replacement for `line`, or `None` when it stays as it is
    async fn replacement_for(&self, line: &[u8], rules: &RewriteRules<'_>) -> Option<Vec<u8>> {
        if !rules.services.matches(line) {
            return None;
        }

        let Some(address) = rules.pattern.find(line) else {
            debug!("Eligible line carries no address, leaving it untouched");
            return None;
        };

        self.observer.probe_started(&address, rules.virtual_host);
        let stale = self.oracle.is_stale(&address, rules.virtual_host).await;
        self.observer
            .probe_finished(&address, rules.virtual_host, stale);

        if !stale {
            return None;
        }

        debug!("Replacing stale address {} with {}", address, rules.new_address);
        Some(rules.pattern.replace_all(line, rules.new_address))
    }
}

async fn write_at<F>(file: &mut F, offset: u64, bytes: &[u8]) -> io::Result<()>
where
    F: RewriteTarget,
{
    file.seek(SeekFrom::Start(offset)).await?;
    file.write_all(bytes).await?;
    file.flush().await
}
