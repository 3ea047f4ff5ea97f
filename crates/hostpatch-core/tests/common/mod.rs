//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles for the engine's collaborators
//! and helpers to run a rewrite pass against in-memory or on-disk targets.

#![allow(dead_code)]

use hostpatch_core::config::{TargetConfig, UpdaterConfig};
use hostpatch_core::error::{Error, Result};
use hostpatch_core::traits::{AddressDiscovery, LivenessOracle, RewriteTarget, VersionControl};
use hostpatch_core::{AddressPattern, RewriteRules, Rewriter, ServiceMatchSet};
use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite, ReadBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Oracle reporting a fixed set of addresses as stale
#[derive(Clone, Default)]
pub struct ScriptedOracle {
    stale: Arc<HashSet<String>>,
    probes: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedOracle {
    /// Addresses in `stale` are stale, everything else is live
    pub fn stale(stale: &[&str]) -> Self {
        Self {
            stale: Arc::new(stale.iter().map(|s| s.to_string()).collect()),
            probes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every address is live
    pub fn all_live() -> Self {
        Self::stale(&[])
    }

    /// (address, host) pairs probed so far, in order
    pub fn probes(&self) -> Vec<(String, String)> {
        self.probes.lock().unwrap().clone()
    }

    /// Number of probes so far
    pub fn probe_count(&self) -> usize {
        self.probes.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LivenessOracle for ScriptedOracle {
    async fn is_stale(&self, address: &str, host: &str) -> bool {
        self.probes
            .lock()
            .unwrap()
            .push((address.to_string(), host.to_string()));
        self.stale.contains(address)
    }

    fn oracle_name(&self) -> &'static str {
        "scripted"
    }
}

#[derive(Clone)]
enum Answer {
    Candidates(Vec<String>),
    Failure(String),
    Broken(String),
}

/// Discovery answering from a fixed command table
#[derive(Clone, Default)]
pub struct StaticDiscovery {
    answers: Arc<HashMap<String, Answer>>,
    call_count: Arc<AtomicUsize>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `command` reports `candidates`
    pub fn with_answer(mut self, command: &str, candidates: &[&str]) -> Self {
        Arc::make_mut(&mut self.answers).insert(
            command.to_string(),
            Answer::Candidates(candidates.iter().map(|s| s.to_string()).collect()),
        );
        self
    }

    /// `command` fails with `message`
    pub fn with_failure(mut self, command: &str, message: &str) -> Self {
        Arc::make_mut(&mut self.answers)
            .insert(command.to_string(), Answer::Failure(message.to_string()));
        self
    }

    /// The backend itself breaks with an I/O error while running `command`
    pub fn with_broken_backend(mut self, command: &str, message: &str) -> Self {
        Arc::make_mut(&mut self.answers)
            .insert(command.to_string(), Answer::Broken(message.to_string()));
        self
    }

    /// Number of discovery calls so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressDiscovery for StaticDiscovery {
    async fn candidates(&self, command: &str) -> Result<Vec<String>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.answers.get(command) {
            Some(Answer::Candidates(candidates)) => Ok(candidates.clone()),
            Some(Answer::Failure(message)) => Err(Error::discovery(message.clone())),
            Some(Answer::Broken(message)) => Err(Error::Io(io::Error::other(message.clone()))),
            None => Err(Error::discovery(format!("unknown command '{}'", command))),
        }
    }
}

/// Version control backend recording every operation
#[derive(Clone, Default)]
pub struct RecordingVcs {
    operations: Arc<Mutex<Vec<String>>>,
    fail_publish: bool,
}

impl RecordingVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose `publish()` fails
    pub fn failing_publish() -> Self {
        Self {
            fail_publish: true,
            ..Self::default()
        }
    }

    /// Operations so far, e.g. `["sync", "stage dev/hosts", "publish auto update"]`
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    /// Paths staged so far
    pub fn staged(&self) -> Vec<PathBuf> {
        self.operations()
            .iter()
            .filter_map(|op| op.strip_prefix("stage ").map(PathBuf::from))
            .collect()
    }

    /// Number of `publish()` calls so far
    pub fn publish_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| op.starts_with("publish"))
            .count()
    }
}

#[async_trait::async_trait]
impl VersionControl for RecordingVcs {
    async fn sync(&self) -> Result<()> {
        self.operations.lock().unwrap().push("sync".to_string());
        Ok(())
    }

    async fn stage(&self, path: &Path) -> Result<()> {
        self.operations
            .lock()
            .unwrap()
            .push(format!("stage {}", path.display()));
        Ok(())
    }

    async fn publish(&self, message: &str) -> Result<bool> {
        self.operations
            .lock()
            .unwrap()
            .push(format!("publish {}", message));
        if self.fail_publish {
            return Err(Error::vcs("push rejected"));
        }
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

/// In-memory target whose writes or truncation fail on demand
pub struct FaultyTarget {
    inner: Cursor<Vec<u8>>,
    fail_writes: bool,
    fail_truncate: bool,
    truncate_calls: usize,
}

impl FaultyTarget {
    /// Every write fails
    pub fn failing_writes(content: &[u8]) -> Self {
        Self {
            inner: Cursor::new(content.to_vec()),
            fail_writes: true,
            fail_truncate: false,
            truncate_calls: 0,
        }
    }

    /// Writes succeed, truncation fails
    pub fn failing_truncate(content: &[u8]) -> Self {
        Self {
            inner: Cursor::new(content.to_vec()),
            fail_writes: false,
            fail_truncate: true,
            truncate_calls: 0,
        }
    }

    /// Current backing bytes
    pub fn content(&self) -> &[u8] {
        self.inner.get_ref()
    }

    /// Number of `truncate()` calls so far
    pub fn truncate_calls(&self) -> usize {
        self.truncate_calls
    }
}

impl AsyncRead for FaultyTarget {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for FaultyTarget {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.fail_writes {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::StorageFull, "disk full")));
        }
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl AsyncSeek for FaultyTarget {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.inner).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.inner).poll_complete(cx)
    }
}

#[async_trait::async_trait]
impl RewriteTarget for FaultyTarget {
    async fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.truncate_calls += 1;
        if self.fail_truncate {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "truncate refused"));
        }
        self.inner.truncate(len).await
    }
}

/// Rewrite an arbitrary target with the default rules
pub async fn rewrite_target<F: RewriteTarget>(
    target: &mut F,
    labels: &[&str],
    new_address: &str,
    oracle: &dyn LivenessOracle,
) -> io::Result<bool> {
    let services = ServiceMatchSet::new(labels.iter().copied()).expect("valid labels");
    let pattern = AddressPattern::dotted_quad();
    let rules = RewriteRules {
        services: &services,
        pattern: &pattern,
        new_address,
        virtual_host: "svc.example.com",
    };

    Rewriter::new(oracle).rewrite(target, &rules).await
}

/// Rewrite `content` in memory, returning (changed, new content)
pub async fn rewrite_bytes(
    content: &[u8],
    labels: &[&str],
    new_address: &str,
    oracle: &dyn LivenessOracle,
) -> (bool, Vec<u8>) {
    let services = ServiceMatchSet::new(labels.iter().copied()).expect("valid labels");
    let pattern = AddressPattern::dotted_quad();
    let rules = RewriteRules {
        services: &services,
        pattern: &pattern,
        new_address,
        virtual_host: "svc.example.com",
    };

    let mut file = Cursor::new(content.to_vec());
    let changed = Rewriter::new(oracle)
        .rewrite(&mut file, &rules)
        .await
        .expect("in-memory rewrite succeeds");
    (changed, file.into_inner())
}

/// Rewrite the file at `path` on disk, returning whether it changed
pub async fn rewrite_file(
    path: &Path,
    labels: &[&str],
    new_address: &str,
    oracle: &dyn LivenessOracle,
) -> io::Result<bool> {
    let services = ServiceMatchSet::new(labels.iter().copied()).expect("valid labels");
    let pattern = AddressPattern::dotted_quad();
    let rules = RewriteRules {
        services: &services,
        pattern: &pattern,
        new_address,
        virtual_host: "svc.example.com",
    };

    let mut file = tokio::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .await?;
    Rewriter::new(oracle).rewrite(&mut file, &rules).await
}

/// Helper to create a config with one target per (label, file) pair
///
/// Each target's discovery command is `discover-<label>` and its host
/// `<label>.example.com`.
pub fn minimal_config(workdir: &Path, targets: &[(&str, &str)]) -> UpdaterConfig {
    let mut config = UpdaterConfig::new();
    config.workdir = Some(workdir.to_path_buf());
    config.engine.event_channel_capacity = 100;

    for (label, file) in targets {
        config = config.with_target(TargetConfig::new(
            *label,
            format!("discover-{}", label),
            *file,
            format!("{}.example.com", label),
        ));
    }
    config
}
