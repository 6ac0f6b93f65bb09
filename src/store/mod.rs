// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Config store – holds the active rule set and hot-reloads it.
//!
//! The active [`RuleSet`] lives behind an [`arc_swap::ArcSwap`]: readers
//! take lock-free snapshots, and a reload publishes a *whole new* `Arc` in
//! one atomic swap. A concurrent reader therefore sees either the fully-old
//! or the fully-new rule set, never a mixture.
//!
//! Change detection comes in two flavours:
//!
//! - **poll** (default): [`ConfigStore::current`] runs a cheap staleness
//!   check (source mtime + length) on each call and reloads when the source
//!   changed;
//! - **watch**: [`ConfigStore::watch`] registers a filesystem watcher that
//!   reloads in the background, and per-request polling is switched off.
//!
//! Either way a failed reload is reported and the last-good rule set stays
//! active. Routing always has something consistent to match against.

#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::{ConfigError, FileFormat, RuleSet};
use crate::trace;

/// Staleness marker for the configuration source. Owned exclusively by the
/// store; a reload is skipped when the stamp is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourceStamp {
    modified: SystemTime,
    len: u64,
}

impl SourceStamp {
    fn probe(path: &Path) -> std::io::Result<Self> {
        let meta = fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

/// Holds the currently-active rule set and performs atomic hand-off to a
/// newly parsed one.
///
/// Stores are plain values, not ambient state: construct one per
/// configuration source and hand it to a [`Router`]. Independent stores
/// with independent rule sets coexist freely in one process.
///
/// [`Router`]: crate::router::Router
#[derive(Debug)]
pub struct ConfigStore {
    source: Option<PathBuf>,
    format: FileFormat,
    active: ArcSwap<RuleSet>,
    // Last successfully loaded stamp. The mutex also serializes reloads;
    // readers never touch it.
    loaded: Mutex<Option<SourceStamp>>,
    poll_on_read: AtomicBool,
}

impl ConfigStore {
    /// Open a store backed by a rule document on disk.
    ///
    /// Never fails: a missing, unreadable or unparseable source degrades to
    /// an empty rule set (every request then falls through to the default
    /// route) and the problem is logged. The file format is inferred from
    /// the extension, defaulting to JSON.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = FileFormat::from_extension(&path).unwrap_or(FileFormat::Json);

        let store = Self {
            source: Some(path),
            format,
            active: ArcSwap::from_pointee(RuleSet::empty()),
            loaded: Mutex::new(None),
            poll_on_read: AtomicBool::new(true),
        };

        if let Err(err) = store.reload() {
            log::warn!("initial rule set load failed: {err}; starting with an empty rule set");
        }
        store
    }

    /// Build an in-memory store with no backing file.
    ///
    /// `reload` becomes a no-op and `watch` is unavailable. Useful for
    /// embedding and for tests that need several independent rule sets.
    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            source: None,
            format: FileFormat::Json,
            active: ArcSwap::from_pointee(rules),
            loaded: Mutex::new(None),
            poll_on_read: AtomicBool::new(false),
        }
    }

    /// Snapshot of the presently active rule set.
    ///
    /// In poll mode this first runs the staleness check (and possibly a
    /// reload); a reload failure is logged and the last-good snapshot is
    /// returned. In watch mode this is a single lock-free load.
    pub fn current(&self) -> Arc<RuleSet> {
        if self.poll_on_read.load(Ordering::Relaxed) {
            if let Err(err) = self.reload() {
                log::debug!("rule set refresh failed: {err}; keeping previous rules");
            }
        }
        self.active.load_full()
    }

    /// Re-read the source and atomically swap in the new rule set.
    ///
    /// Idempotent while the source is unchanged: the stamp comparison
    /// short-circuits without re-reading or re-parsing. On a parse failure
    /// the previous rule set remains active and the error is returned.
    pub fn reload(&self) -> Result<Arc<RuleSet>, ConfigError> {
        let Some(path) = &self.source else {
            return Ok(self.active.load_full());
        };

        let stamp = SourceStamp::probe(path)?;

        let mut loaded = self
            .loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *loaded == Some(stamp) {
            return Ok(self.active.load_full());
        }

        let bytes = fs::read(path)?;
        let rules = match RuleSet::parse(&bytes, self.format) {
            Ok(rules) => Arc::new(rules),
            Err(err) => {
                let previous = self.active.load();
                log::warn!("rule set reload failed: {err}; keeping previous rules");
                trace::record(
                    previous.settings.log_file.as_deref(),
                    &format!("reload failed: {err}"),
                );
                return Err(err.into());
            }
        };

        self.active.store(Arc::clone(&rules));
        *loaded = Some(stamp);

        log::info!("rule set loaded: {} routes", rules.routes.len());
        trace::record(
            rules.settings.log_file.as_deref(),
            &format!("rule set loaded: {} routes", rules.routes.len()),
        );
        Ok(rules)
    }

    /// Switch to event-driven change detection.
    ///
    /// Registers a filesystem watcher on the source; modify and create
    /// events trigger a background [`reload`](Self::reload), and the
    /// per-request staleness check is disabled. The returned watcher must
    /// be kept alive for as long as reloads should happen.
    pub fn watch(self: &Arc<Self>) -> Result<RecommendedWatcher, ConfigError> {
        let Some(path) = self.source.clone() else {
            return Err(ConfigError::Unavailable(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "in-memory store has no source to watch",
            )));
        };

        let store = Arc::clone(self);
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    log::debug!("rule document change detected, reloading");
                    if let Err(err) = store.reload() {
                        log::warn!("rule set reload failed: {err}; keeping previous rules");
                    }
                }
                Ok(_) => {}
                Err(err) => log::warn!("rule document watch error: {err}"),
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        self.poll_on_read.store(false, Ordering::Relaxed);
        log::info!("watching rule document {}", path.display());
        Ok(watcher)
    }
}
