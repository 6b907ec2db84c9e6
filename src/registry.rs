//! Plugin scanning.
//!
//! A scan walks every catalog root, keeps the entries the classifier accepts,
//! and builds one [`PluginRecord`] per entry. Nothing about the filesystem is
//! fatal: missing roots, unreadable entries and broken manifests only shrink
//! or degrade the result.
//!
//! # Concurrency
//!
//! Roots are independent, so they are spread over a small pool of scoped
//! worker threads that pull root indices from a shared counter. Each worker
//! keeps its own results; they are merged once, after every worker has
//! finished, in catalog order. The final order is therefore family, then
//! root, then directory-listing order regardless of which worker ran what.
//!
//! A [`Scanner`] allows one scan at a time and refuses a second request while
//! the first is in flight. Scans can be cancelled through a [`CancelToken`].

use crate::catalog::{Catalog, CatalogRoot};
use crate::classify::{classify, Packaging};
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::metadata::Probe;
use crate::plugin::{PluginFormat, PluginRecord, RecordFields};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on worker threads when none is configured.
const DEFAULT_MAX_WORKERS: usize = 8;

/// Cooperative cancellation flag shared between a scan and its requester.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tuning knobs for a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(DEFAULT_MAX_WORKERS);
        ScanOptions { workers }
    }
}

/// The outcome of one scan. Replaces, never extends, any earlier report.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub records: Vec<PluginRecord>,
    /// Roots that existed and were listed.
    pub roots_scanned: usize,
    /// Roots that were absent or could not be listed.
    pub roots_missing: usize,
    /// Entries that looked like plugins but could not be inspected.
    pub entries_skipped: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl ScanReport {
    pub fn by_format(&self, format: PluginFormat) -> impl Iterator<Item = &PluginRecord> + '_ {
        self.records.iter().filter(move |r| r.format() == format)
    }

    pub fn count(&self, format: PluginFormat) -> usize {
        self.by_format(format).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Scans every root of `catalog` with default options.
pub fn scan(catalog: &Catalog) -> ScanReport {
    scan_with(catalog, &ScanOptions::default(), &CancelToken::new())
}

/// Scans every root of `catalog`, stopping early if `cancel` fires.
pub fn scan_with(catalog: &Catalog, options: &ScanOptions, cancel: &CancelToken) -> ScanReport {
    let started_at = Utc::now();
    let clock = Instant::now();
    let roots = catalog.roots();
    let workers = options.workers.clamp(1, roots.len().max(1));

    info!(roots = roots.len(), workers, "Starting plugin scan");

    let mut slots: Vec<Option<RootOutcome>> = (0..roots.len()).map(|_| None).collect();
    let next = AtomicUsize::new(0);

    thread::scope(|s| {
        let next = &next;
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                s.spawn(move || {
                    let mut done = Vec::new();
                    while !cancel.is_cancelled() {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(root) = roots.get(index) else {
                            break;
                        };
                        done.push((index, scan_root(root, cancel)));
                    }
                    done
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (index, outcome) in done {
                        if let Some(slot) = slots.get_mut(index) {
                            *slot = Some(outcome);
                        }
                    }
                }
                Err(_) => warn!("Scan worker panicked, its roots are omitted"),
            }
        }
    });

    let mut report = ScanReport {
        records: Vec::new(),
        roots_scanned: 0,
        roots_missing: 0,
        entries_skipped: 0,
        cancelled: cancel.is_cancelled(),
        started_at,
        elapsed: Duration::ZERO,
    };
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for outcome in slots.into_iter().flatten() {
        if outcome.missing {
            report.roots_missing += 1;
        } else {
            report.roots_scanned += 1;
        }
        report.entries_skipped += outcome.skipped;
        for record in outcome.records {
            if seen.insert(record.path().to_path_buf()) {
                report.records.push(record);
            } else {
                debug!(path = %record.path().display(), "Duplicate plugin path, keeping first");
            }
        }
    }

    report.elapsed = clock.elapsed();
    info!(
        plugins = report.records.len(),
        roots_scanned = report.roots_scanned,
        roots_missing = report.roots_missing,
        skipped = report.entries_skipped,
        cancelled = report.cancelled,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Plugin scan finished"
    );
    report
}

/// What one worker found under one root.
#[derive(Debug, Default)]
struct RootOutcome {
    records: Vec<PluginRecord>,
    missing: bool,
    skipped: usize,
}

impl RootOutcome {
    fn missing() -> Self {
        RootOutcome {
            missing: true,
            ..Default::default()
        }
    }
}

/// Scans a single root for plugins of its family.
fn scan_root(root: &CatalogRoot, cancel: &CancelToken) -> RootOutcome {
    let dir = match absolute(&root.path) {
        Ok(dir) => dir,
        Err(e) => {
            debug!(root = %root.path.display(), error = %e, "Cannot resolve root, skipping");
            return RootOutcome::missing();
        }
    };

    // Skip directories that don't exist
    if !dir.is_dir() {
        debug!(root = %dir.display(), family = root.family.label(), "Root does not exist, skipping");
        return RootOutcome::missing();
    }

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %dir.display(), error = %e, "Failed to list root, skipping");
            return RootOutcome::missing();
        }
    };

    let mut outcome = RootOutcome::default();
    for entry in entries {
        if cancel.is_cancelled() {
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(root = %dir.display(), error = %e, "Unreadable directory entry");
                outcome.skipped += 1;
                continue;
            }
        };

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            debug!(entry = ?file_name, "Entry name is not valid UTF-8, skipping");
            outcome.skipped += 1;
            continue;
        };

        let packaging = match Packaging::from_name(name) {
            Some(packaging) if root.family.admits(packaging) => packaging,
            _ => continue,
        };

        let path = entry.path();
        let Some(format) = classify(name, &path) else {
            continue;
        };

        match inspect_entry(&path, packaging, format) {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Failed to inspect entry, skipping");
                outcome.skipped += 1;
            }
        }
    }

    outcome
}

/// Reads attributes and metadata for one accepted entry.
fn inspect_entry(path: &Path, packaging: Packaging, format: PluginFormat) -> io::Result<PluginRecord> {
    let meta = fs::metadata(path)?;
    if packaging.is_bundle_only() && !meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "bundle packaging on a plain file",
        ));
    }
    let modified = meta.modified()?;
    let size_bytes = if meta.is_dir() {
        directory_size(path)
    } else {
        meta.len()
    };

    let probe = Probe::open(path);
    Ok(PluginRecord::new(RecordFields {
        name: probe.display_name(),
        format,
        path: path.to_path_buf(),
        version: probe.version(),
        manufacturer: probe.manufacturer(),
        size_bytes,
        modified_at: DateTime::<Utc>::from(modified),
    }))
}

/// Total size of the regular files under `dir`. Symlinks are not followed and
/// unreadable parts count as zero.
fn directory_size(dir: &Path) -> u64 {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Failed to read bundle directory");
            return 0;
        }
    };

    let mut total = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => total += directory_size(&path),
            Ok(meta) if meta.is_file() => total += meta.len(),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "Failed to stat bundle file"),
        }
    }
    total
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Runs scans over a fixed catalog, one at a time.
#[derive(Debug)]
pub struct Scanner {
    catalog: Catalog,
    options: ScanOptions,
    running: AtomicBool,
}

/// Clears the running flag when the scan ends, including by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Scanner {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_options(catalog, ScanOptions::default())
    }

    pub fn with_options(catalog: Catalog, options: ScanOptions) -> Self {
        Scanner {
            catalog,
            options,
            running: AtomicBool::new(false),
        }
    }

    /// Builds a scanner for this machine, adjusted by `config`.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::with_options(config.catalog(), config.scan_options())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn try_begin(&self) -> Result<()> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| ScanError::AlreadyRunning)
    }

    /// Runs a scan on the calling thread.
    ///
    /// # Errors
    /// `ScanError::AlreadyRunning` if another scan on this scanner has not finished.
    pub fn scan(&self, cancel: &CancelToken) -> Result<ScanReport> {
        self.try_begin()?;
        let _guard = RunningGuard(&self.running);
        Ok(scan_with(&self.catalog, &self.options, cancel))
    }

    /// Runs a scan on a background thread. The report arrives on the returned
    /// handle's channel when the scan completes.
    ///
    /// # Errors
    /// `ScanError::AlreadyRunning` if another scan on this scanner has not
    /// finished, or `ScanError::Io` if the thread could not be started.
    pub fn spawn(self: &Arc<Self>) -> Result<ScanHandle> {
        self.try_begin()?;

        let scanner = Arc::clone(self);
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("pluginscope-scan".to_string())
            .spawn(move || {
                let _guard = RunningGuard(&scanner.running);
                let report = scan_with(&scanner.catalog, &scanner.options, &worker_cancel);
                if tx.send(report).is_err() {
                    debug!("Scan result dropped, receiver went away");
                }
            });

        match spawned {
            Ok(_) => Ok(ScanHandle { cancel, receiver: rx }),
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(ScanError::Io(e))
            }
        }
    }
}

/// A scan running in the background.
#[derive(Debug)]
pub struct ScanHandle {
    cancel: CancelToken,
    receiver: mpsc::Receiver<ScanReport>,
}

impl ScanHandle {
    /// Asks the scan to stop; the partial report is still delivered.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Blocks until the scan completes. `None` if the scan thread died.
    pub fn wait(self) -> Option<ScanReport> {
        self.receiver.recv().ok()
    }

    /// Returns the report if the scan has already completed.
    pub fn try_result(&self) -> Option<ScanReport> {
        self.receiver.try_recv().ok()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<ScanReport> {
        self.receiver.recv_timeout(timeout).ok()
    }
}
