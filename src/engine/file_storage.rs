//! File-system storage engine
//!
//! Keys map to files below a base directory. Values are written to a
//! temporary sibling and renamed into place, so readers never observe a
//! half-written value.
//!
//! Locks are OS advisory locks (`flock`/`LockFileEx`) held on files under
//! `<base>/locks`. The operating system drops them when the holding process
//! exits, so a crashed holder never leaves a lock that has to be broken.
//! The `locks` directory is reserved: no key may start with it.
//!
//! An empty root is legal. The engine then stores below the default data
//! directory (see [`crate::dirs::data_dir`]).

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{key_segments, validate_key, KeyInfo, Storage};
use crate::dirs;
use crate::environment::EnvSnapshot;
use crate::error::{Result, StorageError};

/// How often a blocked `lock` call retries
pub const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Top-level directory holding lock files
pub const LOCKS_DIR: &str = "locks";
const TEMP_PREFIX: &str = ".tmp-";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Diagnostic contents of a held lock file
#[derive(Debug, Serialize, Deserialize)]
struct LockMeta {
    created_unix_ms: u64,
    pid: u32,
}

/// Storage engine backed by a directory tree
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Root as configured, possibly empty
    root: String,
    /// Directory keys are resolved against
    base: PathBuf,
    lock_poll_interval: Duration,
    lock_timeout: Option<Duration>,
    /// Lock files this engine (and its clones) currently hold, by key
    held: Arc<Mutex<HashMap<String, File>>>,
}

impl FileStorage {
    /// Create an engine rooted at `root`.
    ///
    /// An empty root resolves to the data directory of the running process.
    pub fn new(root: impl Into<String>) -> Self {
        Self::with_env(root, &EnvSnapshot::capture())
    }

    /// Create an engine rooted at `root`, resolving an empty root with `env`.
    pub fn with_env(root: impl Into<String>, env: &EnvSnapshot) -> Self {
        let root = root.into();
        let base = if root.is_empty() {
            PathBuf::from(dirs::data_dir(env))
        } else {
            PathBuf::from(&root)
        };

        Self {
            root,
            base,
            lock_poll_interval: DEFAULT_LOCK_POLL_INTERVAL,
            lock_timeout: None,
            held: Arc::default(),
        }
    }

    /// Override how often a contended lock is retried
    pub fn with_lock_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.lock_poll_interval = poll_interval;
        self
    }

    /// Give up waiting for a lock after `timeout`
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// The root exactly as configured
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The directory keys are stored under
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Path of the file holding `key`
    pub fn filename(&self, key: &str) -> PathBuf {
        key_segments(key).fold(self.base.clone(), |path, segment| path.join(segment))
    }

    /// Path of the lock file guarding `key`
    pub fn lock_filename(&self, key: &str) -> PathBuf {
        self.base
            .join(LOCKS_DIR)
            .join(format!("{}.lock", safe_key(key)))
    }

    /// Validate a key and keep it out of the lock directory
    fn check_key(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        if key_segments(key).next() == Some(LOCKS_DIR) {
            return Err(StorageError::invalid_key(
                key,
                format!("'{LOCKS_DIR}' is reserved for lock files"),
            ));
        }
        Ok(())
    }

    fn held_locks(&self) -> std::sync::MutexGuard<'_, HashMap<String, File>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for FileStorage {
    fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        self.check_key(key)?;
        let path = self.filename(key);
        let parent = path.parent().unwrap_or(self.base.as_path()).to_path_buf();
        fs::create_dir_all(&parent)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = parent.join(format!(
            "{TEMP_PREFIX}{file_name}-{}-{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let written = fs::write(&tmp, value).and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!("Stored {} byte(s) at {}", value.len(), path.display());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Vec<u8>> {
        self.check_key(key)?;
        fs::read(self.filename(key)).map_err(|e| map_io(key, e))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.check_key(key)?;
        let path = self.filename(key);
        let meta = fs::metadata(&path).map_err(|e| map_io(key, e))?;

        let removed = if meta.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| map_io(key, e))?;

        debug!("Deleted {}", path.display());
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.check_key(key).is_ok() && self.filename(key).exists()
    }

    fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let prefix = prefix.trim_end_matches('/');
        let dir = if prefix.is_empty() {
            self.base.clone()
        } else {
            self.check_key(prefix)?;
            self.filename(prefix)
        };

        let meta = match fs::metadata(&dir) {
            Ok(meta) => meta,
            // Nothing stored yet
            Err(e) if prefix.is_empty() && e.kind() == io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(map_io(prefix, e)),
        };

        let mut keys = Vec::new();
        if meta.is_dir() {
            let key_prefix = key_segments(prefix).collect::<Vec<_>>().join("/");
            walk(&dir, &key_prefix, recursive, &mut keys)?;
        }

        keys.sort();
        Ok(keys)
    }

    fn stat(&self, key: &str) -> Result<KeyInfo> {
        self.check_key(key)?;
        let meta = fs::metadata(self.filename(key)).map_err(|e| map_io(key, e))?;

        Ok(KeyInfo {
            key: key.to_string(),
            modified: meta.modified()?,
            size: meta.len(),
            is_terminal: meta.is_file(),
        })
    }

    fn lock(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.lock_filename(key);
        let started = Instant::now();

        loop {
            let file = open_lock_file(&path)?;
            match file.try_lock_exclusive() {
                Ok(()) => {
                    write_lock_meta(&file)?;
                    self.held_locks().insert(key.to_string(), file);
                    debug!("Lock acquired for {} at {}", key, path.display());
                    return Ok(());
                }
                Err(e) if is_contended(&e) => {}
                Err(e) => return Err(e.into()),
            }

            if let Some(timeout) = self.lock_timeout {
                if started.elapsed() >= timeout {
                    info!("Gave up waiting for lock on {} after {:?}", key, timeout);
                    return Err(StorageError::LockTimeout {
                        key: key.to_string(),
                    });
                }
            }

            thread::sleep(self.lock_poll_interval);
        }
    }

    fn unlock(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        // Drop the entry before releasing the OS lock
        let file = self
            .held_locks()
            .remove(key)
            .ok_or_else(|| StorageError::NotLocked {
                key: key.to_string(),
            })?;

        file.set_len(0)?;
        FileExt::unlock(&file)?;
        debug!("Lock released for {}", key);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("FileStorage:{}", self.base.display())
    }
}

/// Reduce a key to a string safe for use as a single file name.
///
/// The mapping is lossy: keys differing only in case, in `/` versus `_`, or
/// in dropped characters share a lock file and therefore lock together.
pub fn safe_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('/', "_")
        .replace('+', "_plus_")
        .replace('*', "wildcard_")
        .replace(':', "-")
        .replace("..", "")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '-'))
        .collect()
}

fn map_io(key: &str, err: io::Error) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::not_found(key)
    } else {
        StorageError::Io(err)
    }
}

fn walk(dir: &Path, prefix: &str, recursive: bool, keys: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(TEMP_PREFIX) || (prefix.is_empty() && name == LOCKS_DIR) {
            continue;
        }

        let key = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        if recursive && entry.file_type()?.is_dir() {
            walk(&entry.path(), &key, true, keys)?;
        }
        keys.push(key);
    }
    Ok(())
}

/// Open (creating if needed) the lock file without truncating a holder's metadata
fn open_lock_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}

fn write_lock_meta(mut file: &File) -> Result<()> {
    let meta = LockMeta {
        created_unix_ms: now_unix_ms(),
        pid: std::process::id(),
    };
    file.set_len(0)?;
    file.write_all(&serde_json::to_vec(&meta)?)?;
    Ok(())
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
