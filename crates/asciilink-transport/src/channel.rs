use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::warn;

use crate::error::Result;
use crate::lock::{FileLock, FileLockGuard};
use crate::traits::Transport;

/// Where and how long to wait for the cross-process device lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockConfig {
    /// Directory holding lock files. Default: system temp directory.
    pub directory: Option<PathBuf>,
    /// Maximum wait for another process to release the device.
    /// `None` blocks indefinitely.
    pub timeout: Option<Duration>,
}

/// A transport shared by several callers, one exchange at a time.
///
/// Threads are serialized by a mutex; processes by an optional
/// [`FileLock`]. Share across threads with `Arc<Channel<T>>`.
pub struct Channel<T> {
    transport: Mutex<T>,
    file_lock: Option<FileLock>,
    lock_timeout: Option<Duration>,
}

impl<T: Transport> Channel<T> {
    /// A channel guarded only within this process.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
            file_lock: None,
            lock_timeout: None,
        }
    }

    /// A channel additionally guarded by an explicit cross-process lock.
    pub fn with_file_lock(transport: T, file_lock: FileLock, timeout: Option<Duration>) -> Self {
        Self {
            transport: Mutex::new(transport),
            file_lock: Some(file_lock),
            lock_timeout: timeout,
        }
    }

    /// A channel guarded by the lock file every process derives for `device`.
    pub fn for_device(transport: T, device: &str, config: &LockConfig) -> Result<Self> {
        let file_lock = FileLock::for_device(device, config.directory.as_deref())?;
        Ok(Self::with_file_lock(transport, file_lock, config.timeout))
    }

    /// Take exclusive access for one exchange.
    ///
    /// Blocks on the in-process mutex, then on the file lock. Both are
    /// released when the returned [`Session`] is dropped, whatever the
    /// outcome of the exchange. Nesting `acquire` on one thread deadlocks.
    pub fn acquire(&self) -> Result<Session<'_, T>> {
        let guard = self.transport.lock().unwrap_or_else(|poisoned| {
            warn!("channel mutex poisoned by an earlier panic; continuing");
            PoisonError::into_inner(poisoned)
        });
        let file_guard = match &self.file_lock {
            Some(lock) => Some(lock.lock(self.lock_timeout)?),
            None => None,
        };
        Ok(Session { file_guard, guard })
    }

    /// The cross-process lock, if any.
    pub fn file_lock(&self) -> Option<&FileLock> {
        self.file_lock.as_ref()
    }

    /// Consume the channel and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("file_lock", &self.file_lock.as_ref().map(FileLock::path))
            .field("lock_timeout", &self.lock_timeout)
            .finish()
    }
}

/// Exclusive access to a channel's transport for one exchange.
///
/// Dereferences to the transport. Fields drop in declaration order, so the
/// file lock is released before the mutex.
pub struct Session<'a, T> {
    file_guard: Option<FileLockGuard<'a>>,
    guard: MutexGuard<'a, T>,
}

impl<T> Session<'_, T> {
    /// True if this session also holds the cross-process lock.
    pub fn holds_file_lock(&self) -> bool {
        self.file_guard.is_some()
    }
}

impl<T> Deref for Session<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for Session<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
