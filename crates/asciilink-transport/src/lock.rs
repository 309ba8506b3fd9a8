use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory, exclusive lock on a file shared by every process that talks
/// to the same device.
///
/// Each `FileLock` is its own open file description, so two instances on
/// the same path exclude each other even within one process. Locks are
/// released by the kernel if the holding process dies.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Open (creating if needed) the lock file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o666);
        }

        let file = options.open(&path).map_err(|source| TransportError::Lock {
            path: path.clone(),
            source,
        })?;

        info!(?path, "opened device lock file");
        Ok(Self { file, path })
    }

    /// Open the lock file for `device` inside `directory`.
    ///
    /// Falls back to the system temp directory. The file name is derived
    /// from the device path so every process opening that device agrees
    /// on it.
    pub fn for_device(device: &str, directory: Option<&Path>) -> Result<Self> {
        let directory = directory
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        Self::open(directory.join(lock_file_name(device)))
    }

    /// Block until the lock is held, or until `timeout` expires.
    pub fn lock(&self, timeout: Option<Duration>) -> Result<FileLockGuard<'_>> {
        let Some(timeout) = timeout else {
            sys::lock_exclusive(&self.file).map_err(|source| self.lock_error(source))?;
            debug!(path = ?self.path, "acquired device lock");
            return Ok(FileLockGuard { lock: self });
        };

        let start = Instant::now();
        loop {
            if let Some(guard) = self.try_lock()? {
                return Ok(guard);
            }
            if start.elapsed() >= timeout {
                return Err(TransportError::LockTimeout {
                    path: self.path.clone(),
                    timeout,
                });
            }
            std::thread::sleep(LOCK_POLL_INTERVAL);
        }
    }

    /// Take the lock if it is free right now.
    pub fn try_lock(&self) -> Result<Option<FileLockGuard<'_>>> {
        match sys::try_lock_exclusive(&self.file).map_err(|source| self.lock_error(source))? {
            true => {
                debug!(path = ?self.path, "acquired device lock");
                Ok(Some(FileLockGuard { lock: self }))
            }
            false => Ok(None),
        }
    }

    /// The lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_error(&self, source: std::io::Error) -> TransportError {
        TransportError::Lock {
            path: self.path.clone(),
            source,
        }
    }
}

/// Holds a [`FileLock`] until dropped.
#[derive(Debug)]
pub struct FileLockGuard<'a> {
    lock: &'a FileLock,
}

impl Drop for FileLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = sys::unlock(&self.lock.file) {
            debug!(path = ?self.lock.path, %err, "failed to release device lock");
        } else {
            debug!(path = ?self.lock.path, "released device lock");
        }
    }
}

/// `/dev/ttyUSB0` becomes `asciilink-dev-ttyUSB0.lock`.
fn lock_file_name(device: &str) -> String {
    let stem: String = device
        .trim_start_matches(['/', '\\', '.'])
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("asciilink-{stem}.lock")
}

#[cfg(unix)]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::fd::AsRawFd;

    fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
        loop {
            // SAFETY: the descriptor belongs to `file`, which outlives the call.
            let rc = unsafe { libc::flock(file.as_raw_fd(), operation) };
            if rc == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    pub(super) fn lock_exclusive(file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_EX)
    }

    pub(super) fn try_lock_exclusive(file: &File) -> io::Result<bool> {
        match flock(file, libc::LOCK_EX | libc::LOCK_NB) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub(super) fn unlock(file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_UN)
    }
}

#[cfg(not(unix))]
mod sys {
    use std::fs::File;
    use std::io;

    fn unsupported() -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "cross-process device locks require a Unix platform",
        )
    }

    pub(super) fn lock_exclusive(_file: &File) -> io::Result<()> {
        Err(unsupported())
    }

    pub(super) fn try_lock_exclusive(_file: &File) -> io::Result<bool> {
        Err(unsupported())
    }

    pub(super) fn unlock(_file: &File) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn lock_file_name_is_flat_and_stable() {
        assert_eq!(lock_file_name("/dev/ttyUSB0"), "asciilink-dev-ttyUSB0.lock");
        assert_eq!(lock_file_name("COM3"), "asciilink-COM3.lock");
        assert_eq!(
            lock_file_name("/dev/serial/by-id/usb-FTDI_1"),
            "asciilink-dev-serial-by-id-usb-FTDI-1.lock"
        );
    }

    #[test]
    fn independent_opens_exclude_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileLock::for_device("/dev/ttyUSB5", Some(dir.path())).unwrap();
        let second = FileLock::for_device("/dev/ttyUSB5", Some(dir.path())).unwrap();
        assert_eq!(first.path(), second.path());

        let held = first.try_lock().unwrap().expect("first lock should be free");
        assert!(second.try_lock().unwrap().is_none());

        drop(held);
        assert!(second.try_lock().unwrap().is_some());
    }

    #[test]
    fn different_devices_do_not_contend() {
        let dir = tempfile::tempdir().unwrap();
        let a = FileLock::for_device("/dev/ttyUSB5", Some(dir.path())).unwrap();
        let b = FileLock::for_device("/dev/ttyUSB6", Some(dir.path())).unwrap();

        let _a = a.lock(None).unwrap();
        assert!(b.try_lock().unwrap().is_some());
    }

    #[test]
    fn lock_with_timeout_expires_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let holder = FileLock::for_device("/dev/ttyS1", Some(dir.path())).unwrap();
        let waiter = FileLock::for_device("/dev/ttyS1", Some(dir.path())).unwrap();

        let _held = holder.lock(None).unwrap();
        let err = waiter
            .lock(Some(Duration::from_millis(50)))
            .unwrap_err();
        assert!(matches!(err, TransportError::LockTimeout { .. }));
    }

    #[test]
    fn blocked_waiter_proceeds_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let holder = FileLock::for_device("/dev/ttyS2", Some(&path)).unwrap();
        let held = holder.lock(None).unwrap();

        let waiter = std::thread::spawn(move || {
            let lock = FileLock::for_device("/dev/ttyS2", Some(&path)).unwrap();
            let start = Instant::now();
            let _guard = lock.lock(Some(Duration::from_secs(5))).unwrap();
            start.elapsed()
        });

        std::thread::sleep(Duration::from_millis(50));
        drop(held);
        let waited = waiter.join().unwrap();
        assert!(waited >= Duration::from_millis(30));
    }
}
