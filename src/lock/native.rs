//! `flock(2)` backend.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::thread;
use std::time::{Duration, Instant};

use super::LockBackend;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Whole-file lock through the `flock` syscall.
///
/// Acquisition polls a non-blocking `flock` until the deadline, so a waiter
/// that gives up frees its blocking-pool thread at the bound.
pub struct NativeLock;

impl LockBackend for NativeLock {
    fn name(&self) -> &'static str {
        "flock"
    }

    fn lock_exclusive(&self, file: &File, deadline: Instant) -> io::Result<()> {
        loop {
            match flock(file, libc::LOCK_EX | libc::LOCK_NB) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "flock still contended at deadline",
                ));
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn unlock(&self, file: &File) -> io::Result<()> {
        flock(file, libc::LOCK_UN)
    }
}

fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
    loop {
        // SAFETY: the descriptor belongs to `file`, which outlives this call.
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, tempfile};

    #[test]
    fn test_lock_then_unlock() {
        let file = tempfile().unwrap();
        NativeLock.lock_exclusive(&file, Instant::now()).unwrap();
        NativeLock.unlock(&file).unwrap();
    }

    #[test]
    fn test_contended_lock_gives_up_at_deadline() {
        let temp = NamedTempFile::new().unwrap();
        let holder = temp.reopen().unwrap();
        let waiter = temp.reopen().unwrap();

        NativeLock.lock_exclusive(&holder, Instant::now()).unwrap();

        let started = Instant::now();
        let err = NativeLock
            .lock_exclusive(&waiter, started + Duration::from_millis(50))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(1));

        NativeLock.unlock(&holder).unwrap();
        NativeLock
            .lock_exclusive(&waiter, Instant::now() + Duration::from_secs(1))
            .unwrap();
        NativeLock.unlock(&waiter).unwrap();
    }
}
